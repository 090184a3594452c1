use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use super::{Strategy, StrategyContext};
use crate::{engine::Candle, errors::Result};

/// Does nothing but sample equity.
#[derive(Debug, Default, Clone, Copy)]
pub struct Idle;

impl Strategy for Idle {
    fn name(&self) -> &str {
        "idle"
    }

    fn on_candle_close(&mut self, ctx: &mut StrategyContext<'_>, symbol: &str, _candle: &Candle) -> Result<()> {
        ctx.record_equity(symbol)?;
        Ok(())
    }
}

/// Spends a fraction of the quoted balance on the first candle, then holds.
#[derive(Debug, Clone, Copy)]
pub struct BuyAndHold {
    fraction: f64,
    bought: bool,
}

impl BuyAndHold {
    /// `fraction` of the quoted balance is spent, clamped to `[0, 1]`.
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
            bought: false,
        }
    }
}

impl Default for BuyAndHold {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy-and-hold"
    }

    fn on_candle_close(&mut self, ctx: &mut StrategyContext<'_>, symbol: &str, candle: &Candle) -> Result<()> {
        if !self.bought && candle.close() > 0.0 {
            let quoted = ctx.exchange().balance_quoted(symbol)?;
            let amount = quoted * self.fraction / candle.close();
            self.bought = ctx.market_buy(symbol, amount)?;
        }
        ctx.record_equity(symbol)?;
        Ok(())
    }
}

/// Flips a seeded coin on every candle: buy, sell or hold a fraction of the balance.
///
/// Same seed, same candles, same trades.
#[derive(Debug, Clone)]
pub struct RandomStrategy {
    rng: StdRng,
    fraction: f64,
}

impl RandomStrategy {
    pub fn new(seed: u64, fraction: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            fraction: fraction.clamp(0.0, 1.0),
        }
    }
}

impl Strategy for RandomStrategy {
    fn name(&self) -> &str {
        "random"
    }

    fn on_candle_close(&mut self, ctx: &mut StrategyContext<'_>, symbol: &str, candle: &Candle) -> Result<()> {
        let price = candle.close();
        match self.rng.random_range(0..3) {
            0 if price > 0.0 => {
                let amount = ctx.exchange().balance_quoted(symbol)? * self.fraction / price;
                ctx.market_buy(symbol, amount)?;
            }
            1 => {
                let amount = ctx.exchange().balance_base(symbol)? * self.fraction;
                ctx.market_sell(symbol, amount)?;
            }
            _ => debug!(symbol, price, "hold"),
        }
        ctx.record_equity(symbol)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        collector::{Recorder, Series},
        engine::{Balance, Fees, Pair},
        exchange::{Exchange, TestExchange},
    };

    fn exchange() -> TestExchange {
        let mut exchange = TestExchange::new()
            .with_pair("BTCUSD", Pair::new("BTC", "USD", Arc::new(Fees::default())))
            .unwrap()
            .with_balance("BTC", Balance::new(0.0).unwrap())
            .unwrap()
            .with_balance("USD", Balance::new(1_000.0).unwrap())
            .unwrap();
        exchange.set_price("BTCUSD", 100.0).unwrap();
        exchange
    }

    #[test]
    fn buy_and_hold_buys_once() {
        let mut exchange = exchange();
        let mut recorder = Recorder::new();
        let mut strategy = BuyAndHold::new(0.5);
        let candle = Candle::relaxed(100.0, 100.0, 100.0, 100.0, 1.0, 0, 59);

        for _ in 0..3 {
            let mut ctx = StrategyContext::new(&mut exchange, &mut recorder);
            strategy.on_candle_close(&mut ctx, "BTCUSD", &candle).unwrap();
        }

        assert_eq!(exchange.balance_base("BTCUSD").unwrap(), 5.0);
        assert_eq!(exchange.balance_quoted("BTCUSD").unwrap(), 500.0);
        assert_eq!(recorder.series(Series::Buy).count(), 1);
        assert_eq!(recorder.series(Series::Equity).count(), 3);
    }

    #[test]
    fn random_strategy_is_seeded() {
        let run = |seed| {
            let mut exchange = exchange();
            let mut recorder = Recorder::new();
            let mut strategy = RandomStrategy::new(seed, 0.25);
            let candle = Candle::relaxed(100.0, 100.0, 100.0, 100.0, 1.0, 0, 59);
            for _ in 0..20 {
                let mut ctx = StrategyContext::new(&mut exchange, &mut recorder);
                strategy.on_candle_close(&mut ctx, "BTCUSD", &candle).unwrap();
            }
            recorder
        };

        assert_eq!(run(11), run(11));
    }
}
