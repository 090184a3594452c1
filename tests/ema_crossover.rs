use std::sync::Arc;

use candle_bts::prelude::*;
use ta::{Next, indicators::ExponentialMovingAverage};

/// Goes long when the fast EMA crosses above the slow one, flat on the way down.
struct EmaCrossover {
    fast: ExponentialMovingAverage,
    slow: ExponentialMovingAverage,
    above: Option<bool>,
    long: bool,
}

impl EmaCrossover {
    fn new(fast: usize, slow: usize) -> Self {
        Self {
            fast: ExponentialMovingAverage::new(fast).unwrap(),
            slow: ExponentialMovingAverage::new(slow).unwrap(),
            above: None,
            long: false,
        }
    }
}

impl Strategy for EmaCrossover {
    fn name(&self) -> &str {
        "ema-crossover"
    }

    fn on_candle_close(&mut self, ctx: &mut StrategyContext<'_>, symbol: &str, candle: &Candle) -> Result<()> {
        let close = candle.close();
        let above = self.fast.next(close) > self.slow.next(close);
        let crossed = self.above.is_some_and(|was| was != above);
        self.above = Some(above);

        if crossed && above && !self.long {
            // keep a margin, `amount * price` may round above the balance
            let amount = ctx.exchange().balance_quoted(symbol)? * 0.99 / close;
            self.long = ctx.market_buy(symbol, amount)?;
        } else if crossed && !above && self.long {
            let amount = ctx.exchange().balance_base(symbol)?;
            self.long = !ctx.market_sell(symbol, amount)?;
        }

        ctx.record_equity(symbol)?;
        Ok(())
    }
}

fn run(seed: u64) -> (BacktestReport, Recorder) {
    let range = HistoryRange::new("BTCUSD", 0, 12 * 3_600_000, 60_000).unwrap();
    let trades = RandomTrades::new(seed, 100.0).volatility(0.002);
    let mut history = TradeCandleHistory::new(range, trades);
    history.load(&mut NoProgress).unwrap();

    let mut exchange = TestExchange::new()
        .with_pair("BTCUSD", Pair::new("BTC", "USD", Arc::new(Fees::flat(0.001))))
        .unwrap()
        .with_balance("BTC", Balance::new(0.0).unwrap())
        .unwrap()
        .with_balance("USD", Balance::new(1_000.0).unwrap())
        .unwrap();
    let mut strategy = EmaCrossover::new(9, 21);
    let mut recorder = Recorder::new();

    let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut strategy, &mut recorder);
    assert!(bt.backtest().unwrap());
    let report = bt.report().unwrap();
    drop(bt);
    (report, recorder)
}

#[test]
fn ema_crossover() {
    let (report, recorder) = run(1);

    assert_eq!(report.state, BacktestState::Finished);
    assert_eq!(report.rejected, 0);
    assert_eq!(recorder.series(Series::Equity).count(), report.candles);
    assert!(report.base >= 0.0 && report.quoted >= 0.0);

    // entries and exits alternate, starting with an entry
    let sides = recorder
        .annotations()
        .filter_map(|a| match a.series() {
            Series::Buy => Some(true),
            Series::Sell => Some(false),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert!(sides.iter().step_by(2).all(|&buy| buy));
    assert!(sides.iter().skip(1).step_by(2).all(|&buy| !buy));
}

#[test]
fn ema_crossover_is_deterministic() {
    assert_eq!(run(3), run(3));
}
