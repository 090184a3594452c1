use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{HistoryRange, Progress, TradeSource};
use crate::{
    engine::Trade,
    errors::{Error, Result},
};

// Progress is reported every this many trades.
const REPORT_EVERY: usize = 1_024;

/// Seeded random-walk trade generator.
///
/// The generator owns its seed and restarts from it on every fetch, so
/// reloading a history yields the exact same tape.
#[derive(Debug, Clone)]
pub struct RandomTrades {
    seed: u64,
    start_price: f64,
    volatility: f64,
    max_gap: i64,
    max_volume: f64,
}

impl RandomTrades {
    /// Creates a generator starting at `start_price`.
    ///
    /// Defaults: 0.1% max move per trade, up to 10 s between trades,
    /// up to 1.0 base unit per trade.
    pub fn new(seed: u64, start_price: f64) -> Self {
        Self {
            seed,
            start_price,
            volatility: 0.001,
            max_gap: 10_000,
            max_volume: 1.0,
        }
    }

    /// Sets the largest relative price move between two trades.
    pub fn volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility.abs();
        self
    }

    /// Sets the largest delay between two trades, in milliseconds.
    pub fn max_gap(mut self, max_gap: i64) -> Self {
        self.max_gap = max_gap.max(1);
        self
    }

    /// Sets the largest volume of a single trade.
    pub fn max_volume(mut self, max_volume: f64) -> Self {
        self.max_volume = max_volume.abs();
        self
    }
}

impl TradeSource for RandomTrades {
    fn fetch(&mut self, range: &HistoryRange, progress: &mut dyn Progress) -> Result<Vec<Trade>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut trades = Vec::new();
        let mut price = self.start_price;
        let mut time = range.start();

        while time < range.end() {
            if self.volatility > 0.0 {
                price *= 1.0 + rng.random_range(-self.volatility..self.volatility);
            }
            let volume = if self.max_volume > 0.0 {
                rng.random_range(0.0..self.max_volume)
            } else {
                0.0
            };
            trades.push(Trade::from((time, price, volume)));

            if trades.len() % REPORT_EVERY == 0 && !progress.update_ratio(time, range.start(), range.end()) {
                return Err(Error::LoadCancelled);
            }
            time = time.saturating_add(rng.random_range(1..=self.max_gap));
        }

        if !progress.update_percent(100) {
            return Err(Error::LoadCancelled);
        }
        Ok(trades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::NoProgress;

    #[test]
    fn same_seed_same_tape() {
        let range = HistoryRange::new("BTCUSD", 0, 3_600_000, 60_000).unwrap();
        let a = RandomTrades::new(7, 100.0).fetch(&range, &mut NoProgress).unwrap();
        let b = RandomTrades::new(7, 100.0).fetch(&range, &mut NoProgress).unwrap();
        let c = RandomTrades::new(8, 100.0).fetch(&range, &mut NoProgress).unwrap();

        assert!(!a.is_empty());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn sorted_and_in_range() {
        let range = HistoryRange::new("BTCUSD", 1_000, 600_000, 60_000).unwrap();
        let trades = RandomTrades::new(1, 50.0)
            .max_gap(5_000)
            .fetch(&range, &mut NoProgress)
            .unwrap();

        assert_eq!(trades[0].timestamp(), 1_000);
        assert!(trades.windows(2).all(|w| w[0].timestamp() < w[1].timestamp()));
        assert!(trades.iter().all(|t| t.timestamp() < 600_000 && t.price() > 0.0));
    }

    #[test]
    fn flat_market() {
        let range = HistoryRange::new("BTCUSD", 0, 60_000, 60_000).unwrap();
        let trades = RandomTrades::new(3, 10.0)
            .volatility(0.0)
            .fetch(&range, &mut NoProgress)
            .unwrap();
        assert!(trades.iter().all(|t| t.price() == 10.0));
    }
}
