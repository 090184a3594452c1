use std::{cell::Cell, sync::Arc};

use super::*;
use crate::{
    collector::{NullCollector, Recorder},
    engine::{Balance, Fees, Pair},
    history::{HistoryRange, VecCandleHistory},
    strategy::{BuyAndHold, RandomStrategy},
};

const MINUTE: i64 = 60_000;

fn history(len: usize) -> VecCandleHistory {
    let range = HistoryRange::new("BTCUSD", 0, len as i64 * MINUTE, MINUTE).unwrap();
    let candles = (0..len as i64)
        .map(|i| {
            let price = 100.0 + (i % 7) as f64;
            Candle::new(price, price + 1.0, price - 1.0, price + 2.0, 1.0, i * MINUTE, (i + 1) * MINUTE - 1)
                .unwrap()
        })
        .collect();
    VecCandleHistory::new(range, candles)
}

fn exchange() -> TestExchange {
    TestExchange::new()
        .with_pair("BTCUSD", Pair::new("BTC", "USD", Arc::new(Fees::flat(0.001))))
        .unwrap()
        .with_balance("BTC", Balance::new(0.0).unwrap())
        .unwrap()
        .with_balance("USD", Balance::new(1_000.0).unwrap())
        .unwrap()
}

/// Remembers the exchange clock and price seen on each candle.
#[derive(Default)]
struct Observer {
    seen: Vec<(i64, f64)>,
}

impl Strategy for Observer {
    fn on_candle_close(&mut self, ctx: &mut StrategyContext<'_>, symbol: &str, candle: &Candle) -> Result<()> {
        let exchange = ctx.exchange();
        assert_eq!(exchange.current_time(), candle.end());
        self.seen.push((exchange.current_time(), exchange.current_price(symbol)?));
        Ok(())
    }
}

#[test]
fn runs_every_candle() {
    let history = history(10);
    let mut exchange = exchange();
    let mut observer = Observer::default();
    let mut collector = NullCollector;

    let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut observer, &mut collector);
    assert_eq!(bt.state(), BacktestState::NotStarted);
    assert!(bt.backtest().unwrap());
    assert_eq!(bt.state(), BacktestState::Finished);
    assert_eq!(bt.processed(), 10);
    drop(bt);

    assert_eq!(observer.seen.len(), 10);
    let (last_time, last_price) = observer.seen[9];
    assert_eq!(last_time, 10 * MINUTE - 1);
    assert_eq!(last_price, history.candles()[9].close());
    assert_eq!(exchange.current_price("BTCUSD").unwrap(), last_price);
}

#[test]
fn time_moves_forward() {
    let history = history(25);
    let mut exchange = exchange();
    let mut observer = Observer::default();
    let mut collector = NullCollector;

    CandleStrategyBacktester::new(&history, &mut exchange, &mut observer, &mut collector)
        .backtest()
        .unwrap();

    assert!(observer.seen.windows(2).all(|w| w[0].0 < w[1].0));
}

#[test]
fn step_cancel() {
    let history = history(10);
    let mut exchange = exchange();
    let mut observer = Observer::default();
    let mut collector = NullCollector;
    let finished = Cell::new(false);

    let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut observer, &mut collector)
        .on_step(|progress| Ok(progress.index() != 2))
        .on_finish(|_| {
            finished.set(true);
            Ok(true)
        });

    assert!(!bt.backtest().unwrap());
    assert_eq!(bt.state(), BacktestState::Cancelled);
    assert_eq!(bt.processed(), 2);
    drop(bt);

    assert_eq!(observer.seen.len(), 2);
    assert!(!finished.get());
}

#[test]
fn start_cancel() {
    let history = history(10);
    let mut exchange = exchange();
    let mut observer = Observer::default();
    let mut collector = NullCollector;
    let steps = Cell::new(0);

    let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut observer, &mut collector)
        .on_start(|progress| {
            assert!(progress.candle().is_none());
            assert_eq!(progress.total(), 10);
            Ok(false)
        })
        .on_step(|_| {
            steps.set(steps.get() + 1);
            Ok(true)
        });

    assert!(!bt.backtest().unwrap());
    assert_eq!(bt.state(), BacktestState::Cancelled);
    drop(bt);

    assert_eq!(steps.get(), 0);
    assert!(observer.seen.is_empty());
}

#[test]
fn finish_decides_result() {
    let history = history(3);
    let mut exchange = exchange();
    let mut observer = Observer::default();
    let mut collector = NullCollector;

    let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut observer, &mut collector)
        .on_finish(|progress| {
            assert_eq!(progress.percent(), 100);
            Ok(false)
        });

    assert!(!bt.backtest().unwrap());
    assert_eq!(bt.state(), BacktestState::Finished);
    assert_eq!(bt.processed(), 3);
}

#[test]
fn callback_error_aborts() {
    let history = history(5);
    let mut exchange = exchange();
    let mut observer = Observer::default();
    let mut collector = NullCollector;

    let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut observer, &mut collector)
        .on_step(|progress| match progress.index() {
            1 => Err(Error::Unimplemented("step")),
            _ => Ok(true),
        });

    assert!(matches!(bt.backtest(), Err(Error::Unimplemented("step"))));
    assert_eq!(bt.state(), BacktestState::Failed);
    assert_eq!(bt.processed(), 1);
}

#[test]
fn strategy_error_aborts() {
    struct Failing;
    impl Strategy for Failing {}

    let history = history(5);
    let mut exchange = exchange();
    let mut strategy = Failing;
    let mut collector = NullCollector;

    let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut strategy, &mut collector);
    assert!(matches!(bt.backtest(), Err(Error::Unimplemented(_))));
    assert_eq!(bt.state(), BacktestState::Failed);
}

#[test]
fn unknown_symbol_aborts() {
    let range = HistoryRange::new("ETHUSD", 0, MINUTE, MINUTE).unwrap();
    let candles = vec![Candle::new(1.0, 1.0, 1.0, 1.0, 1.0, 0, MINUTE - 1).unwrap()];
    let history = VecCandleHistory::new(range, candles);
    let mut exchange = exchange();
    let mut observer = Observer::default();
    let mut collector = NullCollector;

    let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut observer, &mut collector);
    assert!(matches!(bt.backtest(), Err(Error::Missing { .. })));
}

#[test]
fn runs_once() {
    let history = history(2);
    let mut exchange = exchange();
    let mut observer = Observer::default();
    let mut collector = NullCollector;

    let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut observer, &mut collector);
    bt.backtest().unwrap();
    assert!(matches!(bt.backtest(), Err(Error::AlreadyRan(state)) if state == "finished"));
}

#[test]
fn empty_history() {
    let range = HistoryRange::new("BTCUSD", 0, MINUTE, MINUTE).unwrap();
    let history = VecCandleHistory::new(range, Vec::new());
    let mut exchange = exchange();
    let mut observer = Observer::default();
    let mut collector = NullCollector;

    let started = Cell::new(false);

    let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut observer, &mut collector)
        .on_start(|progress| {
            assert_eq!(progress.total(), 0);
            started.set(true);
            Ok(true)
        })
        .on_step(|_| unreachable!("no candle to step over"));
    assert!(bt.backtest().unwrap());
    assert_eq!(bt.state(), BacktestState::Finished);
    assert_eq!(bt.processed(), 0);
    drop(bt);

    assert!(started.get());
    assert!(observer.seen.is_empty());
}

#[test]
fn empty_history_uses_finish_result() {
    let range = HistoryRange::new("BTCUSD", 0, MINUTE, MINUTE).unwrap();
    let history = VecCandleHistory::new(range, Vec::new());
    let mut exchange = exchange();
    let mut observer = Observer::default();
    let mut collector = NullCollector;

    let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut observer, &mut collector)
        .on_finish(|progress| Ok(progress.percent() != 100));
    assert!(!bt.backtest().unwrap());
    assert_eq!(bt.state(), BacktestState::Finished);
}

#[test]
fn nan_close_aborts_orders() {
    struct BuyOne;
    impl Strategy for BuyOne {
        fn on_candle_close(&mut self, ctx: &mut StrategyContext<'_>, symbol: &str, _: &Candle) -> Result<()> {
            ctx.market_buy(symbol, 1.0)?;
            Ok(())
        }
    }

    let range = HistoryRange::new("BTCUSD", 0, MINUTE, MINUTE).unwrap();
    let candles = vec![Candle::relaxed(1.0, f64::NAN, 1.0, 1.0, 1.0, 0, MINUTE - 1)];
    let history = VecCandleHistory::new(range, candles);
    let mut exchange = exchange();
    let mut strategy = BuyOne;
    let mut collector = NullCollector;

    let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut strategy, &mut collector);
    assert!(matches!(bt.backtest(), Err(Error::InvalidPrice(p)) if p.is_nan()));
    assert_eq!(bt.state(), BacktestState::Failed);
    drop(bt);

    assert_eq!(exchange.balance_quoted("BTCUSD").unwrap(), 1_000.0);
    assert_eq!(exchange.balance_base("BTCUSD").unwrap(), 0.0);
}

#[test]
fn deterministic() {
    let run = || {
        let history = history(50);
        let mut exchange = exchange();
        let mut strategy = RandomStrategy::new(42, 0.5);
        let mut recorder = Recorder::new();
        let report = {
            let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut strategy, &mut recorder);
            bt.backtest().unwrap();
            bt.report().unwrap()
        };
        (report, recorder)
    };

    let (first, first_annotations) = run();
    let (second, second_annotations) = run();
    assert_eq!(first, second);
    assert_eq!(first_annotations, second_annotations);
    assert_eq!(first.candles, 50);
}

#[test]
fn report() {
    let history = history(4);
    let mut exchange = exchange();
    let mut strategy = BuyAndHold::new(0.5);
    let mut recorder = Recorder::new();

    let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut strategy, &mut recorder);
    bt.backtest().unwrap();
    let report = bt.report().unwrap();

    assert_eq!(report.symbol, "BTCUSD");
    assert_eq!(report.strategy, "buy-and-hold");
    assert_eq!(report.state, BacktestState::Finished);
    assert_eq!(report.candles, 4);
    assert_eq!(report.rejected, 0);
    // bought at the first close, 101
    assert!((report.quoted - 500.0).abs() < 1e-9);
    let base = 500.0 / 101.0 * (1.0 - 0.001);
    assert!((report.base - base).abs() < 1e-9);
    // last close is 104
    assert!((report.equity - (500.0 + base * 104.0)).abs() < 1e-9);
    assert!(report.to_string().starts_with("=== Backtest Report ==="));
}

#[test]
fn rejections_are_counted() {
    struct Greedy;
    impl Strategy for Greedy {
        fn on_candle_close(&mut self, ctx: &mut StrategyContext<'_>, symbol: &str, _: &Candle) -> Result<()> {
            ctx.market_buy(symbol, 1_000_000.0)?;
            Ok(())
        }
    }

    let history = history(3);
    let mut exchange = exchange();
    let mut strategy = Greedy;
    let mut recorder = Recorder::new();

    let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut strategy, &mut recorder);
    assert!(bt.backtest().unwrap());
    assert_eq!(bt.report().unwrap().rejected, 3);
}
