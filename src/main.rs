use candle_bts::{
    backtest::CandleStrategyBacktester, collector::Recorder, config::BacktestConfig, exchange::TestExchange,
    history::{History, LogProgress},
    registry,
};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => BacktestConfig::from_file(&path).with_context(|| format!("reading config {path}"))?,
        None => BacktestConfig::default(),
    };
    info!(symbol = %config.symbol, history = %config.history, strategy = %config.strategy, "configured");

    let mut history = registry::history(&config)?;
    history.load(&mut LogProgress::default()).context("loading history")?;

    let mut exchange = TestExchange::from_config(&config)?;
    let mut strategy = registry::strategy(&config)?;
    let mut recorder = Recorder::new();

    let mut backtester =
        CandleStrategyBacktester::new(history.as_ref(), &mut exchange, strategy.as_mut(), &mut recorder);
    let completed = backtester.backtest().context("running backtest")?;
    let report = backtester.report()?;

    println!("{report}");
    if !completed {
        println!("Backtest did not complete");
    }
    Ok(())
}
