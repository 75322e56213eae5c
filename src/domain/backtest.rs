//! Single-symbol, long-only backtest loop.
//!
//! Indicators are computed once up front. At each bar the policy decides on
//! information up to and including that bar; fills happen at the next bar's
//! open, so a decision never sees the price it trades at.

use crate::domain::error::TradecoreError;
use crate::domain::indicator::IndicatorRequirements;
use crate::domain::ohlcv::{first_unordered, Candle};
use crate::domain::strategy::{Decision, StrategyPolicy};
use chrono::NaiveDate;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Fewer candles than this aborts the run.
    pub min_bars: usize,
    /// First bar index handed to the policy.
    pub warmup: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            min_bars: 50,
            warmup: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Signal,
    EndOfTest,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => write!(f, "signal"),
            ExitReason::EndOfTest => write!(f, "end_of_test"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedTrade {
    pub entry_decision: Decision,
    /// Bar whose open filled the entry.
    pub entry_index: usize,
    pub entry_time: NaiveDate,
    pub entry_price: f64,
    pub exit_time: Option<NaiveDate>,
    pub exit_price: Option<f64>,
    pub exit_reason: Option<ExitReason>,
    pub profit_loss: Option<f64>,
}

impl SimulatedTrade {
    fn open(index: usize, candle: &Candle) -> Self {
        SimulatedTrade {
            entry_decision: Decision::Buy,
            entry_index: index,
            entry_time: candle.date,
            entry_price: candle.open,
            exit_time: None,
            exit_price: None,
            exit_reason: None,
            profit_loss: None,
        }
    }

    fn close(&mut self, candle: &Candle, reason: ExitReason) {
        self.exit_time = Some(candle.date);
        self.exit_price = Some(candle.open);
        self.exit_reason = Some(reason);
        self.profit_loss = Some(candle.open - self.entry_price);
    }

    pub fn is_closed(&self) -> bool {
        self.exit_price.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub symbol: String,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_profit_loss: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub trades: Vec<SimulatedTrade>,
}

impl BacktestResult {
    fn from_trades(symbol: &str, trades: Vec<SimulatedTrade>) -> Self {
        let pnls: Vec<f64> = trades.iter().filter_map(|t| t.profit_loss).collect();
        let wins: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|p| *p < 0.0).collect();

        let mean = |values: &[f64]| {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        };

        let total_trades = trades.len();
        BacktestResult {
            symbol: symbol.to_string(),
            total_trades,
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate: if total_trades > 0 {
                wins.len() as f64 / total_trades as f64
            } else {
                0.0
            },
            total_profit_loss: pnls.iter().sum(),
            average_win: mean(&wins),
            average_loss: mean(&losses),
            trades,
        }
    }
}

/// Replay `candles` against `policy`.
///
/// Returns `InsufficientData` when there are fewer than `config.min_bars`
/// candles or fewer than the longest indicator lookback, and
/// `UnorderedCandles` when dates are not strictly ascending.
pub fn run_backtest(
    symbol: &str,
    candles: &[Candle],
    policy: &dyn StrategyPolicy,
    requirements: &IndicatorRequirements,
    config: &BacktestConfig,
) -> Result<BacktestResult, TradecoreError> {
    let lookback = requirements.max_lookback();
    // one decision bar plus the bar it fills on
    let minimum = config.min_bars.max(lookback).max(2);
    if candles.len() < minimum {
        return Err(TradecoreError::InsufficientData {
            symbol: symbol.to_string(),
            bars: candles.len(),
            minimum,
        });
    }
    if let Some(index) = first_unordered(candles) {
        return Err(TradecoreError::UnorderedCandles {
            symbol: symbol.to_string(),
            index,
        });
    }

    let bundle = requirements.compute(candles);
    let start = config.warmup.max(lookback.saturating_sub(1));
    let last = candles.len().saturating_sub(2);

    info!(
        symbol,
        bars = candles.len(),
        start,
        indicators = requirements.iter().count(),
        "backtest started"
    );

    let mut trades: Vec<SimulatedTrade> = Vec::new();
    let mut open: Option<SimulatedTrade> = None;

    for i in start..=last {
        let fill = &candles[i + 1];
        let decision = policy.decide(i, &bundle);

        match (open.take(), decision) {
            (None, Some(Decision::Buy)) if i < last => {
                debug!(symbol, index = i + 1, price = fill.open, "entry");
                open = Some(SimulatedTrade::open(i + 1, fill));
            }
            (Some(mut trade), Some(Decision::Sell)) => {
                trade.close(fill, ExitReason::Signal);
                debug!(symbol, index = i + 1, pnl = ?trade.profit_loss, "exit");
                trades.push(trade);
            }
            (Some(mut trade), _) if i == last => {
                trade.close(fill, ExitReason::EndOfTest);
                debug!(symbol, index = i + 1, pnl = ?trade.profit_loss, "closed at end of test");
                trades.push(trade);
            }
            (still_open, _) => open = still_open,
        }
    }

    let result = BacktestResult::from_trades(symbol, trades);
    info!(
        symbol,
        trades = result.total_trades,
        win_rate = result.win_rate,
        pnl = result.total_profit_loss,
        "backtest finished"
    );
    Ok(result)
}
