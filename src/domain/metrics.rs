//! Trade statistics recomputed from closed-trade history.

use super::position::ClosedTrade;

/// Average trading days between trades, used to annualise per-trade Sharpe.
const DAYS_BETWEEN_TRADES: f64 = 5.0;
const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Sharpe is reported as 0 below this many trades.
pub const MIN_TRADES_FOR_SHARPE: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct TradeStats {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    /// Mean return of winners, as a fraction of entry capital.
    pub average_win_pct: f64,
    /// Mean magnitude of losers' returns.
    pub average_loss_pct: f64,
    pub expectancy: f64,
    pub max_consecutive_losses: usize,
    pub max_drawdown: f64,
    pub final_equity: f64,
    pub sharpe_ratio: f64,
}

impl TradeStats {
    pub fn compute(trades: &[ClosedTrade], account_size: f64) -> Self {
        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut total_win_pct = 0.0_f64;
        let mut total_loss_pct = 0.0_f64;
        let mut streak = 0usize;
        let mut max_consecutive_losses = 0usize;

        for trade in trades {
            let ret = trade.return_pct();
            if trade.pnl > 0.0 {
                winning_trades += 1;
                total_win_pct += ret;
                streak = 0;
            } else if trade.pnl < 0.0 {
                losing_trades += 1;
                total_loss_pct += ret.abs();
                streak += 1;
                max_consecutive_losses = max_consecutive_losses.max(streak);
            } else {
                streak = 0;
            }
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64
        } else {
            0.0
        };
        let average_win_pct = if winning_trades > 0 {
            total_win_pct / winning_trades as f64
        } else {
            0.0
        };
        let average_loss_pct = if losing_trades > 0 {
            total_loss_pct / losing_trades as f64
        } else {
            0.0
        };
        let expectancy = win_rate * average_win_pct - (1.0 - win_rate) * average_loss_pct;

        let (max_drawdown, final_equity) = compute_drawdown(trades, account_size);
        let returns: Vec<f64> = trades.iter().map(ClosedTrade::return_pct).collect();

        TradeStats {
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            average_win_pct,
            average_loss_pct,
            expectancy,
            max_consecutive_losses,
            max_drawdown,
            final_equity,
            sharpe_ratio: compute_sharpe(&returns),
        }
    }

    /// Average win over average loss, if both exist.
    pub fn payoff_ratio(&self) -> Option<f64> {
        (self.winning_trades > 0 && self.losing_trades > 0 && self.average_loss_pct > 0.0)
            .then(|| self.average_win_pct / self.average_loss_pct)
    }
}

/// Replay the equity curve from `account_size`; returns (max drawdown, final equity).
fn compute_drawdown(trades: &[ClosedTrade], account_size: f64) -> (f64, f64) {
    let mut equity = account_size;
    let mut peak = account_size;
    let mut max_dd = 0.0_f64;

    for trade in trades {
        equity += trade.pnl;
        if equity > peak {
            peak = equity;
        } else if peak > 0.0 {
            let dd = (peak - equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    (max_dd, equity)
}

fn compute_sharpe(returns: &[f64]) -> f64 {
    if returns.len() < MIN_TRADES_FOR_SHARPE {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > f64::EPSILON {
        mean / stddev * (TRADING_DAYS_PER_YEAR / DAYS_BETWEEN_TRADES).sqrt()
    } else {
        0.0
    }
}
