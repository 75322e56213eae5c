//! Risk manager: position sizing, stop/target levels, drawdown control,
//! exposure limits and asset blacklisting.
//!
//! A `RiskManager` owns mutable portfolio state and is a single-writer
//! resource. Concurrent callers share it as [`SharedRiskManager`].

pub mod blacklist;
pub mod config;
pub mod exposure;
pub mod levels;
pub mod sizing;

pub use blacklist::{screen_asset, BlacklistReason};
pub use config::{BlacklistCriteria, RiskConfig, RiskTuning, StopSettings, TradingLimits};
pub use exposure::ExposureRejection;
pub use levels::StopLevels;
pub use sizing::PositionSize;

use crate::domain::metrics::TradeStats;
use crate::domain::outcome::{Computed, FallbackReason};
use crate::domain::position::{ClosedTrade, Position};
use crate::domain::signal::{Direction, TradingSignal};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

pub type SharedRiskManager = Arc<tokio::sync::Mutex<RiskManager>>;

#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownStatus {
    pub equity: f64,
    pub peak_equity: f64,
    pub drawdown: f64,
    pub max_drawdown: f64,
    pub trading_halted: bool,
    /// Position ceiling after drawdown throttling.
    pub max_position_size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanRejection {
    TradingHalted { drawdown: f64 },
    Blacklisted(BlacklistReason),
    ZeroSize,
    Exposure(ExposureRejection),
}

impl fmt::Display for PlanRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanRejection::TradingHalted { drawdown } => {
                write!(f, "trading halted at {:.1}% drawdown", drawdown * 100.0)
            }
            PlanRejection::Blacklisted(reason) => write!(f, "blacklisted: {reason}"),
            PlanRejection::ZeroSize => write!(f, "position size rounds to zero shares"),
            PlanRejection::Exposure(reason) => write!(f, "{reason}"),
        }
    }
}

/// A signal that passed every risk gate, ready to become a position.
#[derive(Debug, Clone, PartialEq)]
pub struct TradePlan {
    pub symbol: String,
    pub sector: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub size: PositionSize,
    pub levels: StopLevels,
    /// Reasons any calculation fell back to a conservative default.
    pub fallbacks: Vec<FallbackReason>,
}

impl TradePlan {
    pub fn position_value(&self) -> f64 {
        self.size.value
    }

    pub fn into_position(self, entry_date: NaiveDate) -> Position {
        Position {
            symbol: self.symbol,
            sector: self.sector,
            direction: self.direction,
            shares: self.size.shares,
            entry_price: self.entry_price,
            entry_date,
            stop_loss: self.levels.stop_loss,
            take_profit: self.levels.take_profit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RiskManager {
    config: RiskConfig,
    account_size: f64,
    current_equity: f64,
    peak_equity: f64,
    current_drawdown: f64,
    max_drawdown_experienced: f64,
    consecutive_losses: u32,
    trading_halted: bool,
    /// Drawdown-adjusted position ceiling; never above `config.limits.max_position_size`.
    max_position_size: f64,
    blacklisted: HashMap<String, BlacklistReason>,
    asset_exposure: HashMap<String, f64>,
    sector_exposure: HashMap<String, f64>,
    /// Fraction booked per symbol under each sector it was added with.
    asset_sectors: HashMap<String, HashMap<String, f64>>,
    correlation_groups: HashMap<String, String>,
    closed_trades: Vec<ClosedTrade>,
}

impl RiskManager {
    pub fn new(account_size: f64, config: RiskConfig) -> Self {
        let max_position_size = config.limits.max_position_size;
        RiskManager {
            config,
            account_size,
            current_equity: account_size,
            peak_equity: account_size,
            current_drawdown: 0.0,
            max_drawdown_experienced: 0.0,
            consecutive_losses: 0,
            trading_halted: false,
            max_position_size,
            blacklisted: HashMap::new(),
            asset_exposure: HashMap::new(),
            sector_exposure: HashMap::new(),
            asset_sectors: HashMap::new(),
            correlation_groups: HashMap::new(),
            closed_trades: Vec::new(),
        }
    }

    pub fn shared(self) -> SharedRiskManager {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn account_size(&self) -> f64 {
        self.account_size
    }

    pub fn current_equity(&self) -> f64 {
        self.current_equity
    }

    pub fn current_drawdown(&self) -> f64 {
        self.current_drawdown
    }

    pub fn max_drawdown_experienced(&self) -> f64 {
        self.max_drawdown_experienced
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }

    pub fn is_halted(&self) -> bool {
        self.trading_halted
    }

    pub fn max_position_size(&self) -> f64 {
        self.max_position_size
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.closed_trades
    }

    /// Statistics over every trade recorded so far.
    pub fn stats(&self) -> TradeStats {
        TradeStats::compute(&self.closed_trades, self.account_size)
    }

    /// Record a new equity value and re-derive drawdown state.
    pub fn update_equity(&mut self, equity: f64) -> DrawdownStatus {
        self.current_equity = equity;
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        self.current_drawdown = if self.peak_equity > 0.0 {
            ((self.peak_equity - equity) / self.peak_equity).max(0.0)
        } else {
            0.0
        };
        self.max_drawdown_experienced = self.max_drawdown_experienced.max(self.current_drawdown);

        let base = self.config.limits.max_position_size;
        let tolerance = self.config.limits.max_drawdown_tolerance;
        let halted = tolerance <= 0.0 || self.current_drawdown >= tolerance;
        if halted && !self.trading_halted {
            warn!(
                drawdown = self.current_drawdown,
                tolerance, "drawdown tolerance reached, trading halted"
            );
        }
        self.trading_halted = halted;
        if !halted {
            let headroom = 1.0 - self.current_drawdown / tolerance;
            self.max_position_size = (base * headroom).min(base).max(0.0);
        }

        self.drawdown_status()
    }

    pub fn drawdown_status(&self) -> DrawdownStatus {
        DrawdownStatus {
            equity: self.current_equity,
            peak_equity: self.peak_equity,
            drawdown: self.current_drawdown,
            max_drawdown: self.max_drawdown_experienced,
            trading_halted: self.trading_halted,
            max_position_size: self.max_position_size,
        }
    }

    /// Blend the current reward:risk ratio with the Kelly-implied ratio
    /// `w / (1 - w)` and store it as the new take-profit percentage.
    ///
    /// An invalid win rate leaves the ratio unchanged.
    pub fn recalibrate_risk_reward(&mut self, win_rate: f64) -> f64 {
        let current = self.config.stops.reward_risk_ratio();
        if !win_rate.is_finite() || !(0.0..=1.0).contains(&win_rate) {
            return current;
        }
        let tuning = &self.config.tuning;
        let ideal = if win_rate < 1.0 {
            win_rate / (1.0 - win_rate)
        } else {
            tuning.max_reward_risk
        };
        let weight = tuning.recalibration_weight;
        let ratio = (weight * current + (1.0 - weight) * ideal)
            .min(tuning.max_reward_risk)
            .max(tuning.min_reward_risk);

        self.config.stops.take_profit_percent = self.config.stops.stop_loss_percent * ratio;
        info!(win_rate, previous = current, ratio, "reward:risk recalibrated");
        ratio
    }

    /// Apply a closed trade to equity, loss streak and exposure.
    pub fn record_closed_trade(&mut self, trade: ClosedTrade) -> DrawdownStatus {
        if trade.pnl < 0.0 {
            self.consecutive_losses += 1;
        } else {
            self.consecutive_losses = 0;
        }
        self.release_exposure(&trade.symbol);
        let equity = self.current_equity + trade.pnl;
        self.closed_trades.push(trade);
        self.update_equity(equity)
    }

    /// Run a signal through every risk gate: halt, blacklist, sizing, levels
    /// and exposure.
    ///
    /// With a trade history that has both wins and losses the size is Kelly
    /// based; otherwise ATR sizing at `tuning.risk_per_trade` is used.
    pub fn plan_trade(
        &self,
        signal: &TradingSignal,
        sector: &str,
        stats: Option<&TradeStats>,
    ) -> Result<TradePlan, PlanRejection> {
        if self.trading_halted {
            return Err(PlanRejection::TradingHalted {
                drawdown: self.current_drawdown,
            });
        }
        if let Some(reason) = self.blacklisted.get(&signal.symbol) {
            return Err(PlanRejection::Blacklisted(reason.clone()));
        }

        let price = signal.entry_price;
        let atr = signal.indicators.atr;
        let atr_pct = if price > 0.0 { atr / price } else { f64::NAN };

        let size = match stats.and_then(|s| s.payoff_ratio().map(|p| (s.win_rate, p))) {
            Some((win_rate, payoff)) => {
                self.kelly_position_size(win_rate, payoff, atr_pct, price)
            }
            None => self.atr_position_size(atr_pct, price, self.config.tuning.risk_per_trade),
        };
        let levels = self.calculate_levels(price, atr, signal.direction);

        let mut fallbacks = Vec::new();
        if let Some(reason) = size.fallback_reason() {
            fallbacks.push(reason.clone());
        }
        if let Some(reason) = levels.fallback_reason() {
            fallbacks.push(reason.clone());
        }

        let size = size.into_value();
        if size.shares == 0 {
            return Err(PlanRejection::ZeroSize);
        }
        self.check_exposure(&signal.symbol, sector, size.value)
            .map_err(PlanRejection::Exposure)?;

        Ok(TradePlan {
            symbol: signal.symbol.clone(),
            sector: sector.to_string(),
            direction: signal.direction,
            entry_price: price,
            size,
            levels: levels.into_value(),
            fallbacks,
        })
    }

    /// Book a plan's exposure and turn it into an open position.
    pub fn commit(&mut self, plan: TradePlan, entry_date: NaiveDate) -> Position {
        self.add_exposure(&plan.symbol, &plan.sector, plan.position_value());
        plan.into_position(entry_date)
    }

    fn fallback_size(&self, price: f64, reason: FallbackReason) -> Computed<PositionSize> {
        let fraction = self
            .config
            .tuning
            .fallback_position_size
            .min(self.max_position_size)
            .max(0.0);
        warn!(%reason, fraction, "position sizing fell back");
        Computed::Fallback {
            value: PositionSize::from_fraction(self.current_equity, fraction, price),
            reason,
        }
    }
}
