//! Risk manager configuration with documented defaults.
//!
//! All percentages are fractions (0.02 = 2%).

/// Exposure and drawdown ceilings, as fractions of equity.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingLimits {
    /// Largest single position.
    pub max_position_size: f64,
    pub max_sector_exposure: f64,
    pub max_asset_exposure: f64,
    pub max_correlated_exposure: f64,
    /// Drawdown at which trading halts.
    pub max_drawdown_tolerance: f64,
}

impl Default for TradingLimits {
    fn default() -> Self {
        TradingLimits {
            max_position_size: 0.10,
            max_sector_exposure: 0.30,
            max_asset_exposure: 0.15,
            max_correlated_exposure: 0.40,
            max_drawdown_tolerance: 0.20,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopSettings {
    pub stop_loss_percent: f64,
    pub take_profit_percent: f64,
    /// Derive the stop distance from ATR.
    pub dynamic_stop_loss: bool,
    /// Derive the target from the stop distance and reward:risk ratio.
    pub dynamic_take_profit: bool,
    pub atr_multiplier: f64,
    pub min_stop_loss_percent: f64,
    pub max_stop_loss_percent: f64,
}

impl Default for StopSettings {
    fn default() -> Self {
        StopSettings {
            stop_loss_percent: 0.02,
            take_profit_percent: 0.04,
            dynamic_stop_loss: true,
            dynamic_take_profit: true,
            atr_multiplier: 2.0,
            min_stop_loss_percent: 0.01,
            max_stop_loss_percent: 0.10,
        }
    }
}

impl StopSettings {
    pub fn reward_risk_ratio(&self) -> f64 {
        if self.stop_loss_percent > 0.0 {
            self.take_profit_percent / self.stop_loss_percent
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlacklistCriteria {
    /// Flag thinly traded or small-cap assets.
    pub low_liquidity: bool,
    /// Flag assets whose daily-return stddev exceeds `max_return_volatility`.
    pub high_volatility: bool,
    pub pump_and_dump: bool,
    pub manipulation: bool,
    pub min_avg_volume: f64,
    pub min_market_cap: f64,
    pub max_return_volatility: f64,
    /// Rise over `pattern_window` bars that counts as a pump.
    pub pump_rise: f64,
    /// Decline within the following `pattern_window` bars that counts as a dump.
    pub dump_decline: f64,
    pub pattern_window: usize,
    /// Volume multiple of the series average that marks a suspicious bar.
    pub manipulation_volume_multiple: f64,
    /// Close-to-close move under which a volume spike is suspicious.
    pub manipulation_max_move: f64,
}

impl Default for BlacklistCriteria {
    fn default() -> Self {
        BlacklistCriteria {
            low_liquidity: true,
            high_volatility: true,
            pump_and_dump: true,
            manipulation: true,
            min_avg_volume: 100_000.0,
            min_market_cap: 100_000_000.0,
            max_return_volatility: 0.10,
            pump_rise: 0.20,
            dump_decline: 0.15,
            pattern_window: 3,
            manipulation_volume_multiple: 5.0,
            manipulation_max_move: 0.01,
        }
    }
}

/// Sizing and recalibration constants. None of these are derived; they are
/// kept configurable until someone owns their values.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskTuning {
    /// Multiplier on the raw Kelly fraction (0.5 = half Kelly).
    pub kelly_fraction: f64,
    /// Size multiplier is `1 - volatility_scaling * volatility`.
    pub volatility_scaling: f64,
    /// Drawdown above which Kelly sizes are throttled.
    pub drawdown_throttle_start: f64,
    /// Lowest throttle multiplier under drawdown.
    pub drawdown_size_floor: f64,
    /// Losses tolerated before the streak penalty applies.
    pub loss_streak_allowance: u32,
    /// Multiplier per loss beyond the allowance.
    pub loss_streak_penalty: f64,
    /// Weight of the current ratio when recalibrating reward:risk.
    pub recalibration_weight: f64,
    pub min_reward_risk: f64,
    pub max_reward_risk: f64,
    /// Equity fraction used when a sizing input is invalid.
    pub fallback_position_size: f64,
    /// Equity fraction risked per trade by ATR sizing.
    pub risk_per_trade: f64,
}

impl Default for RiskTuning {
    fn default() -> Self {
        RiskTuning {
            kelly_fraction: 0.5,
            volatility_scaling: 0.5,
            drawdown_throttle_start: 0.05,
            drawdown_size_floor: 0.25,
            loss_streak_allowance: 2,
            loss_streak_penalty: 0.8,
            recalibration_weight: 0.7,
            min_reward_risk: 1.0,
            max_reward_risk: 5.0,
            fallback_position_size: 0.01,
            risk_per_trade: 0.01,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskConfig {
    pub limits: TradingLimits,
    pub stops: StopSettings,
    pub blacklist: BlacklistCriteria,
    pub tuning: RiskTuning,
}
