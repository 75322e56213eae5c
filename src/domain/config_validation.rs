//! Configuration building and validation.
//!
//! Each `build_*` function reads one concern from a [`ConfigPort`], starting
//! from the type's `Default` so that missing keys keep their documented value.
//! Out-of-range values are rejected with `ConfigInvalid`.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::TradecoreError;
use crate::domain::risk::{BlacklistCriteria, RiskConfig, RiskTuning, StopSettings, TradingLimits};
use crate::domain::scanner::ScanConfig;
use crate::domain::signal::SignalConfig;
use crate::ports::config_port::ConfigPort;
use std::time::Duration;

pub const DEFAULT_ACCOUNT_SIZE: f64 = 100_000.0;

fn invalid(section: &str, key: &str, reason: &str) -> TradecoreError {
    TradecoreError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Fraction in (0, 1].
fn fraction(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TradecoreError> {
    let value = config.get_double(section, key, default);
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid(section, key, &format!("{key} must be in (0, 1]")));
    }
    Ok(value)
}

/// Fraction in [0, 1].
fn unit_interval(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TradecoreError> {
    let value = config.get_double(section, key, default);
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(section, key, &format!("{key} must be in [0, 1]")));
    }
    Ok(value)
}

fn positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TradecoreError> {
    let value = config.get_double(section, key, default);
    if !(value.is_finite() && value > 0.0) {
        return Err(invalid(section, key, &format!("{key} must be positive")));
    }
    Ok(value)
}

fn non_negative(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TradecoreError> {
    let value = config.get_double(section, key, default);
    if !(value.is_finite() && value >= 0.0) {
        return Err(invalid(section, key, &format!("{key} must be non-negative")));
    }
    Ok(value)
}

/// Integer of at least `minimum`.
fn count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
    minimum: usize,
) -> Result<usize, TradecoreError> {
    let value = config.get_int(section, key, default as i64);
    match usize::try_from(value) {
        Ok(v) if v >= minimum => Ok(v),
        _ => Err(invalid(
            section,
            key,
            &format!("{key} must be at least {minimum}"),
        )),
    }
}

pub fn build_limits(config: &dyn ConfigPort) -> Result<TradingLimits, TradecoreError> {
    let d = TradingLimits::default();
    let s = "limits";
    Ok(TradingLimits {
        max_position_size: fraction(config, s, "max_position_size", d.max_position_size)?,
        max_sector_exposure: fraction(config, s, "max_sector_exposure", d.max_sector_exposure)?,
        max_asset_exposure: fraction(config, s, "max_asset_exposure", d.max_asset_exposure)?,
        max_correlated_exposure: fraction(
            config,
            s,
            "max_correlated_exposure",
            d.max_correlated_exposure,
        )?,
        max_drawdown_tolerance: fraction(
            config,
            s,
            "max_drawdown_tolerance",
            d.max_drawdown_tolerance,
        )?,
    })
}

pub fn build_stops(config: &dyn ConfigPort) -> Result<StopSettings, TradecoreError> {
    let d = StopSettings::default();
    let s = "stops";
    let stops = StopSettings {
        stop_loss_percent: fraction(config, s, "stop_loss_percent", d.stop_loss_percent)?,
        take_profit_percent: positive(config, s, "take_profit_percent", d.take_profit_percent)?,
        dynamic_stop_loss: config.get_bool(s, "dynamic_stop_loss", d.dynamic_stop_loss),
        dynamic_take_profit: config.get_bool(s, "dynamic_take_profit", d.dynamic_take_profit),
        atr_multiplier: positive(config, s, "atr_multiplier", d.atr_multiplier)?,
        min_stop_loss_percent: fraction(config, s, "min_stop_loss_percent", d.min_stop_loss_percent)?,
        max_stop_loss_percent: fraction(config, s, "max_stop_loss_percent", d.max_stop_loss_percent)?,
    };
    if stops.min_stop_loss_percent > stops.max_stop_loss_percent {
        return Err(invalid(
            s,
            "min_stop_loss_percent",
            "min_stop_loss_percent must not exceed max_stop_loss_percent",
        ));
    }
    Ok(stops)
}

pub fn build_blacklist(config: &dyn ConfigPort) -> Result<BlacklistCriteria, TradecoreError> {
    let d = BlacklistCriteria::default();
    let s = "blacklist";
    Ok(BlacklistCriteria {
        low_liquidity: config.get_bool(s, "low_liquidity", d.low_liquidity),
        high_volatility: config.get_bool(s, "high_volatility", d.high_volatility),
        pump_and_dump: config.get_bool(s, "pump_and_dump", d.pump_and_dump),
        manipulation: config.get_bool(s, "manipulation", d.manipulation),
        min_avg_volume: non_negative(config, s, "min_avg_volume", d.min_avg_volume)?,
        min_market_cap: non_negative(config, s, "min_market_cap", d.min_market_cap)?,
        max_return_volatility: positive(config, s, "max_return_volatility", d.max_return_volatility)?,
        pump_rise: positive(config, s, "pump_rise", d.pump_rise)?,
        dump_decline: fraction(config, s, "dump_decline", d.dump_decline)?,
        pattern_window: count(config, s, "pattern_window", d.pattern_window, 1)?,
        manipulation_volume_multiple: positive(
            config,
            s,
            "manipulation_volume_multiple",
            d.manipulation_volume_multiple,
        )?,
        manipulation_max_move: non_negative(
            config,
            s,
            "manipulation_max_move",
            d.manipulation_max_move,
        )?,
    })
}

pub fn build_tuning(config: &dyn ConfigPort) -> Result<RiskTuning, TradecoreError> {
    let d = RiskTuning::default();
    let s = "tuning";
    let allowance = count(
        config,
        s,
        "loss_streak_allowance",
        d.loss_streak_allowance as usize,
        0,
    )?;
    let tuning = RiskTuning {
        kelly_fraction: fraction(config, s, "kelly_fraction", d.kelly_fraction)?,
        volatility_scaling: unit_interval(config, s, "volatility_scaling", d.volatility_scaling)?,
        drawdown_throttle_start: unit_interval(
            config,
            s,
            "drawdown_throttle_start",
            d.drawdown_throttle_start,
        )?,
        drawdown_size_floor: unit_interval(config, s, "drawdown_size_floor", d.drawdown_size_floor)?,
        loss_streak_allowance: u32::try_from(allowance)
            .map_err(|_| invalid(s, "loss_streak_allowance", "loss_streak_allowance too large"))?,
        loss_streak_penalty: fraction(config, s, "loss_streak_penalty", d.loss_streak_penalty)?,
        recalibration_weight: unit_interval(
            config,
            s,
            "recalibration_weight",
            d.recalibration_weight,
        )?,
        min_reward_risk: positive(config, s, "min_reward_risk", d.min_reward_risk)?,
        max_reward_risk: positive(config, s, "max_reward_risk", d.max_reward_risk)?,
        fallback_position_size: fraction(
            config,
            s,
            "fallback_position_size",
            d.fallback_position_size,
        )?,
        risk_per_trade: fraction(config, s, "risk_per_trade", d.risk_per_trade)?,
    };
    if tuning.min_reward_risk > tuning.max_reward_risk {
        return Err(invalid(
            s,
            "min_reward_risk",
            "min_reward_risk must not exceed max_reward_risk",
        ));
    }
    Ok(tuning)
}

pub fn build_risk_config(config: &dyn ConfigPort) -> Result<RiskConfig, TradecoreError> {
    Ok(RiskConfig {
        limits: build_limits(config)?,
        stops: build_stops(config)?,
        blacklist: build_blacklist(config)?,
        tuning: build_tuning(config)?,
    })
}

pub fn build_signal_config(config: &dyn ConfigPort) -> Result<SignalConfig, TradecoreError> {
    let d = SignalConfig::default();
    let s = "signal";
    let signal = SignalConfig {
        rsi_period: count(config, s, "rsi_period", d.rsi_period, 1)?,
        volume_period: count(config, s, "volume_period", d.volume_period, 1)?,
        fast_trend_period: count(config, s, "fast_trend_period", d.fast_trend_period, 1)?,
        slow_trend_period: count(config, s, "slow_trend_period", d.slow_trend_period, 1)?,
        atr_period: count(config, s, "atr_period", d.atr_period, 1)?,
        atr_stop_multiplier: positive(config, s, "atr_stop_multiplier", d.atr_stop_multiplier)?,
        reward_risk_ratio: positive(config, s, "reward_risk_ratio", d.reward_risk_ratio)?,
        long_below_rsi: config.get_double(s, "long_below_rsi", d.long_below_rsi),
        short_above_rsi: config.get_double(s, "short_above_rsi", d.short_above_rsi),
        min_relative_volume: non_negative(config, s, "min_relative_volume", d.min_relative_volume)?,
        trend_tolerance: non_negative(config, s, "trend_tolerance", d.trend_tolerance)?,
        history_bars: count(config, s, "history_bars", d.history_bars, 1)?,
    };

    if signal.fast_trend_period >= signal.slow_trend_period {
        return Err(invalid(
            s,
            "fast_trend_period",
            "fast_trend_period must be shorter than slow_trend_period",
        ));
    }
    for (key, value) in [
        ("long_below_rsi", signal.long_below_rsi),
        ("short_above_rsi", signal.short_above_rsi),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid(s, key, &format!("{key} must be in [0, 100]")));
        }
    }
    if signal.long_below_rsi > signal.short_above_rsi {
        return Err(invalid(
            s,
            "long_below_rsi",
            "long_below_rsi must not exceed short_above_rsi",
        ));
    }
    if signal.history_bars < signal.minimum_bars() {
        return Err(invalid(
            s,
            "history_bars",
            &format!(
                "history_bars must cover the longest lookback ({})",
                signal.minimum_bars()
            ),
        ));
    }
    Ok(signal)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TradecoreError> {
    let d = BacktestConfig::default();
    Ok(BacktestConfig {
        min_bars: count(config, "backtest", "min_bars", d.min_bars, 2)?,
        warmup: count(config, "backtest", "warmup", d.warmup, 0)?,
    })
}

pub fn build_scan_config(config: &dyn ConfigPort) -> Result<ScanConfig, TradecoreError> {
    let d = ScanConfig::default();
    let delay_ms = count(
        config,
        "scan",
        "batch_delay_ms",
        d.batch_delay.as_millis() as usize,
        0,
    )?;
    Ok(ScanConfig {
        batch_size: count(config, "scan", "batch_size", d.batch_size, 1)?,
        batch_delay: Duration::from_millis(delay_ms as u64),
    })
}

/// Starting equity from `[account] size`.
pub fn account_size(config: &dyn ConfigPort) -> Result<f64, TradecoreError> {
    positive(config, "account", "size", DEFAULT_ACCOUNT_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use approx::assert_relative_eq;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn assert_invalid(result: Result<impl std::fmt::Debug, TradecoreError>, expected_key: &str) {
        match result {
            Err(TradecoreError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected invalid {expected_key}, got {other:?}"),
        }
    }

    #[test]
    fn empty_config_yields_defaults() {
        let config = make_config("");
        assert_eq!(build_risk_config(&config).unwrap(), RiskConfig::default());
        assert_eq!(build_signal_config(&config).unwrap(), SignalConfig::default());
        assert_eq!(build_backtest_config(&config).unwrap(), BacktestConfig::default());
        assert_eq!(build_scan_config(&config).unwrap(), ScanConfig::default());
        assert_relative_eq!(account_size(&config).unwrap(), DEFAULT_ACCOUNT_SIZE);
    }

    #[test]
    fn values_override_defaults() {
        let config = make_config(
            r#"
[account]
size = 25000

[limits]
max_position_size = 0.05
max_drawdown_tolerance = 0.15

[stops]
dynamic_stop_loss = false
atr_multiplier = 3

[blacklist]
manipulation = no
pattern_window = 5

[tuning]
kelly_fraction = 0.25
loss_streak_allowance = 4

[signal]
rsi_period = 10
history_bars = 120

[backtest]
warmup = 30

[scan]
batch_size = 8
batch_delay_ms = 250
"#,
        );
        let risk = build_risk_config(&config).unwrap();
        assert_relative_eq!(risk.limits.max_position_size, 0.05);
        assert_relative_eq!(risk.limits.max_drawdown_tolerance, 0.15);
        assert_relative_eq!(risk.limits.max_sector_exposure, 0.30);
        assert!(!risk.stops.dynamic_stop_loss);
        assert_relative_eq!(risk.stops.atr_multiplier, 3.0);
        assert!(!risk.blacklist.manipulation);
        assert_eq!(risk.blacklist.pattern_window, 5);
        assert_relative_eq!(risk.tuning.kelly_fraction, 0.25);
        assert_eq!(risk.tuning.loss_streak_allowance, 4);

        let signal = build_signal_config(&config).unwrap();
        assert_eq!(signal.rsi_period, 10);
        assert_eq!(signal.history_bars, 120);

        assert_eq!(build_backtest_config(&config).unwrap().warmup, 30);
        let scan = build_scan_config(&config).unwrap();
        assert_eq!(scan.batch_size, 8);
        assert_eq!(scan.batch_delay, Duration::from_millis(250));
        assert_relative_eq!(account_size(&config).unwrap(), 25_000.0);
    }

    #[test]
    fn position_size_above_one_fails() {
        let config = make_config("[limits]\nmax_position_size = 1.5\n");
        assert_invalid(build_risk_config(&config), "max_position_size");
    }

    #[test]
    fn zero_drawdown_tolerance_fails() {
        let config = make_config("[limits]\nmax_drawdown_tolerance = 0\n");
        assert_invalid(build_risk_config(&config), "max_drawdown_tolerance");
    }

    #[test]
    fn inverted_stop_bounds_fail() {
        let config = make_config("[stops]\nmin_stop_loss_percent = 0.2\nmax_stop_loss_percent = 0.1\n");
        assert_invalid(build_risk_config(&config), "min_stop_loss_percent");
    }

    #[test]
    fn negative_volume_floor_fails() {
        let config = make_config("[blacklist]\nmin_avg_volume = -1\n");
        assert_invalid(build_risk_config(&config), "min_avg_volume");
    }

    #[test]
    fn zero_pattern_window_fails() {
        let config = make_config("[blacklist]\npattern_window = 0\n");
        assert_invalid(build_risk_config(&config), "pattern_window");
    }

    #[test]
    fn inverted_reward_risk_bounds_fail() {
        let config = make_config("[tuning]\nmin_reward_risk = 6\n");
        assert_invalid(build_risk_config(&config), "min_reward_risk");
    }

    #[test]
    fn negative_streak_allowance_fails() {
        let config = make_config("[tuning]\nloss_streak_allowance = -1\n");
        assert_invalid(build_risk_config(&config), "loss_streak_allowance");
    }

    #[test]
    fn zero_period_fails() {
        let config = make_config("[signal]\nrsi_period = 0\n");
        assert_invalid(build_signal_config(&config), "rsi_period");
    }

    #[test]
    fn fast_trend_must_be_shorter() {
        let config = make_config("[signal]\nfast_trend_period = 50\n");
        assert_invalid(build_signal_config(&config), "fast_trend_period");
    }

    #[test]
    fn rsi_thresholds_checked() {
        let config = make_config("[signal]\nshort_above_rsi = 120\n");
        assert_invalid(build_signal_config(&config), "short_above_rsi");

        let config = make_config("[signal]\nlong_below_rsi = 65\n");
        assert_invalid(build_signal_config(&config), "long_below_rsi");
    }

    #[test]
    fn history_must_cover_lookback() {
        let config = make_config("[signal]\nhistory_bars = 30\n");
        assert_invalid(build_signal_config(&config), "history_bars");
    }

    #[test]
    fn zero_batch_size_fails() {
        let config = make_config("[scan]\nbatch_size = 0\n");
        assert_invalid(build_scan_config(&config), "batch_size");
    }

    #[test]
    fn non_positive_account_fails() {
        let config = make_config("[account]\nsize = 0\n");
        assert_invalid(account_size(&config), "size");
    }

    #[test]
    fn error_message_names_section() {
        let config = make_config("[limits]\nmax_asset_exposure = 2\n");
        let err = build_limits(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config value [limits] max_asset_exposure: max_asset_exposure must be in (0, 1]"
        );
    }
}
