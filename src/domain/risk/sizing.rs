//! Kelly and ATR position sizing.

use super::RiskManager;
use crate::domain::outcome::{Computed, FallbackReason};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct PositionSize {
    pub shares: u64,
    /// shares × price
    pub value: f64,
    /// value as a fraction of equity
    pub fraction: f64,
}

impl PositionSize {
    /// Whole shares of `price` worth at most `fraction` of `equity`.
    pub fn from_fraction(equity: f64, fraction: f64, price: f64) -> Self {
        let equity = equity.max(0.0);
        if !price.is_finite() || price <= 0.0 || !fraction.is_finite() {
            return Self::empty();
        }
        Self::from_shares((equity * fraction.max(0.0) / price).floor(), price, equity)
    }

    fn from_shares(shares: f64, price: f64, equity: f64) -> Self {
        let shares = shares.max(0.0) as u64;
        let value = shares as f64 * price;
        PositionSize {
            shares,
            value,
            fraction: if equity > 0.0 { value / equity } else { 0.0 },
        }
    }

    fn empty() -> Self {
        PositionSize {
            shares: 0,
            value: 0.0,
            fraction: 0.0,
        }
    }
}

impl RiskManager {
    /// Half-Kelly sizing, throttled by volatility, drawdown and loss streak.
    ///
    /// The cap is the drawdown-adjusted ceiling from `update_equity`, and the
    /// drawdown throttle applies on top of it, so past `drawdown_throttle_start`
    /// drawdown reduces the size twice. `drawdown_size_floor` bounds the second
    /// factor only; the result never exceeds `max_position_size()`.
    ///
    /// `volatility` is a fraction (0.02 = 2%). Invalid inputs fall back to
    /// `tuning.fallback_position_size` of equity.
    pub fn kelly_position_size(
        &self,
        win_rate: f64,
        payoff_ratio: f64,
        volatility: f64,
        price: f64,
    ) -> Computed<PositionSize> {
        if !price.is_finite() || price <= 0.0 {
            return self.fallback_size(price, FallbackReason::InvalidPrice(price));
        }
        if !win_rate.is_finite() || !(0.0..=1.0).contains(&win_rate) {
            return self.fallback_size(price, FallbackReason::InvalidWinRate(win_rate));
        }
        if !payoff_ratio.is_finite() || payoff_ratio <= 0.0 {
            return self.fallback_size(price, FallbackReason::InvalidPayoffRatio(payoff_ratio));
        }
        if !volatility.is_finite() || volatility < 0.0 {
            return self.fallback_size(price, FallbackReason::InvalidVolatility(volatility));
        }

        let tuning = &self.config.tuning;
        let kelly = (win_rate * payoff_ratio - (1.0 - win_rate)) / payoff_ratio;
        let mut fraction = (kelly * tuning.kelly_fraction)
            .min(self.max_position_size)
            .max(0.0);

        fraction *= (1.0 - tuning.volatility_scaling * volatility).min(1.0).max(0.0);

        if self.current_drawdown > tuning.drawdown_throttle_start {
            let tolerance = self.config.limits.max_drawdown_tolerance;
            let throttle = if tolerance > 0.0 {
                1.0 - self.current_drawdown / tolerance
            } else {
                0.0
            };
            fraction *= throttle.max(tuning.drawdown_size_floor).min(1.0);
        }

        if self.consecutive_losses > tuning.loss_streak_allowance {
            let extra = self.consecutive_losses - tuning.loss_streak_allowance;
            fraction *= tuning.loss_streak_penalty.powi(extra as i32);
        }

        if !fraction.is_finite() {
            return self.fallback_size(price, FallbackReason::NonFiniteResult);
        }

        debug!(kelly, fraction, "kelly sizing");
        Computed::Value(PositionSize::from_fraction(
            self.current_equity,
            fraction,
            price,
        ))
    }

    /// Size so that a stop `atr_pct × atr_multiplier` below entry risks
    /// `risk_percent` of equity, capped at the position ceiling.
    pub fn atr_position_size(
        &self,
        atr_pct: f64,
        price: f64,
        risk_percent: f64,
    ) -> Computed<PositionSize> {
        if !price.is_finite() || price <= 0.0 {
            return self.fallback_size(price, FallbackReason::InvalidPrice(price));
        }
        if !atr_pct.is_finite() || atr_pct <= 0.0 {
            return self.fallback_size(price, FallbackReason::InvalidAtr(atr_pct));
        }
        if !risk_percent.is_finite() || risk_percent < 0.0 {
            return self.fallback_size(price, FallbackReason::InvalidRiskPercent(risk_percent));
        }

        let equity = self.current_equity.max(0.0);
        let risk_per_share = atr_pct * self.config.stops.atr_multiplier * price;
        if !risk_per_share.is_finite() || risk_per_share <= 0.0 {
            return self.fallback_size(price, FallbackReason::InvalidAtr(atr_pct));
        }

        let by_risk = (equity * risk_percent / risk_per_share).floor();
        let ceiling = (equity * self.max_position_size / price).floor();
        debug!(by_risk, ceiling, risk_per_share, "atr sizing");
        Computed::Value(PositionSize::from_shares(
            by_risk.min(ceiling),
            price,
            equity,
        ))
    }
}
