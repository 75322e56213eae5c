//! Stop-loss and take-profit levels.

use super::RiskManager;
use crate::domain::outcome::{Computed, FallbackReason};
use crate::domain::signal::Direction;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct StopLevels {
    pub stop_loss: f64,
    pub take_profit: f64,
    pub stop_distance: f64,
    pub target_distance: f64,
}

impl StopLevels {
    fn around(price: f64, direction: Direction, stop_distance: f64, target_distance: f64) -> Self {
        let (stop_loss, take_profit) = match direction {
            Direction::Long => (price - stop_distance, price + target_distance),
            Direction::Short => (price + stop_distance, price - target_distance),
        };
        StopLevels {
            stop_loss,
            take_profit,
            stop_distance,
            target_distance,
        }
    }

    pub fn reward_risk(&self) -> f64 {
        if self.stop_distance > 0.0 {
            self.target_distance / self.stop_distance
        } else {
            0.0
        }
    }
}

impl RiskManager {
    /// Stop and target around `price`.
    ///
    /// With dynamic stops the stop distance is `atr × atr_multiplier`, clamped
    /// to `[min_stop_loss_percent, max_stop_loss_percent]` of price, and the
    /// target keeps the configured reward:risk ratio against the clamped stop.
    /// Otherwise, or when `atr` is unusable, fixed percentages apply.
    pub fn calculate_levels(&self, price: f64, atr: f64, direction: Direction) -> Computed<StopLevels> {
        let stops = &self.config.stops;
        if !price.is_finite() || price <= 0.0 {
            warn!(price, "cannot place stops around invalid price");
            return Computed::Fallback {
                value: StopLevels::around(0.0, direction, 0.0, 0.0),
                reason: FallbackReason::InvalidPrice(price),
            };
        }

        let fixed_stop = price * stops.stop_loss_percent;
        let fixed_target = price * stops.take_profit_percent;
        let ratio = stops.reward_risk_ratio();

        if stops.dynamic_stop_loss && !(atr.is_finite() && atr > 0.0) {
            warn!(atr, "invalid ATR, using fixed stop and target");
            return Computed::Fallback {
                value: StopLevels::around(price, direction, fixed_stop, fixed_target),
                reason: FallbackReason::InvalidAtr(atr),
            };
        }

        let stop_distance = if stops.dynamic_stop_loss {
            (atr * stops.atr_multiplier)
                .min(price * stops.max_stop_loss_percent)
                .max(price * stops.min_stop_loss_percent)
        } else {
            fixed_stop
        };
        let target_distance = if stops.dynamic_take_profit {
            stop_distance * ratio
        } else {
            fixed_target
        };

        Computed::Value(StopLevels::around(price, direction, stop_distance, target_distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::risk::{RiskConfig, StopSettings};
    use approx::assert_relative_eq;

    fn manager_with(stops: StopSettings) -> RiskManager {
        RiskManager::new(
            50_000.0,
            RiskConfig {
                stops,
                ..RiskConfig::default()
            },
        )
    }

    #[test]
    fn atr_levels_long_and_short() {
        let rm = manager_with(StopSettings::default());
        let long = rm.calculate_levels(100.0, 2.0, Direction::Long).into_value();
        assert_relative_eq!(long.stop_loss, 96.0);
        assert_relative_eq!(long.take_profit, 108.0);

        let short = rm.calculate_levels(100.0, 2.0, Direction::Short).into_value();
        assert_relative_eq!(short.stop_loss, 104.0);
        assert_relative_eq!(short.take_profit, 92.0);
    }

    #[test]
    fn wide_stop_is_clamped_and_ratio_kept() {
        let rm = manager_with(StopSettings::default());
        // 2 × 8 = 16 > 10% of 100
        let levels = rm.calculate_levels(100.0, 8.0, Direction::Long).into_value();
        assert_relative_eq!(levels.stop_distance, 10.0, epsilon = 1e-12);
        assert_relative_eq!(levels.target_distance, 20.0, epsilon = 1e-12);
        assert_relative_eq!(levels.reward_risk(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn tight_stop_is_widened() {
        let rm = manager_with(StopSettings::default());
        let levels = rm.calculate_levels(100.0, 0.1, Direction::Long).into_value();
        assert_relative_eq!(levels.stop_distance, 1.0, epsilon = 1e-12);
        assert_relative_eq!(levels.stop_loss, 99.0, epsilon = 1e-12);
    }

    #[test]
    fn fixed_percentages_when_not_dynamic() {
        let rm = manager_with(StopSettings {
            dynamic_stop_loss: false,
            dynamic_take_profit: false,
            ..StopSettings::default()
        });
        let levels = rm.calculate_levels(200.0, 5.0, Direction::Long);
        assert!(!levels.is_fallback());
        let levels = levels.into_value();
        assert_relative_eq!(levels.stop_loss, 196.0);
        assert_relative_eq!(levels.take_profit, 208.0);
    }

    #[test]
    fn invalid_atr_falls_back_to_fixed() {
        let rm = manager_with(StopSettings::default());
        let levels = rm.calculate_levels(200.0, f64::NAN, Direction::Short);
        assert!(matches!(
            levels.fallback_reason(),
            Some(FallbackReason::InvalidAtr(_))
        ));
        assert_relative_eq!(levels.value().stop_loss, 204.0);
        assert_relative_eq!(levels.value().take_profit, 192.0);
    }

    #[test]
    fn invalid_price_falls_back() {
        let rm = manager_with(StopSettings::default());
        let levels = rm.calculate_levels(-5.0, 1.0, Direction::Long);
        assert_eq!(
            levels.fallback_reason(),
            Some(&FallbackReason::InvalidPrice(-5.0))
        );
    }
}
