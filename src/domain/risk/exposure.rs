//! Per-asset, per-sector and correlated-group exposure tracking.
//!
//! Exposure is stored as a fraction of equity at the time it was booked.

use super::RiskManager;
use std::fmt;

/// Rounding slack when comparing fractions against a limit.
const LIMIT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub enum ExposureRejection {
    NoEquity,
    AssetLimit {
        symbol: String,
        proposed: f64,
        limit: f64,
    },
    SectorLimit {
        sector: String,
        proposed: f64,
        limit: f64,
    },
    CorrelatedLimit {
        group: String,
        proposed: f64,
        limit: f64,
    },
}

impl fmt::Display for ExposureRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExposureRejection::NoEquity => write!(f, "no equity to allocate"),
            ExposureRejection::AssetLimit {
                symbol,
                proposed,
                limit,
            } => write!(
                f,
                "{symbol} exposure {:.1}% would exceed {:.1}%",
                proposed * 100.0,
                limit * 100.0
            ),
            ExposureRejection::SectorLimit {
                sector,
                proposed,
                limit,
            } => write!(
                f,
                "sector {sector} exposure {:.1}% would exceed {:.1}%",
                proposed * 100.0,
                limit * 100.0
            ),
            ExposureRejection::CorrelatedLimit {
                group,
                proposed,
                limit,
            } => write!(
                f,
                "correlated group {group} exposure {:.1}% would exceed {:.1}%",
                proposed * 100.0,
                limit * 100.0
            ),
        }
    }
}

impl RiskManager {
    fn equity_fraction(&self, value: f64) -> Option<f64> {
        (self.current_equity > 0.0).then(|| value / self.current_equity)
    }

    pub fn asset_exposure(&self, symbol: &str) -> f64 {
        self.asset_exposure.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn sector_exposure(&self, sector: &str) -> f64 {
        self.sector_exposure.get(sector).copied().unwrap_or(0.0)
    }

    /// Summed exposure of every asset assigned to `group`.
    pub fn correlated_exposure(&self, group: &str) -> f64 {
        self.correlation_groups
            .iter()
            .filter(|(_, g)| g.as_str() == group)
            .map(|(symbol, _)| self.asset_exposure(symbol))
            .sum()
    }

    pub fn set_correlation_group(&mut self, symbol: &str, group: &str) {
        self.correlation_groups
            .insert(symbol.to_string(), group.to_string());
    }

    /// Reject a prospective position that would breach any exposure ceiling.
    pub fn check_exposure(
        &self,
        symbol: &str,
        sector: &str,
        position_value: f64,
    ) -> Result<(), ExposureRejection> {
        let fraction = self
            .equity_fraction(position_value)
            .ok_or(ExposureRejection::NoEquity)?;
        let limits = &self.config.limits;

        let proposed = self.asset_exposure(symbol) + fraction;
        if proposed > limits.max_asset_exposure + LIMIT_EPSILON {
            return Err(ExposureRejection::AssetLimit {
                symbol: symbol.to_string(),
                proposed,
                limit: limits.max_asset_exposure,
            });
        }

        let proposed = self.sector_exposure(sector) + fraction;
        if proposed > limits.max_sector_exposure + LIMIT_EPSILON {
            return Err(ExposureRejection::SectorLimit {
                sector: sector.to_string(),
                proposed,
                limit: limits.max_sector_exposure,
            });
        }

        if let Some(group) = self.correlation_groups.get(symbol) {
            let proposed = self.correlated_exposure(group) + fraction;
            if proposed > limits.max_correlated_exposure + LIMIT_EPSILON {
                return Err(ExposureRejection::CorrelatedLimit {
                    group: group.clone(),
                    proposed,
                    limit: limits.max_correlated_exposure,
                });
            }
        }

        Ok(())
    }

    pub fn add_exposure(&mut self, symbol: &str, sector: &str, position_value: f64) {
        let Some(fraction) = self.equity_fraction(position_value) else {
            return;
        };
        *self.asset_exposure.entry(symbol.to_string()).or_insert(0.0) += fraction;
        *self.sector_exposure.entry(sector.to_string()).or_insert(0.0) += fraction;
        *self
            .asset_sectors
            .entry(symbol.to_string())
            .or_default()
            .entry(sector.to_string())
            .or_insert(0.0) += fraction;
    }

    /// Drop all exposure booked for `symbol`, from every sector it was booked
    /// under; returns the fraction released.
    pub fn release_exposure(&mut self, symbol: &str) -> f64 {
        let released = self.asset_exposure.remove(symbol).unwrap_or(0.0);
        for (sector, booked) in self.asset_sectors.remove(symbol).unwrap_or_default() {
            if let Some(total) = self.sector_exposure.get_mut(&sector) {
                *total -= booked;
                if *total <= LIMIT_EPSILON {
                    self.sector_exposure.remove(&sector);
                }
            }
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::risk::{ExposureRejection, RiskConfig, RiskManager};
    use approx::assert_relative_eq;

    fn manager() -> RiskManager {
        RiskManager::new(100_000.0, RiskConfig::default())
    }

    #[test]
    fn asset_limit() {
        let mut rm = manager();
        rm.add_exposure("ACME", "tech", 10_000.0);
        assert!(rm.check_exposure("ACME", "tech", 5_000.0).is_ok());
        match rm.check_exposure("ACME", "tech", 6_000.0) {
            Err(ExposureRejection::AssetLimit { proposed, limit, .. }) => {
                assert_relative_eq!(proposed, 0.16, epsilon = 1e-12);
                assert_relative_eq!(limit, 0.15);
            }
            other => panic!("expected asset limit, got {other:?}"),
        }
    }

    #[test]
    fn sector_limit_spans_assets() {
        let mut rm = manager();
        rm.add_exposure("A", "energy", 15_000.0);
        rm.add_exposure("B", "energy", 10_000.0);
        assert_relative_eq!(rm.sector_exposure("energy"), 0.25, epsilon = 1e-12);
        assert!(matches!(
            rm.check_exposure("C", "energy", 6_000.0),
            Err(ExposureRejection::SectorLimit { .. })
        ));
        assert!(rm.check_exposure("C", "utilities", 6_000.0).is_ok());
    }

    #[test]
    fn correlated_limit_crosses_sectors() {
        let mut rm = manager();
        for symbol in ["BHP", "RIO", "FMG"] {
            rm.set_correlation_group(symbol, "iron-ore");
        }
        rm.add_exposure("BHP", "materials", 14_000.0);
        rm.add_exposure("RIO", "mining", 14_000.0);
        assert_relative_eq!(rm.correlated_exposure("iron-ore"), 0.28, epsilon = 1e-12);

        match rm.check_exposure("FMG", "steel", 13_000.0) {
            Err(ExposureRejection::CorrelatedLimit { group, .. }) => assert_eq!(group, "iron-ore"),
            other => panic!("expected correlated limit, got {other:?}"),
        }
        assert!(rm.check_exposure("XYZ", "steel", 13_000.0).is_ok());
    }

    #[test]
    fn release_restores_headroom() {
        let mut rm = manager();
        rm.add_exposure("A", "energy", 15_000.0);
        rm.add_exposure("B", "energy", 15_000.0);
        assert!(rm.check_exposure("C", "energy", 1_000.0).is_err());

        assert_relative_eq!(rm.release_exposure("A"), 0.15);
        assert_relative_eq!(rm.sector_exposure("energy"), 0.15, epsilon = 1e-12);
        assert!(rm.check_exposure("C", "energy", 1_000.0).is_ok());
        assert_eq!(rm.release_exposure("missing"), 0.0);
    }

    #[test]
    fn release_after_sector_change_clears_both_sectors() {
        let mut rm = manager();
        rm.add_exposure("ACME", "tech", 5_000.0);
        rm.add_exposure("ACME", "industrials", 3_000.0);
        rm.add_exposure("OTHER", "tech", 2_000.0);
        assert_relative_eq!(rm.sector_exposure("tech"), 0.07, epsilon = 1e-12);
        assert_relative_eq!(rm.sector_exposure("industrials"), 0.03, epsilon = 1e-12);

        assert_relative_eq!(rm.release_exposure("ACME"), 0.08, epsilon = 1e-12);
        assert_relative_eq!(rm.sector_exposure("tech"), 0.02, epsilon = 1e-12);
        assert_eq!(rm.sector_exposure("industrials"), 0.0);
    }

    #[test]
    fn no_equity_rejects() {
        let mut rm = manager();
        rm.update_equity(0.0);
        assert_eq!(
            rm.check_exposure("A", "energy", 1.0),
            Err(ExposureRejection::NoEquity)
        );
    }

    #[test]
    fn rejection_messages() {
        let rejection = ExposureRejection::SectorLimit {
            sector: "tech".into(),
            proposed: 0.35,
            limit: 0.3,
        };
        assert_eq!(
            rejection.to_string(),
            "sector tech exposure 35.0% would exceed 30.0%"
        );
    }
}
