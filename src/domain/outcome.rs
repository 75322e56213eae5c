//! Value-or-fallback results for calculations that degrade instead of failing.

use std::fmt;

/// Why a calculation replaced its result with a conservative default.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    InvalidPrice(f64),
    InvalidWinRate(f64),
    InvalidPayoffRatio(f64),
    InvalidVolatility(f64),
    InvalidAtr(f64),
    InvalidRiskPercent(f64),
    NonFiniteResult,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::InvalidPrice(p) => write!(f, "invalid price {p}"),
            FallbackReason::InvalidWinRate(w) => write!(f, "invalid win rate {w}"),
            FallbackReason::InvalidPayoffRatio(r) => write!(f, "invalid payoff ratio {r}"),
            FallbackReason::InvalidVolatility(v) => write!(f, "invalid volatility {v}"),
            FallbackReason::InvalidAtr(a) => write!(f, "invalid ATR {a}"),
            FallbackReason::InvalidRiskPercent(r) => write!(f, "invalid risk percent {r}"),
            FallbackReason::NonFiniteResult => write!(f, "calculation produced a non-finite value"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Computed<T> {
    Value(T),
    Fallback { value: T, reason: FallbackReason },
}

impl<T> Computed<T> {
    pub fn value(&self) -> &T {
        match self {
            Computed::Value(v) | Computed::Fallback { value: v, .. } => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Computed::Value(v) | Computed::Fallback { value: v, .. } => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Computed::Fallback { .. })
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            Computed::Value(_) => None,
            Computed::Fallback { reason, .. } => Some(reason),
        }
    }
}
