//! Open position lifecycle: trailing stops, exit checks and closing.

use crate::domain::signal::Direction;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTrigger {
    StopLoss,
    TakeProfit,
    Manual,
}

impl fmt::Display for ExitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitTrigger::StopLoss => write!(f, "stop_loss"),
            ExitTrigger::TakeProfit => write!(f, "take_profit"),
            ExitTrigger::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub sector: String,
    pub direction: Direction,
    pub shares: u64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        let per_share = match self.direction {
            Direction::Long => price - self.entry_price,
            Direction::Short => self.entry_price - price,
        };
        self.shares as f64 * per_share
    }

    /// Move the stop to `price ∓ distance` if that tightens it.
    /// Returns true when the stop moved.
    pub fn update_trailing_stop(&mut self, price: f64, distance: f64) -> bool {
        if !price.is_finite() || !distance.is_finite() || distance < 0.0 {
            return false;
        }
        let candidate = match self.direction {
            Direction::Long => price - distance,
            Direction::Short => price + distance,
        };
        let favourable = match self.direction {
            Direction::Long => candidate > self.stop_loss,
            Direction::Short => candidate < self.stop_loss,
        };
        if favourable {
            self.stop_loss = candidate;
        }
        favourable
    }

    /// Stop is checked before target.
    pub fn check_exit(&self, price: f64) -> Option<ExitTrigger> {
        match self.direction {
            Direction::Long if price <= self.stop_loss => Some(ExitTrigger::StopLoss),
            Direction::Long if price >= self.take_profit => Some(ExitTrigger::TakeProfit),
            Direction::Short if price >= self.stop_loss => Some(ExitTrigger::StopLoss),
            Direction::Short if price <= self.take_profit => Some(ExitTrigger::TakeProfit),
            _ => None,
        }
    }

    pub fn close(self, exit_price: f64, exit_date: NaiveDate, reason: ExitTrigger) -> ClosedTrade {
        let pnl = self.unrealized_pnl(exit_price);
        ClosedTrade {
            symbol: self.symbol,
            sector: self.sector,
            direction: self.direction,
            shares: self.shares,
            entry_price: self.entry_price,
            exit_price,
            entry_date: self.entry_date,
            exit_date,
            pnl,
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub symbol: String,
    pub sector: String,
    pub direction: Direction,
    pub shares: u64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub pnl: f64,
    pub reason: ExitTrigger,
}

impl ClosedTrade {
    /// P&L as a fraction of the capital committed at entry.
    pub fn return_pct(&self) -> f64 {
        let cost = self.shares as f64 * self.entry_price;
        if cost > 0.0 { self.pnl / cost } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_position() -> Position {
        Position {
            symbol: "BHP".into(),
            sector: "materials".into(),
            direction: Direction::Long,
            shares: 100,
            entry_price: 50.0,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            stop_loss: 45.0,
            take_profit: 60.0,
        }
    }

    fn short_position() -> Position {
        Position {
            direction: Direction::Short,
            stop_loss: 55.0,
            take_profit: 40.0,
            ..long_position()
        }
    }

    #[test]
    fn pnl_by_direction() {
        assert!((long_position().unrealized_pnl(55.0) - 500.0).abs() < f64::EPSILON);
        assert!((short_position().unrealized_pnl(55.0) + 500.0).abs() < f64::EPSILON);
        assert!((long_position().market_value(52.0) - 5200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn long_trailing_stop_only_rises() {
        let mut pos = long_position();
        assert!(pos.update_trailing_stop(55.0, 3.0));
        assert!((pos.stop_loss - 52.0).abs() < f64::EPSILON);
        assert!(!pos.update_trailing_stop(53.0, 3.0));
        assert!((pos.stop_loss - 52.0).abs() < f64::EPSILON);
    }

    #[test]
    fn short_trailing_stop_only_falls() {
        let mut pos = short_position();
        assert!(pos.update_trailing_stop(48.0, 3.0));
        assert!((pos.stop_loss - 51.0).abs() < f64::EPSILON);
        assert!(!pos.update_trailing_stop(50.0, 3.0));
        assert!((pos.stop_loss - 51.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trailing_stop_ignores_bad_input() {
        let mut pos = long_position();
        assert!(!pos.update_trailing_stop(f64::NAN, 1.0));
        assert!(!pos.update_trailing_stop(60.0, -1.0));
        assert!((pos.stop_loss - 45.0).abs() < f64::EPSILON);
    }

    #[test]
    fn exit_checks() {
        let long = long_position();
        assert_eq!(long.check_exit(45.0), Some(ExitTrigger::StopLoss));
        assert_eq!(long.check_exit(60.0), Some(ExitTrigger::TakeProfit));
        assert_eq!(long.check_exit(50.0), None);

        let short = short_position();
        assert_eq!(short.check_exit(56.0), Some(ExitTrigger::StopLoss));
        assert_eq!(short.check_exit(39.0), Some(ExitTrigger::TakeProfit));
        assert_eq!(short.check_exit(50.0), None);
    }

    #[test]
    fn close_produces_trade() {
        let exit = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let trade = long_position().close(60.0, exit, ExitTrigger::TakeProfit);
        assert!((trade.pnl - 1000.0).abs() < f64::EPSILON);
        assert!((trade.return_pct() - 0.2).abs() < 1e-12);
        assert_eq!(trade.exit_date, exit);
        assert_eq!(trade.reason, ExitTrigger::TakeProfit);
    }
}
