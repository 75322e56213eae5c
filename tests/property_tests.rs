//! Property tests for indicator, backtest and sizing invariants.
//!
//! 1. No lookahead: an indicator value at bar i only depends on bars 0..=i
//! 2. Backtest trades never overlap and fill on the bar after the decision
//! 3. Position sizes never exceed the position ceiling
//! 4. Stop distance stays within its configured band

mod common;

use common::*;
use proptest::prelude::*;
use tradecore::domain::backtest::{run_backtest, BacktestConfig};
use tradecore::domain::indicator::{IndicatorBundle, IndicatorKind, IndicatorRequirements};
use tradecore::domain::risk::{RiskConfig, RiskManager};
use tradecore::domain::signal::Direction;
use tradecore::domain::strategy::Decision;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-3.0..3.0_f64, min..max).prop_map(|steps| {
        let mut price = 100.0;
        steps
            .into_iter()
            .map(|step| {
                price = (price + step).max(1.0);
                price
            })
            .collect()
    })
}

fn arb_decision() -> impl Strategy<Value = Option<Decision>> {
    prop_oneof![
        3 => Just(None),
        1 => Just(Some(Decision::Buy)),
        1 => Just(Some(Decision::Sell)),
    ]
}

fn requirements() -> IndicatorRequirements {
    IndicatorRequirements::new()
        .with("sma", IndicatorKind::Sma(10))
        .with("ema", IndicatorKind::Ema(12))
        .with("rsi", IndicatorKind::Rsi(14))
        .with("atr", IndicatorKind::Atr(14))
        .with("macd", IndicatorKind::macd_default())
}

// ── 1. No lookahead ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn indicator_values_ignore_future_bars(closes in arb_closes(60, 120), cut in 40usize..60) {
        let candles = candles_from_closes(&closes, 1_000.0);
        let full = requirements().compute(&candles);
        let truncated = requirements().compute(&candles[..=cut]);

        for name in ["sma", "ema", "rsi", "atr", "macd_macd", "macd_signal"] {
            let a = full.value_at(name, cut);
            let b = truncated.latest(name);
            prop_assert_eq!(a.is_some(), b.is_some(), "{} availability", name);
            if let (Some(a), Some(b)) = (a, b) {
                prop_assert!((a - b).abs() < 1e-9, "{}: {} vs {}", name, a, b);
            }
        }
    }
}

// ── 2. Backtest trade sequencing ─────────────────────────────────────

proptest! {
    #[test]
    fn trades_never_overlap(
        closes in arb_closes(60, 150),
        decisions in prop::collection::vec(arb_decision(), 150),
    ) {
        let candles = candles_from_closes(&closes, 1_000.0);
        let reqs = IndicatorRequirements::new().with("sma", IndicatorKind::Sma(5));
        let policy = |i: usize, _: &IndicatorBundle| decisions[i];
        let result = run_backtest("P", &candles, &policy, &reqs, &BacktestConfig::default())
            .unwrap();

        let mut previous_exit: Option<usize> = None;
        for trade in &result.trades {
            prop_assert!(trade.is_closed());
            prop_assert!(trade.entry_index >= 51);
            prop_assert_eq!(decisions[trade.entry_index - 1], Some(Decision::Buy));
            prop_assert_eq!(trade.entry_price, candles[trade.entry_index].open);

            let exit_index = candles
                .iter()
                .position(|c| Some(c.date) == trade.exit_time)
                .unwrap();
            prop_assert!(exit_index > trade.entry_index);
            if let Some(prev) = previous_exit {
                prop_assert!(trade.entry_index > prev);
            }
            previous_exit = Some(exit_index);
        }
        prop_assert_eq!(
            result.winning_trades + result.losing_trades
                + result.trades.iter().filter(|t| t.profit_loss == Some(0.0)).count(),
            result.total_trades
        );
    }
}

// ── 3. Sizing ceilings ───────────────────────────────────────────────

proptest! {
    #[test]
    fn kelly_size_within_ceiling(
        win_rate in 0.0..=1.0_f64,
        payoff in 0.1..10.0_f64,
        volatility in 0.0..1.0_f64,
        price in 1.0..1_000.0_f64,
    ) {
        let rm = RiskManager::new(100_000.0, RiskConfig::default());
        let size = rm.kelly_position_size(win_rate, payoff, volatility, price);
        prop_assert!(!size.is_fallback());
        let size = size.into_value();
        prop_assert!(size.fraction >= 0.0);
        prop_assert!(size.fraction <= rm.max_position_size() + 1e-12);
        prop_assert!(size.value <= 100_000.0 * rm.max_position_size() + 1e-6);
    }

    #[test]
    fn atr_size_within_ceiling(
        atr_pct in 0.001..0.5_f64,
        price in 1.0..1_000.0_f64,
        risk in 0.0..0.1_f64,
    ) {
        let rm = RiskManager::new(50_000.0, RiskConfig::default());
        let size = rm.atr_position_size(atr_pct, price, risk).into_value();
        prop_assert!(size.value <= 50_000.0 * rm.max_position_size() + 1e-6);
        let risked = size.shares as f64 * atr_pct * 2.0 * price;
        prop_assert!(risked <= 50_000.0 * risk + 1e-6);
    }

    #[test]
    fn invalid_sizing_inputs_fall_back(price in -1_000.0..=0.0_f64) {
        let rm = RiskManager::new(50_000.0, RiskConfig::default());
        prop_assert!(rm.kelly_position_size(0.6, 2.0, 0.1, price).is_fallback());
        prop_assert!(rm.atr_position_size(0.02, price, 0.01).is_fallback());
    }
}

// ── 4. Stop band ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn stop_distance_within_band(price in 1.0..1_000.0_f64, atr in 0.001..200.0_f64) {
        let rm = RiskManager::new(50_000.0, RiskConfig::default());
        let long = rm.calculate_levels(price, atr, Direction::Long).into_value();
        prop_assert!(long.stop_distance >= price * 0.01 - 1e-9);
        prop_assert!(long.stop_distance <= price * 0.10 + 1e-9);
        prop_assert!(long.stop_loss < price && long.take_profit > price);

        let short = rm.calculate_levels(price, atr, Direction::Short).into_value();
        prop_assert!(short.stop_loss > price && short.take_profit < price);
        prop_assert!((short.stop_distance - long.stop_distance).abs() < 1e-12);
    }
}
