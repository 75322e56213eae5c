//! Trade persistence port.

use crate::domain::backtest::SimulatedTrade;
use crate::domain::error::TradecoreError;
use crate::domain::position::ClosedTrade;

pub trait TradeStore {
    /// Persist the trades of one backtest run.
    fn save_simulated_trades(
        &self,
        symbol: &str,
        trades: &[SimulatedTrade],
    ) -> Result<(), TradecoreError>;

    fn save_closed_trade(&self, trade: &ClosedTrade) -> Result<(), TradecoreError>;
}
