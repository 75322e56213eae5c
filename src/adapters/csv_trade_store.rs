//! CSV-backed trade store.
//!
//! Backtest runs overwrite `<dir>/<SYMBOL>_trades.csv`; closed trades are
//! appended to `<dir>/closed_trades.csv`.

use crate::domain::backtest::SimulatedTrade;
use crate::domain::error::TradecoreError;
use crate::domain::position::ClosedTrade;
use crate::ports::trade_store_port::TradeStore;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use tracing::info;

const SIMULATED_HEADER: [&str; 8] = [
    "entry_decision",
    "entry_index",
    "entry_time",
    "entry_price",
    "exit_time",
    "exit_price",
    "exit_reason",
    "profit_loss",
];

const CLOSED_HEADER: [&str; 10] = [
    "symbol",
    "sector",
    "direction",
    "shares",
    "entry_price",
    "exit_price",
    "entry_date",
    "exit_date",
    "pnl",
    "reason",
];

pub struct CsvTradeStore {
    dir: PathBuf,
}

impl CsvTradeStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn simulated_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}_trades.csv"))
    }

    pub fn closed_path(&self) -> PathBuf {
        self.dir.join("closed_trades.csv")
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl TradeStore for CsvTradeStore {
    fn save_simulated_trades(
        &self,
        symbol: &str,
        trades: &[SimulatedTrade],
    ) -> Result<(), TradecoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.simulated_path(symbol);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(SIMULATED_HEADER)?;
        for trade in trades {
            writer.write_record([
                trade.entry_decision.to_string(),
                trade.entry_index.to_string(),
                trade.entry_time.to_string(),
                trade.entry_price.to_string(),
                optional(trade.exit_time),
                optional(trade.exit_price),
                optional(trade.exit_reason),
                optional(trade.profit_loss),
            ])?;
        }
        writer.flush()?;
        info!(symbol, trades = trades.len(), path = %path.display(), "simulated trades saved");
        Ok(())
    }

    fn save_closed_trade(&self, trade: &ClosedTrade) -> Result<(), TradecoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.closed_path();
        let is_new = !path.exists();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(CLOSED_HEADER)?;
        }
        writer.write_record([
            trade.symbol.clone(),
            trade.sector.clone(),
            trade.direction.to_string(),
            trade.shares.to_string(),
            trade.entry_price.to_string(),
            trade.exit_price.to_string(),
            trade.entry_date.to_string(),
            trade.exit_date.to_string(),
            trade.pnl.to_string(),
            trade.reason.to_string(),
        ])?;
        writer.flush()?;
        Ok(())
    }
}
