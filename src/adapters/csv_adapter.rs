//! CSV market-data adapter.
//!
//! One file per symbol, `<dir>/<SYMBOL>.csv`, with a header row and columns
//! `date,open,high,low,close,volume` (dates as `YYYY-MM-DD`).

use crate::domain::error::TradecoreError;
use crate::domain::ohlcv::{Candle, Quote};
use crate::ports::market_data_port::MarketDataProvider;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvMarketData {
    base_path: PathBuf,
}

impl CsvMarketData {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    /// Parse every candle for `symbol`, sorted ascending by date.
    pub fn load(&self, symbol: &str) -> Result<Vec<Candle>, TradecoreError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Err(TradecoreError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let content = fs::read_to_string(&path)?;
        let mut candles = parse_candles(symbol, &content)?;
        candles.sort_by_key(|c| c.date);
        debug!(symbol, bars = candles.len(), path = %path.display(), "loaded candles");
        Ok(candles)
    }

    /// Symbols with a CSV file in the data directory, sorted.
    pub fn list_symbols(&self) -> Result<Vec<String>, TradecoreError> {
        let mut symbols = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}

fn field<T: std::str::FromStr>(
    symbol: &str,
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<T, TradecoreError>
where
    T::Err: std::fmt::Display,
{
    let line = record.position().map_or(0, |p| p.line());
    let raw = record.get(index).ok_or_else(|| TradecoreError::Provider {
        symbol: symbol.to_string(),
        reason: format!("line {line}: missing {name} column"),
    })?;
    raw.trim().parse().map_err(|e| TradecoreError::Provider {
        symbol: symbol.to_string(),
        reason: format!("line {line}: invalid {name} value {raw:?}: {e}"),
    })
}

pub fn parse_candles(symbol: &str, content: &str) -> Result<Vec<Candle>, TradecoreError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut candles = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let date_str: String = field(symbol, &record, 0, "date")?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
            TradecoreError::Provider {
                symbol: symbol.to_string(),
                reason: format!("invalid date {date_str:?}: {e}"),
            }
        })?;
        candles.push(Candle {
            date,
            open: field(symbol, &record, 1, "open")?,
            high: field(symbol, &record, 2, "high")?,
            low: field(symbol, &record, 3, "low")?,
            close: field(symbol, &record, 4, "close")?,
            volume: field(symbol, &record, 5, "volume")?,
        });
    }

    Ok(candles)
}

#[async_trait]
impl MarketDataProvider for CsvMarketData {
    async fn fetch_candles(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, TradecoreError> {
        let mut candles = self.load(symbol)?;
        let skip = candles.len().saturating_sub(limit);
        candles.drain(..skip);
        Ok(candles)
    }

    /// The last close stands in for a live quote.
    async fn latest_quote(&self, symbol: &str) -> Result<Option<Quote>, TradecoreError> {
        let candles = self.load(symbol)?;
        Ok(candles.last().map(|c| Quote {
            symbol: symbol.to_string(),
            date: c.date,
            price: c.close,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, symbol: &str, content: &str) {
        let path = dir.path().join(format!("{symbol}.csv"));
        let mut file = fs::File::create(path).unwrap();
        write!(file, "{content}").unwrap();
    }

    const SAMPLE: &str = "\
date,open,high,low,close,volume
2024-01-03,101.0,103.0,100.0,102.0,1200
2024-01-01,99.0,101.0,98.0,100.0,1000
2024-01-02,100.0,102.0,99.0,101.0,1100
";

    #[tokio::test]
    async fn fetch_sorts_and_limits() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "ACME", SAMPLE);
        let adapter = CsvMarketData::new(dir.path().to_path_buf());

        let all = adapter.fetch_candles("ACME", 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let tail = adapter.fetch_candles("ACME", 2).await.unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[1].close, 102.0);
        assert_eq!(tail[1].volume, 1200.0);
    }

    #[tokio::test]
    async fn latest_quote_is_last_close() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "ACME", SAMPLE);
        let adapter = CsvMarketData::new(dir.path().to_path_buf());
        let quote = adapter.latest_quote("ACME").await.unwrap().unwrap();
        assert_eq!(quote.price, 102.0);
        assert_eq!(quote.symbol, "ACME");
    }

    #[tokio::test]
    async fn missing_file_is_no_data() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvMarketData::new(dir.path().to_path_buf());
        assert!(matches!(
            adapter.fetch_candles("NOPE", 10).await,
            Err(TradecoreError::NoData { .. })
        ));
    }

    #[test]
    fn bad_value_reports_column() {
        let content = "date,open,high,low,close,volume\n2024-01-01,1,2,0.5,abc,10\n";
        let err = parse_candles("ACME", content).unwrap_err();
        assert!(err.to_string().contains("invalid close value"), "{err}");
    }

    #[test]
    fn bad_date_rejected() {
        let content = "date,open,high,low,close,volume\n01/02/2024,1,2,0.5,1,10\n";
        assert!(matches!(
            parse_candles("ACME", content),
            Err(TradecoreError::Provider { .. })
        ));
    }

    #[test]
    fn list_symbols_finds_csv_files() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "BHP", SAMPLE);
        write_csv(&dir, "ACME", SAMPLE);
        fs::write(dir.path().join("notes.txt"), "ignore").unwrap();
        let adapter = CsvMarketData::new(dir.path().to_path_buf());
        assert_eq!(adapter.list_symbols().unwrap(), vec!["ACME", "BHP"]);
    }
}
