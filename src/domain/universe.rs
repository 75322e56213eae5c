//! Symbol universe for scans and multi-symbol backtests.
//!
//! A universe is a comma-separated list of symbols, each optionally tagged
//! with a sector as `SYMBOL:sector`.

use std::collections::HashSet;

pub const DEFAULT_SECTOR: &str = "unclassified";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseEntry {
    pub symbol: String,
    pub sector: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Universe {
    pub entries: Vec<UniverseEntry>,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.symbol.clone()).collect()
    }

    pub fn sector_of(&self, symbol: &str) -> &str {
        self.entries
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| e.sector.as_str())
            .unwrap_or(DEFAULT_SECTOR)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("empty sector for {0}")]
    EmptySector(String),

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

pub fn parse_universe(input: &str) -> Result<Universe, UniverseError> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        let (symbol, sector) = match trimmed.split_once(':') {
            Some((symbol, sector)) => (symbol.trim(), Some(sector.trim())),
            None => (trimmed, None),
        };
        if symbol.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = symbol.to_uppercase();
        let sector = match sector {
            Some("") => return Err(UniverseError::EmptySector(symbol)),
            Some(s) => s.to_lowercase(),
            None => DEFAULT_SECTOR.to_string(),
        };
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        entries.push(UniverseEntry { symbol, sector });
    }

    Ok(Universe { entries })
}

/// Symbols only, sectors discarded.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    parse_universe(input).map(|u| u.symbols())
}
