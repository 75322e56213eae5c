//! Market-wide scan: evaluates many symbols in rate-limited concurrent batches.
//!
//! Each symbol runs in its own tokio task. A provider error or a panic in one
//! task is recorded in the report and never aborts the rest of the batch.

use crate::domain::error::TradecoreError;
use crate::domain::risk::{PlanRejection, SharedRiskManager, TradePlan};
use crate::domain::signal::{SignalConfig, SignalGenerator, SignalOutcome, TradingSignal};
use crate::domain::universe::{Universe, DEFAULT_SECTOR};
use crate::ports::market_data_port::MarketDataProvider;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Concurrent tasks per batch.
    pub batch_size: usize,
    /// Pause between batches to respect provider rate limits.
    pub batch_delay: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            batch_size: 5,
            batch_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolReport {
    pub symbol: String,
    pub sector: String,
    pub outcome: SignalOutcome,
    /// Risk decision for an emitted signal, when a risk manager is attached.
    pub plan: Option<Result<TradePlan, PlanRejection>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanFailure {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    pub results: Vec<SymbolReport>,
    pub failures: Vec<ScanFailure>,
}

impl ScanReport {
    pub fn signals(&self) -> impl Iterator<Item = &TradingSignal> {
        self.results.iter().filter_map(|r| r.outcome.signal())
    }

    pub fn approved_plans(&self) -> impl Iterator<Item = &TradePlan> {
        self.results
            .iter()
            .filter_map(|r| r.plan.as_ref().and_then(|p| p.as_ref().ok()))
    }

    pub fn scanned(&self) -> usize {
        self.results.len() + self.failures.len()
    }
}

pub struct MarketScanner<P> {
    generator: Arc<SignalGenerator<P>>,
    config: ScanConfig,
    risk: Option<SharedRiskManager>,
}

impl<P> MarketScanner<P>
where
    P: MarketDataProvider + 'static,
{
    pub fn new(provider: P, signal_config: SignalConfig, config: ScanConfig) -> Self {
        MarketScanner {
            generator: Arc::new(SignalGenerator::new(provider, signal_config)),
            config,
            risk: None,
        }
    }

    /// Run every emitted signal through `risk` before reporting it.
    pub fn with_risk_manager(mut self, risk: SharedRiskManager) -> Self {
        self.risk = Some(risk);
        self
    }

    /// Scan `symbols`, all treated as unclassified sector.
    pub async fn scan(&self, symbols: &[String]) -> ScanReport {
        let pairs: Vec<(String, String)> = symbols
            .iter()
            .map(|s| (s.clone(), DEFAULT_SECTOR.to_string()))
            .collect();
        self.scan_pairs(pairs).await
    }

    pub async fn scan_universe(&self, universe: &Universe) -> ScanReport {
        let pairs = universe
            .entries
            .iter()
            .map(|e| (e.symbol.clone(), e.sector.clone()))
            .collect();
        self.scan_pairs(pairs).await
    }

    async fn scan_pairs(&self, pairs: Vec<(String, String)>) -> ScanReport {
        let mut report = ScanReport::default();
        let batch_size = self.config.batch_size.max(1);
        let batches = pairs.len().div_ceil(batch_size);

        for (batch_index, batch) in pairs.chunks(batch_size).enumerate() {
            if batch_index > 0 && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }
            info!(
                batch = batch_index + 1,
                of = batches,
                symbols = batch.len(),
                "scanning batch"
            );

            let handles: Vec<_> = batch
                .iter()
                .map(|(symbol, sector)| {
                    let generator = Arc::clone(&self.generator);
                    let risk = self.risk.clone();
                    let task_symbol = symbol.clone();
                    let task_sector = sector.clone();
                    let handle = tokio::spawn(async move {
                        analyse(generator, risk, task_symbol, task_sector).await
                    });
                    (symbol.clone(), handle)
                })
                .collect();

            for (symbol, handle) in handles {
                match handle.await {
                    Ok(Ok(symbol_report)) => report.results.push(symbol_report),
                    Ok(Err(e)) => {
                        warn!(symbol = %symbol, error = %e, "scan failed");
                        report.failures.push(ScanFailure {
                            symbol,
                            reason: e.to_string(),
                        });
                    }
                    Err(join_error) => {
                        warn!(symbol = %symbol, error = %join_error, "scan task aborted");
                        report.failures.push(ScanFailure {
                            symbol,
                            reason: join_error.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            scanned = report.scanned(),
            signals = report.signals().count(),
            failures = report.failures.len(),
            "scan complete"
        );
        report
    }
}

async fn analyse<P: MarketDataProvider>(
    generator: Arc<SignalGenerator<P>>,
    risk: Option<SharedRiskManager>,
    symbol: String,
    sector: String,
) -> Result<SymbolReport, TradecoreError> {
    let outcome = generator.generate(&symbol).await?;

    let plan = match (outcome.signal(), risk) {
        (Some(signal), Some(risk)) => {
            let manager = risk.lock().await;
            let stats = manager.stats();
            let history = (stats.total_trades > 0).then_some(&stats);
            let plan = manager.plan_trade(signal, &sector, history);
            if let Err(reason) = &plan {
                debug!(symbol = %symbol, %reason, "signal rejected by risk manager");
            }
            Some(plan)
        }
        _ => None,
    };

    Ok(SymbolReport {
        symbol,
        sector,
        outcome,
        plan,
    })
}
