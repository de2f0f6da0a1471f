//! Per-symbol fundamentals downloads.

use futures::stream::{self, StreamExt};
use tracing::info;

use crate::domain::Symbol;
use crate::endpoint::FundamentalsEndpoint;
use crate::fetcher::{FetchError, Fetched, Fetcher};
use crate::report::{Stage, StageReport};

/// Outcome of one symbol's eight fetches.
#[derive(Debug)]
pub struct SymbolOutcome {
    pub symbol: Symbol,
    pub fetched: Vec<Fetched>,
    pub error: Option<FetchError>,
}

/// Fetches the eight files of `symbol` in order; the first failure abandons
/// the rest of the symbol.
pub async fn fetch_symbol(fetcher: &Fetcher, symbol: Symbol) -> SymbolOutcome {
    let mut fetched = Vec::with_capacity(FundamentalsEndpoint::ALL.len());

    for endpoint in FundamentalsEndpoint::ALL {
        match fetcher.fetch(&endpoint.job(&symbol)).await {
            Ok(blob) => fetched.push(blob),
            Err(error) => {
                return SymbolOutcome {
                    symbol,
                    fetched,
                    error: Some(error),
                }
            }
        }
    }

    SymbolOutcome {
        symbol,
        fetched,
        error: None,
    }
}

/// Runs every symbol as an isolated unit, at most `workers` at a time.
///
/// Results are consumed in input order regardless of `workers`.
pub async fn fetch_all(fetcher: &Fetcher, symbols: Vec<Symbol>, workers: usize) -> StageReport {
    let mut report = StageReport::new(Stage::Fundamentals);
    let total = symbols.len();

    let mut outcomes = stream::iter(symbols)
        .map(|symbol| fetch_symbol(fetcher, symbol))
        .buffered(workers.max(1));

    while let Some(outcome) = outcomes.next().await {
        report.units += 1;
        for blob in &outcome.fetched {
            report.record_fetch(blob);
        }
        if let Some(error) = &outcome.error {
            report.record_failure(outcome.symbol.as_str(), error);
        }
        if report.units % 100 == 0 {
            info!(done = report.units, total, "fundamentals progress");
        }
    }

    info!(
        symbols = report.units,
        fetched = report.fetched,
        cached = report.cached,
        failed = report.failures.len(),
        "fundamentals stage finished"
    );
    report
}
