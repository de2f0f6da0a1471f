//! Symbol universe: the four symbol-bearing lists.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::domain::{ConstituentEntry, Symbol};
use crate::endpoint::SymbolList;
use crate::fetcher::Fetcher;
use crate::report::{Stage, StageReport};

/// The four resolved lists, kept separate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolUniverse {
    pub full: Vec<Symbol>,
    pub sp500: Vec<Symbol>,
    pub nasdaq: Vec<Symbol>,
    pub dow_jones: Vec<Symbol>,
}

impl SymbolUniverse {
    fn list_mut(&mut self, list: SymbolList) -> &mut Vec<Symbol> {
        match list {
            SymbolList::FullCoverage => &mut self.full,
            SymbolList::Sp500 => &mut self.sp500,
            SymbolList::Nasdaq => &mut self.nasdaq,
            SymbolList::DowJones => &mut self.dow_jones,
        }
    }

    /// S&P 500, Nasdaq, Dow Jones, then full coverage; first occurrence wins.
    pub fn work_order(&self) -> Vec<Symbol> {
        let mut seen = HashSet::new();
        self.sp500
            .iter()
            .chain(&self.nasdaq)
            .chain(&self.dow_jones)
            .chain(&self.full)
            .filter(|symbol| seen.insert(symbol.as_str()))
            .cloned()
            .collect()
    }
}

/// Resolves every list. An unavailable list is recorded and left empty.
pub async fn resolve(fetcher: &Fetcher) -> (SymbolUniverse, StageReport) {
    let mut universe = SymbolUniverse::default();
    let mut report = StageReport::new(Stage::Universe);

    for list in SymbolList::ALL {
        report.units += 1;
        let job = list.job();

        let fetched = match fetcher.fetch(&job).await {
            Ok(fetched) => fetched,
            Err(error) => {
                report.record_failure(list.name(), &error);
                continue;
            }
        };
        report.record_fetch(&fetched);

        match parse_list(list, &fetched.body) {
            Ok(symbols) => {
                info!(list = list.name(), count = symbols.len(), "symbol list resolved");
                report.counts.insert(list.name(), symbols.len());
                *universe.list_mut(list) = symbols;
            }
            Err(error) => report.record_local_failure(
                list.name(),
                Some(job.key),
                format!("couldn't parse symbol list: {error}"),
            ),
        }
    }

    report.counts.insert("distinct", universe.work_order().len());
    (universe, report)
}

/// Extracts valid symbols; malformed tickers are skipped.
pub fn parse_list(list: SymbolList, body: &[u8]) -> Result<Vec<Symbol>, serde_json::Error> {
    let raw: Vec<String> = if list.is_constituent_list() {
        serde_json::from_slice::<Vec<ConstituentEntry>>(body)?
            .into_iter()
            .map(|entry| entry.symbol)
            .collect()
    } else {
        serde_json::from_slice(body)?
    };

    Ok(raw
        .iter()
        .filter_map(|value| match Symbol::parse(value) {
            Ok(symbol) => Some(symbol),
            Err(error) => {
                warn!(list = list.name(), value = %value, "skipping symbol: {error}");
                None
            }
        })
        .collect())
}
