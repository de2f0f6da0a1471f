//! Local lookup indexes derived from cached profiles.
//!
//! Both builders only read the cache and never touch the network. Output
//! files are written once: an index file that already exists is left as is.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::domain::{decode_path_segment, Profile, ResourceKey};
use crate::endpoint::FundamentalsEndpoint;
use crate::exchanges::{self, Exchange, MarketType, Region};
use crate::report::{Stage, StageReport};

/// Exchange bucket for symbols without a usable profile.
pub const UNKNOWN_EXCHANGE: &str = "UNKNOWN";
pub const DEFAULT_PREFERRED_SUFFIX: &str = "-PL";

const FUNDAMENTALS_DIR: &str = "fundamentals";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Region ranked first by market cap in the search index.
    pub primary_region: Region,
    /// Symbols with this suffix are left out of the market-cap ranking.
    pub preferred_suffix: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            primary_region: Region::UnitedStates,
            preferred_suffix: String::from(DEFAULT_PREFERRED_SUFFIX),
        }
    }
}

/// Exchange short code → symbol directories, both in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeIndex {
    pub groups: BTreeMap<String, Vec<String>>,
}

impl ExchangeIndex {
    /// Groups every cached symbol by its profile's `exchangeShortName`.
    pub fn from_cache(cache: &CacheStore) -> std::io::Result<Self> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut profiles = ProfileReader::new(cache);

        for symbol in cache.list_dir(FUNDAMENTALS_DIR)? {
            let code = profiles
                .get(&symbol)
                .and_then(|profile| profile.exchange_short_name.clone())
                .filter(|code| !code.trim().is_empty())
                .unwrap_or_else(|| String::from(UNKNOWN_EXCHANGE));
            groups.entry(code).or_default().push(symbol);
        }

        Ok(Self { groups })
    }

    pub fn symbols(&self, code: &str) -> &[String] {
        self.groups.get(code).map(Vec::as_slice).unwrap_or_default()
    }

    /// Writes `info/exchanges/{code}` for every group whose file is absent.
    pub fn write(&self, cache: &CacheStore, report: &mut StageReport) {
        for (code, symbols) in &self.groups {
            let key = match ResourceKey::exchange_index(code) {
                Ok(key) => key,
                Err(error) => {
                    report.record_local_failure(code.as_str(), None, error.to_string());
                    continue;
                }
            };
            write_once(cache, &key, symbols.join("\n").as_bytes(), report);
        }
    }
}

/// Ordered, de-duplicated `symbol;companyName` entries.
pub fn search_entries(cache: &CacheStore, config: &IndexConfig) -> std::io::Result<Vec<String>> {
    let mut profiles = ProfileReader::new(cache);
    let mut entries = SearchEntries::default();

    let primary: Vec<&Exchange> = exchanges::by_region(config.primary_region).collect();
    let primary_symbols = symbols_on(cache, &primary);

    let mut ranked: Vec<(f64, &String)> = primary_symbols
        .iter()
        .filter(|symbol| {
            !decode_path_segment(symbol).ends_with(config.preferred_suffix.as_str())
        })
        .filter_map(|symbol| {
            profiles
                .get(symbol)
                .and_then(Profile::ranking_market_cap)
                .map(|cap| (cap, symbol))
        })
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    for (_, symbol) in ranked {
        entries.push(symbol, &mut profiles);
    }
    for symbol in &primary_symbols {
        entries.push(symbol, &mut profiles);
    }

    for market in [MarketType::Developed, MarketType::Developing] {
        let group: Vec<&Exchange> = exchanges::by_market(market).collect();
        for symbol in &symbols_on(cache, &group) {
            entries.push(symbol, &mut profiles);
        }
    }

    for symbol in &cache.list_dir(FUNDAMENTALS_DIR)? {
        entries.push(symbol, &mut profiles);
    }

    Ok(entries.lines)
}

/// Builds the exchange index, then the search index from it.
pub fn build_indexes(cache: &CacheStore, config: &IndexConfig) -> StageReport {
    let mut report = StageReport::new(Stage::Index);

    match ExchangeIndex::from_cache(cache) {
        Ok(index) => {
            report.units += index.groups.len();
            index.write(cache, &mut report);
            info!(exchanges = index.groups.len(), "exchange index built");
        }
        Err(error) => {
            report.record_local_failure("exchange-index", None, error.to_string());
            return report;
        }
    }

    report.units += 1;
    let key = ResourceKey::search_index();
    if cache.exists(&key) {
        info!(key = %key, "search index already present");
        return report;
    }
    match search_entries(cache, config) {
        Ok(lines) => {
            info!(entries = lines.len(), "search index built");
            write_once(cache, &key, lines.join("\n").as_bytes(), &mut report);
        }
        Err(error) => report.record_local_failure("search-index", Some(key), error.to_string()),
    }

    report
}

fn write_once(cache: &CacheStore, key: &ResourceKey, bytes: &[u8], report: &mut StageReport) {
    if cache.exists(key) {
        return;
    }
    match cache.write(key, bytes) {
        Ok(()) => report.written += 1,
        Err(error) => {
            report.record_local_failure(key.as_str(), Some(key.clone()), error.to_string())
        }
    }
}

/// Symbols listed in the index files of `group`, in catalog order.
fn symbols_on(cache: &CacheStore, group: &[&Exchange]) -> Vec<String> {
    let mut symbols = Vec::new();
    for exchange in group {
        let Ok(key) = ResourceKey::exchange_index(exchange.code) else {
            continue;
        };
        if !cache.exists(&key) {
            continue;
        }
        match cache.read(&key) {
            Ok(bytes) => symbols.extend(
                String::from_utf8_lossy(&bytes)
                    .split('\n')
                    .filter(|line| !line.is_empty())
                    .map(String::from),
            ),
            Err(error) => warn!(key = %key, "couldn't read exchange index: {error}"),
        }
    }
    symbols
}

#[derive(Default)]
struct SearchEntries {
    seen: HashSet<String>,
    lines: Vec<String>,
}

impl SearchEntries {
    fn push(&mut self, symbol_dir: &str, profiles: &mut ProfileReader<'_>) {
        if !self.seen.insert(symbol_dir.to_owned()) {
            return;
        }
        let name = profiles
            .get(symbol_dir)
            .and_then(|profile| profile.company_name.clone())
            .unwrap_or_default();
        self.lines.push(format!("{};{name}", decode_path_segment(symbol_dir)));
    }
}

/// Memoizing reader of cached profiles keyed by symbol directory.
struct ProfileReader<'a> {
    cache: &'a CacheStore,
    loaded: HashMap<String, Option<Profile>>,
}

impl<'a> ProfileReader<'a> {
    fn new(cache: &'a CacheStore) -> Self {
        Self {
            cache,
            loaded: HashMap::new(),
        }
    }

    fn get(&mut self, symbol_dir: &str) -> Option<&Profile> {
        if !self.loaded.contains_key(symbol_dir) {
            let profile = self.load(symbol_dir);
            self.loaded.insert(symbol_dir.to_owned(), profile);
        }
        self.loaded.get(symbol_dir).and_then(Option::as_ref)
    }

    fn load(&self, symbol_dir: &str) -> Option<Profile> {
        let key = ResourceKey::parse(&format!(
            "{FUNDAMENTALS_DIR}/{symbol_dir}/{}",
            FundamentalsEndpoint::Profile.file_name()
        ))
        .ok()?;
        if !self.cache.exists(&key) {
            return None;
        }

        let bytes = match self.cache.read(&key) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(key = %key, "couldn't read profile: {error}");
                return None;
            }
        };
        match Profile::from_payload(&bytes) {
            Ok(profile) => profile,
            Err(error) => {
                warn!(key = %key, "ignoring malformed profile: {error}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seed_profile(cache: &CacheStore, dir: &str, body: &str) {
        let key = ResourceKey::parse(&format!("fundamentals/{dir}/profile.json")).expect("key");
        cache.write(&key, body.as_bytes()).expect("seed");
    }

    #[test]
    fn malformed_or_empty_profile_falls_back_to_unknown() {
        let dir = tempdir().expect("tempdir");
        let cache = CacheStore::new(dir.path());
        seed_profile(&cache, "AAA", "not json");
        seed_profile(&cache, "BBB", "[]");
        seed_profile(&cache, "CCC", r#"[{"exchangeShortName":"LSE"}]"#);

        let index = ExchangeIndex::from_cache(&cache).expect("index");
        assert_eq!(index.symbols(UNKNOWN_EXCHANGE), ["AAA", "BBB"]);
        assert_eq!(index.symbols("LSE"), ["CCC"]);
    }

    #[test]
    fn existing_exchange_file_is_not_overwritten() {
        let dir = tempdir().expect("tempdir");
        let cache = CacheStore::new(dir.path());
        seed_profile(&cache, "AAPL", r#"[{"exchangeShortName":"NASDAQ"}]"#);
        let key = ResourceKey::exchange_index("NASDAQ").expect("key");
        cache.write(&key, b"MSFT").expect("seed");

        let report = build_indexes(&cache, &IndexConfig::default());

        assert_eq!(cache.read(&key).expect("read"), b"MSFT");
        assert!(!report.has_failures());
    }

    #[test]
    fn search_entries_decode_symbols_and_keep_empty_names() {
        let dir = tempdir().expect("tempdir");
        let cache = CacheStore::new(dir.path());
        seed_profile(&cache, "%5EGSPC", r#"[{"exchangeShortName":"INDEX"}]"#);

        let lines = search_entries(&cache, &IndexConfig::default()).expect("entries");
        assert_eq!(lines, vec!["^GSPC;"]);
    }

    #[test]
    fn search_entries_keep_reserved_characters_other_than_caret() {
        let dir = tempdir().expect("tempdir");
        let cache = CacheStore::new(dir.path());
        seed_profile(&cache, "M&M.NS", r#"[{"companyName":"Mahindra","exchangeShortName":"NSE"}]"#);
        seed_profile(&cache, "EURUSD=X", r#"[{"exchangeShortName":"CCY"}]"#);

        let lines = search_entries(&cache, &IndexConfig::default()).expect("entries");
        assert_eq!(lines, vec!["EURUSD=X;", "M&M.NS;Mahindra"]);
    }

    #[test]
    fn preferred_shares_are_not_ranked_by_market_cap() {
        let dir = tempdir().expect("tempdir");
        let cache = CacheStore::new(dir.path());
        seed_profile(
            &cache,
            "BAC-PL",
            r#"[{"companyName":"BofA Pref","exchangeShortName":"NYSE","mktCap":9e12}]"#,
        );
        seed_profile(
            &cache,
            "BAC",
            r#"[{"companyName":"BofA","exchangeShortName":"NYSE","mktCap":3e11}]"#,
        );
        build_indexes(&cache, &IndexConfig::default());

        let lines = search_entries(&cache, &IndexConfig::default()).expect("entries");
        assert_eq!(lines, vec!["BAC;BofA", "BAC-PL;BofA Pref"]);
    }
}
