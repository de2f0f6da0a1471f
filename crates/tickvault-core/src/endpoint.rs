//! Typed remote endpoints.
//!
//! Each endpoint kind builds its own [`Query`] through a dedicated
//! constructor, so a malformed parameter set cannot be expressed. A
//! [`FetchJob`] pairs the remote request with the [`ResourceKey`] its
//! response is cached under.

use std::fmt::{Display, Formatter};

use serde::Serialize;
use time::macros::format_description;
use time::{Date, Month};

use crate::domain::{CurrencyCode, ResourceKey, Symbol};
use crate::CoreError;

/// Quarterly statements are requested with a 100-year lookback.
pub const QUARTERLY_LOOKBACK: u32 = 100 * 4;

/// Remote service a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Fundamentals, prices, symbol lists and macro series.
    Fundamentals,
    /// Currency catalog and FX time series.
    Fx,
}

impl Provider {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fundamentals => "fundamentals",
            Self::Fx => "fx",
        }
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered query parameters of one endpoint kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(&'static str, String)>,
}

impl Query {
    pub fn none() -> Self {
        Self::default()
    }

    /// `period=quarter&limit={limit}`
    pub fn quarterly(limit: u32) -> Self {
        Self::none().with("period", "quarter").with("limit", limit.to_string())
    }

    /// `limit={limit}`
    pub fn limit(limit: u32) -> Self {
        Self::none().with("limit", limit.to_string())
    }

    /// `serietype=line`: full daily close series.
    pub fn line_series() -> Self {
        Self::none().with("serietype", "line")
    }

    /// `from={from}&to={to}`
    pub fn date_range(from: Date, to: Date) -> Result<Self, time::error::Format> {
        Ok(Self::none()
            .with("from", iso_date(from)?)
            .with("to", iso_date(to)?))
    }

    /// `name={indicator}&from={from}&to={to}`
    pub fn economic(indicator: &str, from: Date, to: Date) -> Result<Self, time::error::Format> {
        Ok(Self::none()
            .with("name", indicator)
            .with("from", iso_date(from)?)
            .with("to", iso_date(to)?))
    }

    /// `start_date={start}&end_date={end}&base={base}`
    pub fn fx_timeseries(
        start: Date,
        end: Date,
        base: &CurrencyCode,
    ) -> Result<Self, time::error::Format> {
        Ok(Self::none()
            .with("start_date", iso_date(start)?)
            .with("end_date", iso_date(end)?)
            .with("base", base.as_str()))
    }

    fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.params.push((name, value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// `k=v` pairs joined by `&`, values percent-encoded.
    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Provider-relative endpoint path plus its query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    pub provider: Provider,
    pub path: String,
    pub query: Query,
}

impl RemoteRequest {
    pub fn fundamentals(path: impl Into<String>, query: Query) -> Self {
        Self {
            provider: Provider::Fundamentals,
            path: path.into(),
            query,
        }
    }

    pub fn fx(path: impl Into<String>, query: Query) -> Self {
        Self {
            provider: Provider::Fx,
            path: path.into(),
            query,
        }
    }
}

/// One cacheable unit: where the response is stored and how to fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    pub key: ResourceKey,
    pub request: RemoteRequest,
}

impl FetchJob {
    pub fn new(key: ResourceKey, request: RemoteRequest) -> Self {
        Self { key, request }
    }
}

/// The eight per-symbol fundamentals files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FundamentalsEndpoint {
    IncomeStatement,
    BalanceSheet,
    CashFlow,
    Ratios,
    EnterpriseValues,
    KeyMetrics,
    HistoricalPrice,
    Profile,
}

impl FundamentalsEndpoint {
    /// Fetch order for a symbol.
    pub const ALL: [Self; 8] = [
        Self::IncomeStatement,
        Self::BalanceSheet,
        Self::CashFlow,
        Self::Ratios,
        Self::EnterpriseValues,
        Self::KeyMetrics,
        Self::HistoricalPrice,
        Self::Profile,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::IncomeStatement => "income-statement",
            Self::BalanceSheet => "balance-sheet",
            Self::CashFlow => "cash-flow",
            Self::Ratios => "ratios",
            Self::EnterpriseValues => "enterprise-values",
            Self::KeyMetrics => "key-metrics",
            Self::HistoricalPrice => "historical-price",
            Self::Profile => "profile",
        }
    }

    const fn api_segment(self) -> &'static str {
        match self {
            Self::IncomeStatement => "income-statement",
            Self::BalanceSheet => "balance-sheet-statement",
            Self::CashFlow => "cash-flow-statement",
            Self::Ratios => "ratios",
            Self::EnterpriseValues => "enterprise-values",
            Self::KeyMetrics => "key-metrics",
            Self::HistoricalPrice => "historical-price-full",
            Self::Profile => "profile",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.json", self.name())
    }

    fn query(self) -> Query {
        match self {
            Self::HistoricalPrice => Query::line_series(),
            Self::Profile => Query::none(),
            _ => Query::quarterly(QUARTERLY_LOOKBACK),
        }
    }

    pub fn job(self, symbol: &Symbol) -> FetchJob {
        FetchJob::new(
            ResourceKey::fundamentals(symbol, &self.file_name()),
            RemoteRequest::fundamentals(
                format!("/v3/{}/{}", self.api_segment(), symbol.path_segment()),
                self.query(),
            ),
        )
    }
}

/// The four symbol-bearing lists the universe is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolList {
    /// Every symbol with financial statements (plain string array).
    FullCoverage,
    Sp500,
    Nasdaq,
    DowJones,
}

impl SymbolList {
    pub const ALL: [Self; 4] = [Self::FullCoverage, Self::Sp500, Self::Nasdaq, Self::DowJones];

    pub const fn name(self) -> &'static str {
        match self {
            Self::FullCoverage => "financial-statement-symbol-lists",
            Self::Sp500 => "sp500_constituent",
            Self::Nasdaq => "nasdaq_constituent",
            Self::DowJones => "dowjones_constituent",
        }
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::FullCoverage => "financial-statement-symbol-lists.json",
            Self::Sp500 => "sp500_constituent.json",
            Self::Nasdaq => "nasdaq_constituent.json",
            Self::DowJones => "dowjones_constituent.json",
        }
    }

    /// Constituent lists carry full records; the coverage list is bare tickers.
    pub const fn is_constituent_list(self) -> bool {
        !matches!(self, Self::FullCoverage)
    }

    pub fn job(self) -> FetchJob {
        let query = if self.is_constituent_list() {
            Query::limit(QUARTERLY_LOOKBACK)
        } else {
            Query::none()
        };

        FetchJob::new(
            ResourceKey::info_static(self.file_name()),
            RemoteRequest::fundamentals(format!("/v3/{}", self.name()), query),
        )
    }
}

/// FX currency catalog job.
pub fn fx_catalog_job() -> FetchJob {
    FetchJob::new(ResourceKey::fx_catalog(), RemoteRequest::fx("/symbols", Query::none()))
}

/// FX time-series job covering calendar `year` (Jan 1 through Dec 31).
pub fn fx_chunk_job(currency: &CurrencyCode, year: i32) -> Result<FetchJob, CoreError> {
    let start = Date::from_calendar_date(year, Month::January, 1)?;
    let end = Date::from_calendar_date(year, Month::December, 31)?;

    Ok(FetchJob::new(
        ResourceKey::fx_chunk(currency, year),
        RemoteRequest::fx("/timeseries", Query::fx_timeseries(start, end, currency)?),
    ))
}

/// `YYYY-MM-DD`, years zero-padded to four digits.
pub fn iso_date(date: Date) -> Result<String, time::error::Format> {
    date.format(format_description!("[year]-[month]-[day]"))
}
