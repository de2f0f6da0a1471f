//! End-to-end wiring: configuration, shared fetcher and stage sequencing.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use time::Date;
use tracing::info;

use crate::cache::CacheStore;
use crate::domain::Symbol;
use crate::fetcher::{Fetcher, FetcherConfig, DEFAULT_FUNDAMENTALS_BASE_URL, DEFAULT_FX_BASE_URL};
use crate::http_client::HttpClient;
use crate::index::{self, IndexConfig};
use crate::macro_fx::{self, DEFAULT_FX_START_YEAR, MIN_FX_START_YEAR};
use crate::report::{RunReport, StageReport};
use crate::retry::RetryConfig;
use crate::throttling::ThrottlingQueue;
use crate::universe::{self, SymbolUniverse};
use crate::{fundamentals, ValidationError};

pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 250;
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Everything a run needs; no global state.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub api_key: Option<String>,
    pub fx_access_key: Option<String>,
    pub fundamentals_base_url: String,
    pub fx_base_url: String,
    pub rate_limit_per_minute: u32,
    pub retry: RetryConfig,
    pub request_timeout: Duration,
    pub workers: usize,
    pub fx_start_year: i32,
    pub index: IndexConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            api_key: None,
            fx_access_key: None,
            fundamentals_base_url: String::from(DEFAULT_FUNDAMENTALS_BASE_URL),
            fx_base_url: String::from(DEFAULT_FX_BASE_URL),
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(30),
            workers: 1,
            fx_start_year: DEFAULT_FX_START_YEAR,
            index: IndexConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.rate_limit_per_minute == 0 {
            return Err(ValidationError::ZeroConfigValue {
                field: "rate_limit_per_minute",
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(ValidationError::ZeroConfigValue {
                field: "max_attempts",
            });
        }
        if self.workers == 0 {
            return Err(ValidationError::ZeroConfigValue { field: "workers" });
        }
        if self.request_timeout.is_zero() {
            return Err(ValidationError::ZeroConfigValue {
                field: "request_timeout",
            });
        }
        if self.fx_start_year < MIN_FX_START_YEAR {
            return Err(ValidationError::FxStartYearTooEarly {
                year: self.fx_start_year,
                min: MIN_FX_START_YEAR,
            });
        }
        Ok(())
    }

    fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            fundamentals_base_url: self.fundamentals_base_url.clone(),
            fx_base_url: self.fx_base_url.clone(),
            api_key: self.api_key.clone(),
            fx_access_key: self.fx_access_key.clone(),
            request_timeout: self.request_timeout,
            retry: self.retry.clone(),
        }
    }
}

/// Shared fetcher plus the stages built on it.
pub struct Pipeline {
    config: PipelineConfig,
    fetcher: Fetcher,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        let fetcher = Fetcher::new(
            http_client,
            CacheStore::new(config.data_dir.clone()),
            ThrottlingQueue::per_minute(config.rate_limit_per_minute),
            config.fetcher_config(),
        );
        Ok(Self { config, fetcher })
    }

    pub fn cache(&self) -> &CacheStore {
        self.fetcher.cache()
    }

    /// Universe → fundamentals → macro → FX → indexes.
    pub async fn run(&self, today: Date) -> RunReport {
        let mut report = RunReport::default();

        let (universe, universe_report) = self.resolve_universe().await;
        report.push(universe_report);
        report.push(self.fundamentals(universe.work_order()).await);
        report.push(self.macro_series(today).await);
        report.push(self.fx(today).await);
        report.push(self.indexes());

        info!(
            fetched = report.fetched(),
            failures = report.failure_count(),
            "pipeline finished"
        );
        report
    }

    pub async fn resolve_universe(&self) -> (SymbolUniverse, StageReport) {
        universe::resolve(&self.fetcher).await
    }

    pub async fn fundamentals(&self, symbols: Vec<Symbol>) -> StageReport {
        info!(symbols = symbols.len(), workers = self.config.workers, "fetching fundamentals");
        fundamentals::fetch_all(&self.fetcher, symbols, self.config.workers).await
    }

    pub async fn macro_series(&self, today: Date) -> StageReport {
        macro_fx::fetch_macro(&self.fetcher, today).await
    }

    pub async fn fx(&self, today: Date) -> StageReport {
        macro_fx::fetch_fx(&self.fetcher, self.config.fx_start_year, today).await
    }

    pub fn indexes(&self) -> StageReport {
        index::build_indexes(self.cache(), &self.config.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();

        assert_eq!(config.rate_limit_per_minute, 250);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.workers, 1);
        assert_eq!(config.fx_start_year, 2000);
        assert_eq!(config.index.preferred_suffix, "-PL");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_values_are_rejected() {
        let config = PipelineConfig {
            workers: 0,
            ..PipelineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::ZeroConfigValue { field: "workers" })
        );

        let config = PipelineConfig {
            retry: RetryConfig::fixed(Duration::ZERO, 0),
            ..PipelineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::ZeroConfigValue {
                field: "max_attempts"
            })
        );
    }

    #[test]
    fn fx_start_year_before_floor_is_rejected() {
        let config = PipelineConfig {
            fx_start_year: -2_000_000_000,
            ..PipelineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::FxStartYearTooEarly {
                year: -2_000_000_000,
                min: 1999
            })
        );

        let config = PipelineConfig {
            fx_start_year: 1999,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
