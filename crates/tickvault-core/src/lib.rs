//! # Tickvault Core
//!
//! Batch acquisition and local caching of financial data.
//!
//! ## Overview
//!
//! This crate populates an on-disk dataset of flat JSON and text files from a
//! remote fundamentals API and a remote FX API, then derives two lookup
//! indexes from what was cached:
//!
//! - **Rate limiting** of every outbound request
//! - **Idempotent caching**: a key present on disk is never fetched again
//! - **Bounded retries** with the provider's in-band error marker detected
//! - **Per-unit failure isolation** across thousands of symbols
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Resource-key addressed file store |
//! | [`domain`] | Symbols, resource keys, profiles, currency codes |
//! | [`endpoint`] | Typed remote requests and their cache keys |
//! | [`error`] | Core error types |
//! | [`exchanges`] | Exchange catalog by region and market type |
//! | [`fetcher`] | Cache-first retrying fetcher |
//! | [`fundamentals`] | Eight fundamentals files per symbol |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`index`] | Exchange and search index builders |
//! | [`macro_fx`] | Macro indicators, reference series, FX rates |
//! | [`pipeline`] | Configuration and stage sequencing |
//! | [`report`] | Serializable run summaries |
//! | [`retry`] | Retry policy |
//! | [`throttling`] | Rate limiting |
//! | [`universe`] | Symbol list resolution |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tickvault_core::{Pipeline, PipelineConfig, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig {
//!         api_key: std::env::var("TICKVAULT_API_KEY").ok(),
//!         ..PipelineConfig::default()
//!     };
//!     let pipeline = Pipeline::new(config, Arc::new(ReqwestHttpClient::new()))?;
//!
//!     let today = time::OffsetDateTime::now_utc().date();
//!     let report = pipeline.run(today).await;
//!     println!("{} failed units", report.failure_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Universe    │──▶│ Fundamentals │──▶│  Macro / FX  │──▶│   Indexes    │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        └──────────────────┼──────────────────┘                  │
//!                           ▼                                     │
//!                  ┌──────────────────┐     ┌──────────────────┐  │
//!                  │     Fetcher      │────▶│ Throttling Queue │  │
//!                  └────────┬─────────┘     └──────────────────┘  │
//!                           ▼                                     ▼
//!                  ┌──────────────────┐     ┌──────────────────────────────┐
//!                  │   HTTP Client    │     │         Cache Store          │
//!                  └──────────────────┘     └──────────────────────────────┘
//! ```
//!
//! ## Security
//!
//! - API keys are never logged; request URLs are logged with credentials redacted
//! - Resource keys are validated so cached files stay below the data directory

pub mod cache;
pub mod domain;
pub mod endpoint;
pub mod error;
pub mod exchanges;
pub mod fetcher;
pub mod fundamentals;
pub mod http_client;
pub mod index;
pub mod macro_fx;
pub mod pipeline;
pub mod report;
pub mod retry;
pub mod throttling;
pub mod universe;

// Caching
pub use cache::{CacheError, CacheStore};

// Domain models
pub use domain::{ConstituentEntry, CurrencyCode, FxCatalog, Profile, ResourceKey, Symbol};

// Endpoints
pub use endpoint::{FetchJob, FundamentalsEndpoint, Provider, Query, RemoteRequest, SymbolList};

// Error types
pub use error::{CoreError, ValidationError};

// Fetching
pub use fetcher::{FetchError, FetchOutcome, FetchSource, Fetched, Fetcher, FetcherConfig};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, ScriptedHttpClient,
};

// Indexes
pub use exchanges::{Exchange, MarketType, Region};
pub use index::{ExchangeIndex, IndexConfig};

// Pipeline
pub use pipeline::{Pipeline, PipelineConfig};
pub use report::{RunReport, Stage, StageReport, UnitFailure};
pub use universe::SymbolUniverse;

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Throttling
pub use throttling::ThrottlingQueue;
