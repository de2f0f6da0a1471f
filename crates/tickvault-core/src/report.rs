//! Serializable run summaries.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::error;

use crate::domain::ResourceKey;
use crate::fetcher::{FetchError, FetchSource, Fetched};

/// Pipeline stage a [`StageReport`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Universe,
    Fundamentals,
    Macro,
    Fx,
    Index,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Universe => "universe",
            Self::Fundamentals => "fundamentals",
            Self::Macro => "macro",
            Self::Fx => "fx",
            Self::Index => "index",
        }
    }
}

/// One isolated unit of work that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<ResourceKey>,
    pub message: String,
}

/// Counters and failures of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub units: usize,
    pub cached: usize,
    pub fetched: usize,
    pub written: usize,
    /// Named item counts, e.g. symbols per resolved list.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub counts: BTreeMap<&'static str, usize>,
    pub failures: Vec<UnitFailure>,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            units: 0,
            cached: 0,
            fetched: 0,
            written: 0,
            counts: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    pub fn record_fetch(&mut self, fetched: &Fetched) {
        match fetched.source {
            FetchSource::Cache => self.cached += 1,
            FetchSource::Network => self.fetched += 1,
        }
    }

    /// Logs and records a failed unit; the stage keeps going.
    pub fn record_failure(&mut self, unit: impl Into<String>, error: &FetchError) {
        let unit = unit.into();
        error!(stage = self.stage.as_str(), unit = %unit, "unit failed: {error}");
        self.failures.push(UnitFailure {
            unit,
            key: error.key().cloned(),
            message: error.to_string(),
        });
    }

    /// Failure not tied to a fetch, e.g. an unreadable cached payload.
    pub fn record_local_failure(
        &mut self,
        unit: impl Into<String>,
        key: Option<ResourceKey>,
        message: impl Into<String>,
    ) {
        let unit = unit.into();
        let message = message.into();
        error!(stage = self.stage.as_str(), unit = %unit, "unit failed: {message}");
        self.failures.push(UnitFailure { unit, key, message });
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Summary of a pipeline invocation, one entry per executed stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RunReport {
    pub stages: Vec<StageReport>,
}

impl RunReport {
    pub fn push(&mut self, stage: StageReport) {
        self.stages.push(stage);
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|report| report.stage == stage)
    }

    pub fn failure_count(&self) -> usize {
        self.stages.iter().map(|stage| stage.failures.len()).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.stages.iter().any(StageReport::has_failures)
    }

    /// Network requests that produced a cached blob.
    pub fn fetched(&self) -> usize {
        self.stages.iter().map(|stage| stage.fetched).sum()
    }
}
