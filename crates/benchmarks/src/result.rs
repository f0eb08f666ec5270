//! Benchmark record types.
//!
//! Records arrive from benchstat as loosely-typed JSON objects and leave as
//! Codespeed result entries. Only `mean`, `config`, and `units` are
//! interpreted; every other key passes through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{BenchmarkError, Result};

/// A single benchmark record, kept as a raw JSON object.
pub type Record = Map<String, Value>;

/// Branch recorded when none is given.
pub const DEFAULT_BRANCH: &str = "default";

/// Environment recorded when none is given.
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Axis label the results service shows for a measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitsTitle {
    /// Wall time per operation (`ns/op` and anything unrecognised).
    #[default]
    Time,
    /// Allocation count (`allocs/op`).
    Allocations,
    /// Bytes allocated (`B/op`).
    Memory,
}

impl UnitsTitle {
    /// Classify a benchstat unit string.
    ///
    /// Returns `None` for units that should keep the run's default title.
    pub fn from_units(units: &str) -> Option<Self> {
        if units.starts_with("allocs") {
            Some(Self::Allocations)
        } else if units.starts_with("B/") {
            Some(Self::Memory)
        } else {
            None
        }
    }

    /// The label as the results service expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Time => "Time",
            Self::Allocations => "Allocations",
            Self::Memory => "Memory",
        }
    }
}

impl fmt::Display for UnitsTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run metadata merged into every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Commit identifier the results were measured at.
    pub commitid: String,
    /// Project name on the results service.
    pub project: String,
    /// Branch name.
    pub branch: String,
    /// Environment (machine) name.
    pub environment: String,
    /// Default axis label, overridden per record by its units.
    pub units_title: UnitsTitle,
}

impl RunMetadata {
    /// Create metadata for a run with default branch and environment.
    pub fn new(project: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            commitid: revision.into(),
            project: project.into(),
            branch: DEFAULT_BRANCH.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            units_title: UnitsTitle::default(),
        }
    }

    /// Set the branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Set the environment.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Merge the metadata into `record`, overwriting same-named keys.
    pub fn apply(&self, record: &mut Record) -> Result<()> {
        if let Value::Object(fields) = serde_json::to_value(self).map_err(BenchmarkError::Encode)? {
            record.extend(fields);
        }
        Ok(())
    }
}

/// Final `/`-separated segment of a benchmark config path.
///
/// A trailing slash yields an empty name.
pub fn executable_name(config: &str) -> &str {
    config.rsplit('/').next().unwrap_or(config)
}

/// Convert one benchstat record into a results-service entry.
///
/// `index` is the record's position in the batch and is only used for errors.
pub fn transform_record(mut record: Record, meta: &RunMetadata, index: usize) -> Result<Record> {
    meta.apply(&mut record)?;

    let mean = record
        .remove("mean")
        .ok_or(BenchmarkError::MissingKey { index, key: "mean" })?;
    record.insert("result_value".into(), mean);

    let executable = match record.remove("config") {
        Some(Value::String(config)) => executable_name(&config).to_string(),
        Some(_) => return Err(BenchmarkError::InvalidKey { index, key: "config" }),
        None => return Err(BenchmarkError::MissingKey { index, key: "config" }),
    };
    record.insert("executable".into(), executable.into());

    let title = match record.get("units") {
        Some(Value::String(units)) => UnitsTitle::from_units(units),
        Some(_) => return Err(BenchmarkError::InvalidKey { index, key: "units" }),
        None => return Err(BenchmarkError::MissingKey { index, key: "units" }),
    };
    if let Some(title) = title {
        record.insert("units_title".into(), title.as_str().into());
    }

    Ok(record)
}

/// Transform a parsed batch, preserving order.
///
/// The first bad record fails the whole batch.
pub fn transform_records(values: Vec<Value>, meta: &RunMetadata) -> Result<Vec<Record>> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(record) => transform_record(record, meta, index),
            _ => Err(BenchmarkError::InvalidRecord { index }),
        })
        .collect()
}
