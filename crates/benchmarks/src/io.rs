//! Input loading and payload encoding.
//!
//! Benchstat output is read either from a named file or from standard
//! input. Both paths go through [`read_records`], so identical bytes always
//! produce identical records.

use crate::error::{BenchmarkError, Result};
use crate::result::Record;
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Where the benchstat JSON comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A JSON file on disk.
    File(PathBuf),
    /// The process's standard input.
    Stdin,
}

impl InputSource {
    /// Pick the source from an optional path argument.
    pub fn from_arg(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Stdin, Self::File)
    }

    /// Read and parse the full input.
    pub fn load(&self) -> Result<Vec<Value>> {
        match self {
            Self::File(path) => read_records_file(path),
            Self::Stdin => read_records(io::stdin().lock()),
        }
    }
}

impl std::fmt::Display for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stdin => f.write_str("<stdin>"),
        }
    }
}

/// Parse a JSON array of records from any reader.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_reader(reader).map_err(BenchmarkError::Parse)?;
    match value {
        Value::Array(records) => Ok(records),
        other => Err(BenchmarkError::NotAnArray {
            found: json_kind(&other),
        }),
    }
}

/// Read records from a JSON file.
pub fn read_records_file(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| BenchmarkError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_records(BufReader::new(file))
}

/// Serialize the transformed batch into the string sent as the `json` field.
pub fn encode_payload(records: &[Record]) -> Result<String> {
    serde_json::to_string(records).map_err(BenchmarkError::Encode)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
