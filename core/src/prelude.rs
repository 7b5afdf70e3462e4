use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Kind of raw data a pipeline run extracts segments from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RawDataType {
    Table,
    Sound,
}

impl RawDataType {
    /// Parses the `rawdata_type` option value.
    pub fn parse(value: &str) -> PipelineResult<Self> {
        match value {
            "table" => Ok(Self::Table),
            "sound" => Ok(Self::Sound),
            other => Err(PipelineError::InvalidConfig(format!(
                "rawdata_type is not valid: {other} (expected `table` or `sound`)"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Sound => "sound",
        }
    }
}

impl fmt::Display for RawDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-disk format of a raw data file, taken from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Wav,
}

impl SourceFormat {
    /// Detects the format from a file name; `.gz` is tolerated and case is ignored.
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        let stem = name.strip_suffix(".gz").unwrap_or(&name);
        if stem.ends_with(".wav") {
            Some(Self::Wav)
        } else if stem.ends_with(".csv") {
            Some(Self::Csv)
        } else {
            None
        }
    }
}

/// Error taxonomy shared by every pipeline stage.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("permission denied ({reason}): {}", path.display())]
    PermissionDenied { path: PathBuf, reason: &'static str },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error(
        "cannot infer rawdata type for {}: set rawdata_type, type_weight, or one of data_index/sampling_rate/window_length",
        .0.display()
    )]
    AmbiguousType(PathBuf),
    #[error("rawdata type is not recognized: {}", .0.display())]
    UnrecognizedType(PathBuf),
    #[error("missing precondition: {0}")]
    MissingPrecondition(String),
    #[error("{tool} command failed ({status}){}", log_hint(.log))]
    ExternalToolFailure {
        tool: String,
        status: String,
        log: Option<PathBuf>,
    },
    #[error("malformed output: {0}")]
    MalformedOutput(String),
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn log_hint(log: &Option<PathBuf>) -> String {
    match log {
        Some(path) => format!("; see {}", path.display()),
        None => String::new(),
    }
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
