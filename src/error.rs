use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum LoaderError {
    #[error("record is missing required annotation: {field}")]
    #[diagnostic(help(
        "genome records need gi, sequence_version, taxonomy, organism and a source feature"
    ))]
    MissingField { field: &'static str },

    #[error("cannot read input file {path}: {message}")]
    FileAccess { path: PathBuf, message: String },

    #[error("failed to decode GenBank record: {0}")]
    RecordParse(String),

    #[error("genome {0} is already stored")]
    DuplicateGenome(i64),

    #[error("store error: {0}")]
    Store(String),

    #[error("missing config file gbloader.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),
}

impl LoaderError {
    pub fn missing(field: &'static str) -> Self {
        LoaderError::MissingField { field }
    }
}
