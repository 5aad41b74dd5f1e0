//! Errors that can be thrown when processing configuration.

use std::path::PathBuf;

/// The errors that can be thrown when reading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ParseConfigurationError {
    #[error("parse error on {file_path}:{line}:{column}: {message}")]
    ParseError {
        file_path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("no configuration file found in {0}")]
    NoConfigurationFile(PathBuf),
    #[error("I/O error: {0}")]
    IoErrorButStringified(String),
}

/// The errors that can be thrown when writing a configuration to disk.
#[derive(Debug, thiserror::Error)]
pub enum WriteParsedConfigurationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A configuration that parses but cannot describe an export.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidConfigurationError {
    #[error("unsupported configuration version {0}")]
    UnsupportedVersion(u32),
    #[error("merge '{0}' lists no column")]
    MergeWithoutColumns(String),
    #[error("merge of {} has no output name", .0.join(", "))]
    MergeWithoutName(Vec<String>),
    #[error("column '{0}' cannot be renamed to an empty name")]
    EmptyRename(String),
    #[error("the {0} filename is empty")]
    EmptyFilename(&'static str),
}
