//! Error types for the import pipeline

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Problems with the run configuration, detected before any row is read
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    #[error("invalid database URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported database URL scheme '{0}' (expected mysql://)")]
    UnsupportedScheme(String),

    #[error("database URL is missing the {0}")]
    MissingComponent(&'static str),

    #[error("database URL {component} is not valid UTF-8 after decoding")]
    InvalidEncoding { component: &'static str },

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("configuration error: column name for '{0}' is empty")]
    EmptyColumnName(&'static str),
}

/// Failures raised by a catalog store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open spreadsheet {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("failed to read sheet '{sheet}': {source}")]
    ReadSheet {
        sheet: String,
        #[source]
        source: calamine::Error,
    },

    #[error("workbook {} has no sheets", .0.display())]
    NoSheets(PathBuf),

    #[error("sheet '{name}' not found (available: {})", available.join(", "))]
    SheetNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}: invalid price '{value}' in column '{column}'")]
    InvalidPrice {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: {source}")]
    RowStore {
        row: usize,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("checkpoint {} belongs to {found}, not {expected}", path.display())]
    CheckpointMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("checkpoint {}: {source}", path.display())]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checkpoint {} is corrupt: {source}", path.display())]
    CheckpointFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to create {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
