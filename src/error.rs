use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PhotoError {
    #[error("{what} doesn't exist: {path}")]
    MissingPath { what: &'static str, path: PathBuf },

    #[error("the event does not exist: {0}")]
    #[diagnostic(help("the input path must contain one of the configured event keys"))]
    UnknownEvent(String),

    #[error("invalid bib: {0}")]
    InvalidBib(String),

    #[error("invalid range bound: {0}")]
    InvalidRange(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid cache file {path}: {message}")]
    CacheFormat { path: PathBuf, message: String },

    #[error("invalid roster file {path}: {message}")]
    RosterFormat { path: PathBuf, message: String },

    #[error("missing column `{column}` in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("listing request failed: {0}")]
    ListingHttp(String),

    #[error("listing returned status {status}: {url}")]
    ListingStatus { status: u16, url: String },

    #[error("malformed photo anchor: {0}")]
    ListingParse(String),

    #[error("download facility failed: {0}")]
    DownloadHttp(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
