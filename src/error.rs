// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::io;
use std::path::PathBuf;

/// Error conditions which may abort the conversion pipeline.
///
/// No variant is recoverable: all data is local and deterministic,
/// so retrying a failed stage cannot produce a different outcome.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An input file does not exist or can't be opened.
    #[error("source unavailable: {0}: {1}")]
    SourceUnavailable(PathBuf, #[source] io::Error),

    /// An input was read, but it doesn't have the expected shape.
    #[error("malformed source: {0}")]
    MalformedSource(String),

    /// A contract between two stages was broken. This signals a bug,
    /// not a problem with the input data.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn malformed<S: Into<String>>(reason: S) -> Self {
        Self::MalformedSource(reason.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        match e.classify() {
            serde_json::error::Category::Io => Error::Io(e.into()),
            _ => Error::MalformedSource(e.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        match e {
            quick_xml::Error::Io(io_err) => {
                Error::Io(io::Error::new(io_err.kind(), io_err.to_string()))
            }
            other => Error::MalformedSource(format!("xml: {other}")),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Error::MalformedSource(format!("xml attribute: {e}"))
    }
}
