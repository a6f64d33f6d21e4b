//! Error type for cube access.
//!
//! Name validation errors (`UnknownDimension`, `UnknownElement`,
//! `MissingCoordinate`, `EmptySelection`) are raised locally, before any
//! request leaves the process.

use std::io;

use thiserror::Error;

use crate::transport::TransportError;

/// Result type for cube operations.
pub type CubeResult<T> = Result<T, CubeError>;

/// Errors raised by the resolver, area builder, export cursor and batch cache.
#[derive(Error, Debug)]
pub enum CubeError {
    /// Referenced a dimension the cube does not have.
    #[error("unknown dimension '{dimension}' in cube '{cube}'")]
    UnknownDimension { cube: String, dimension: String },

    /// Referenced an element (by name or id) the dimension does not have.
    #[error("unknown element '{element}' in dimension '{dimension}'")]
    UnknownElement { dimension: String, element: String },

    /// A coordinate did not name an element for every cube dimension.
    #[error("missing coordinate for dimension '{0}'")]
    MissingCoordinate(String),

    /// An area selection resolved to no elements at all.
    #[error("selection for dimension '{0}' is empty")]
    EmptySelection(String),

    /// The trailing `<emitted>;<total>` line of an export page was missing
    /// or unparsable.
    #[error("malformed export progress line: {0}")]
    MalformedProgress(String),

    /// The server answered with something the protocol does not allow.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The request channel failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Local IO failure (spool file, output stream).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Failed to read or write CSV.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to serialize coordinates for hashing.
    #[error("failed to hash coordinates: {0}")]
    Hash(#[from] serde_json::Error),
}

impl CubeError {
    pub(crate) fn unknown_element(dimension: &str, element: impl ToString) -> Self {
        Self::UnknownElement {
            dimension: dimension.to_string(),
            element: element.to_string(),
        }
    }

    pub(crate) fn unknown_dimension(cube: &str, dimension: &str) -> Self {
        Self::UnknownDimension {
            cube: cube.to_string(),
            dimension: dimension.to_string(),
        }
    }

    /// Check if this error was raised by local validation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownDimension { .. }
                | Self::UnknownElement { .. }
                | Self::MissingCoordinate(_)
                | Self::EmptySelection(_)
        )
    }
}
