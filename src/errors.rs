//! Error taxonomy for snapshot resolution and ASN lookups
//!
//! Validation errors (`InvalidInput`, `UnsupportedProvider`) surface before any
//! network or engine activity. `SnapshotNotFound` surfaces only after the full
//! backward search window is exhausted. A per-IP "not found" is not an error;
//! it is the ASN value `0`.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors produced by snapshot resolution, provider setup, and batch lookups.
#[derive(Debug, Error)]
pub enum LookupError {
    /// No usable snapshot exists within the backward search window.
    #[error("no RouteViews snapshot found within {months} months of {date}")]
    SnapshotNotFound { date: NaiveDate, months: u32 },

    /// The provider identifier does not map to a known provider.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// The underlying lookup engine could not be brought up. Not retryable.
    #[error("lookup engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Invalid run configuration or input data, caught before any lookups.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
