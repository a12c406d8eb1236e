use thiserror::Error;

/// Errors raised by the analytics core.
///
/// Only structurally invalid requests land here. Missing timestamps, wallets
/// absent from the balance snapshot and misaligned draws are handled in-line
/// and never surface as errors.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Bucket count must be at least 1")]
    ZeroBuckets,

    #[error("Invalid time range: end {end} precedes start {start}")]
    InvertedRange { start: i64, end: i64 },

    #[error("Custom bucket boundaries must not be empty")]
    EmptyBoundaries,

    #[error("Custom bucket boundaries must be non-decreasing: {previous} followed by {next}")]
    DecreasingBoundaries { previous: i64, next: i64 },

    #[error("Dataset for {0} has no timestamped events")]
    NoTimestampedEvents(String),

    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    #[error("Malformed dataset: {0}")]
    Malformed(#[from] serde_json::Error),
}
