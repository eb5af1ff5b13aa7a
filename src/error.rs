//! Rich diagnostic error types for the sockscan engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes and help text. Lookup failures are
//! recoverable by policy: the expander records them and keeps going, so
//! `LookupError` values also travel inside reports, not just up call stacks.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the sockscan engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum SockError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Lookup errors
// ---------------------------------------------------------------------------

/// A failure talking to one of the external directory endpoints.
///
/// One failed lookup never aborts a correlation run; the expander treats the
/// failed item as "no data" and records the error in its report.
#[derive(Debug, Error, Diagnostic)]
pub enum LookupError {
    #[error("HTTP status {status} fetching {url}")]
    #[diagnostic(
        code(sockscan::lookup::status),
        help(
            "The directory endpoint answered with a non-success status. \
             The item is treated as having no data; check the base URL \
             if every lookup fails this way."
        )
    )]
    Status { status: u16, url: String },

    #[error("transport error fetching {url}: {message}")]
    #[diagnostic(
        code(sockscan::lookup::transport),
        help(
            "The request did not complete (DNS, connect, or timeout). \
             Check network reachability and the configured timeout."
        )
    )]
    Transport { url: String, message: String },

    #[error("failed to read response body from {url}: {message}")]
    #[diagnostic(
        code(sockscan::lookup::body),
        help("The response body could not be read or decoded.")
    )]
    Body { url: String, message: String },
}

// ---------------------------------------------------------------------------
// Clustering errors
// ---------------------------------------------------------------------------

/// Internal clustering failure.
///
/// Never escapes the strategy boundary: `perform_hac` catches it and degrades
/// to an empty grouping.
#[derive(Debug, Error, Diagnostic)]
pub enum ClusterError {
    #[error("distance matrix is {actual}x{actual} but {expected} identifiers were supplied")]
    #[diagnostic(
        code(sockscan::cluster::shape_mismatch),
        help(
            "The matrix must be square with one row per identifier, in the \
             same order the identifiers were handed to the metric provider."
        )
    )]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("labels length {labels} does not match identifier count {ids}")]
    #[diagnostic(
        code(sockscan::cluster::label_mismatch),
        help("Cluster formatting requires one label per identifier.")
    )]
    LabelMismatch { ids: usize, labels: usize },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(sockscan::engine::invalid_config),
        help("Check the EngineConfig fields. {message}")
    )]
    InvalidConfig { message: String },

    #[error("seed thread {key} could not be fetched")]
    #[diagnostic(
        code(sockscan::engine::seed_unavailable),
        help(
            "The seed thread's ID list is the starting point of a run; \
             without it there is nothing to correlate. Verify the thread \
             key and the dat base URL."
        )
    )]
    SeedUnavailable {
        key: String,
        #[source]
        source: LookupError,
    },
}

/// Convenience alias for functions returning sockscan results.
pub type SockResult<T> = std::result::Result<T, SockError>;
