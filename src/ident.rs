//! Core identifier types for the sockscan engine.
//!
//! A [`PosterId`] is the opaque per-thread token an anonymous board assigns
//! to a poster; a [`ThreadKey`] names one thread. Neither carries any
//! cross-thread identity on its own — inferring that identity is the whole
//! point of the engine. [`PostHistory`] is the discriminated result of a
//! posting-history lookup.

use serde::{Deserialize, Serialize};

/// Opaque poster identifier, unique within one thread's posting period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct PosterId(String);

impl PosterId {
    /// Wrap a raw ID token.
    pub fn new(raw: impl Into<String>) -> Self {
        PosterId(raw.into())
    }

    /// The underlying token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PosterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ID:{}", self.0)
    }
}

impl From<&str> for PosterId {
    fn from(raw: &str) -> Self {
        PosterId::new(raw)
    }
}

/// Opaque token naming one discussion thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct ThreadKey(String);

impl ThreadKey {
    /// Wrap a raw thread key.
    pub fn new(raw: impl Into<String>) -> Self {
        ThreadKey(raw.into())
    }

    /// The underlying token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ThreadKey {
    fn from(raw: &str) -> Self {
        ThreadKey::new(raw)
    }
}

/// Result of asking the directory where a poster has been seen.
///
/// The upstream endpoint answers with either a key list or a "not yet
/// registered" sentinel message. Callers pattern-match on the variant;
/// there is no error code to inspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostHistory {
    /// Threads the poster is known to have posted in, in page order.
    Known(Vec<ThreadKey>),
    /// The directory has no posting history for this ID.
    Unregistered(String),
}

impl PostHistory {
    /// The known thread keys, or an empty slice for an unregistered ID.
    pub fn keys(&self) -> &[ThreadKey] {
        match self {
            PostHistory::Known(keys) => keys,
            PostHistory::Unregistered(_) => &[],
        }
    }
}
