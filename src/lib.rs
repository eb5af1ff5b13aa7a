//! # sockscan
//!
//! Correlates anonymous poster IDs across discussion threads and clusters
//! the result to surface suspected sockpuppets.
//!
//! ## Architecture
//!
//! - **Expander** (`expand`): grows a seed thread's ID set into the
//!   suspected set by intersecting posting history across threads
//! - **Distance metrics** (`distance`): uniform placeholder and
//!   Jaccard-over-posting-history matrices
//! - **Clustering** (`cluster`): Ward-linkage agglomerative and
//!   density-based strategies over a distance matrix
//! - **Directory** (`fetch`): HTTP lookups against the board's dat files
//!   and ID-search pages, behind the `ThreadDirectory` trait
//!
//! ## Library usage
//!
//! ```no_run
//! use sockscan::engine::{Engine, EngineConfig};
//! use sockscan::ident::ThreadKey;
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let report = engine.correlate(&ThreadKey::new("1755000001")).unwrap();
//! for group in &report.hac.groups {
//!     println!("{group:?}");
//! }
//! ```

pub mod cluster;
pub mod distance;
pub mod engine;
pub mod error;
pub mod expand;
pub mod fetch;
pub mod ident;
pub mod keyset;
