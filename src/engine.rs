//! Engine facade: top-level API for a full correlation run.
//!
//! The `Engine` wires the expander, the Jaccard metric, and both clustering
//! strategies into one `correlate` call. It is generic over the
//! [`ThreadDirectory`] so tests and alternative data sources plug in without
//! touching the pipeline.

use std::time::Duration;

use crate::cluster::{perform_dbscan, perform_hac, Grouping};
use crate::distance::{jaccard_distance, DistanceMatrix};
use crate::error::{EngineError, SockResult};
use crate::expand::{Expander, ExpansionReport, ThreadDirectory, DEFAULT_PACE};
use crate::fetch::{HttpDirectory, HttpDirectoryConfig};
use crate::ident::ThreadKey;

/// Configuration for a correlation engine.
///
/// Covers transport and pacing policy only; clustering constants are owned
/// by the cluster module and deliberately not configurable here.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Delay between successive directory lookups.
    pub pace: Duration,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Base URL for dat files.
    pub dat_base: String,
    /// Base URL of the ID-search service.
    pub search_base: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let http = HttpDirectoryConfig::default();
        Self {
            pace: DEFAULT_PACE,
            timeout: http.timeout,
            dat_base: http.dat_base,
            search_base: http.search_base,
        }
    }
}

/// Derived, read-only artifacts of one correlation run.
#[derive(Debug)]
pub struct CorrelationReport {
    /// Everything the expander found, including recorded lookup failures.
    pub expansion: ExpansionReport,
    /// Jaccard distance matrix over the suspected set, indexed by
    /// `expansion.keysets` order.
    pub matrix: DistanceMatrix,
    /// Hierarchical (Ward) grouping of the suspected set.
    pub hac: Grouping,
    /// Density-based grouping of the suspected set (noise dropped).
    pub dbscan: Grouping,
}

/// The sockscan correlation engine.
pub struct Engine<D: ThreadDirectory> {
    directory: D,
    pace: Duration,
}

impl Engine<HttpDirectory> {
    /// Create an engine backed by the live HTTP endpoints.
    pub fn new(config: EngineConfig) -> SockResult<Self> {
        if config.dat_base.is_empty() || config.search_base.is_empty() {
            return Err(EngineError::InvalidConfig {
                message: "endpoint base URLs must not be empty".into(),
            }
            .into());
        }
        let directory = HttpDirectory::new(HttpDirectoryConfig {
            dat_base: config.dat_base.clone(),
            search_base: config.search_base.clone(),
            timeout: config.timeout,
        });
        Ok(Self::with_directory(directory, config.pace))
    }
}

impl<D: ThreadDirectory> Engine<D> {
    /// Create an engine over an arbitrary directory implementation.
    pub fn with_directory(directory: D, pace: Duration) -> Self {
        Self { directory, pace }
    }

    /// Access the underlying directory.
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Run a full correlation: expand from the seed thread, build the
    /// Jaccard matrix over the suspected set, and cluster it both ways.
    ///
    /// Lookup failures inside the expansion degrade coverage and are listed
    /// in the report; only an unreachable seed thread fails the whole run.
    pub fn correlate(&self, seed: &ThreadKey) -> SockResult<CorrelationReport> {
        tracing::info!(key = %seed, "starting correlation run");

        let expansion = Expander::new(&self.directory)
            .with_pace(self.pace)
            .run(seed)?;

        let ids = expansion.keysets.posters();
        let matrix = jaccard_distance(&expansion.keysets);
        let hac = perform_hac(&ids, &matrix);
        let dbscan = perform_dbscan(&ids, &matrix);

        tracing::info!(
            suspected = ids.len(),
            hac_groups = hac.len(),
            dbscan_groups = dbscan.len(),
            failures = expansion.failures.len(),
            "correlation run finished"
        );

        Ok(CorrelationReport {
            expansion,
            matrix,
            hac,
            dbscan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_base_url_is_rejected() {
        let result = Engine::new(EngineConfig {
            dat_base: String::new(),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn default_config_carries_pacing_policy() {
        let config = EngineConfig::default();
        assert_eq!(config.pace, Duration::from_millis(200));
        assert!(!config.dat_base.is_empty());
    }
}
