//! Correlation expander: grows a seed thread's ID set into a suspected set
//! plus the posting-history map the Jaccard metric consumes.
//!
//! The expander talks to a [`ThreadDirectory`] — the seam behind which the
//! real HTTP endpoints (or a test double) live. Lookups run sequentially
//! with a pacing delay between calls so the collaborator endpoint is never
//! hammered. One failed lookup never aborts a run: the failed item
//! contributes nothing and the failure is recorded in the report.

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;

use crate::error::{LookupError, SockResult};
use crate::ident::{PostHistory, PosterId, ThreadKey};
use crate::keyset::KeysetMap;

/// External lookup capability the expander depends on.
///
/// Implementations: [`crate::fetch::HttpDirectory`] over the live endpoints,
/// and in-memory doubles in tests.
pub trait ThreadDirectory {
    /// IDs that posted in a thread, de-duplicated, in first-post order.
    ///
    /// An unknown thread is an empty list, not an error.
    fn ids_in_thread(&self, key: &ThreadKey) -> Result<Vec<PosterId>, LookupError>;

    /// Threads a poster is known to have posted in, or the directory's
    /// "not yet registered" answer.
    fn threads_posted_in(&self, id: &PosterId) -> Result<PostHistory, LookupError>;
}

/// One recoverable lookup failure recorded during a run.
#[derive(Debug, Serialize)]
pub struct LookupFailure {
    /// What was being looked up when the failure happened.
    pub subject: FailureSubject,
    /// Human-readable cause.
    pub cause: String,
}

/// The item a failed lookup was about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureSubject {
    /// Fetching a thread's ID list failed.
    Thread(ThreadKey),
    /// Fetching a poster's history failed.
    Poster(PosterId),
}

impl LookupFailure {
    fn thread(key: &ThreadKey, err: &LookupError) -> Self {
        Self {
            subject: FailureSubject::Thread(key.clone()),
            cause: err.to_string(),
        }
    }

    fn poster(id: &PosterId, err: &LookupError) -> Self {
        Self {
            subject: FailureSubject::Poster(id.clone()),
            cause: err.to_string(),
        }
    }
}

/// Everything a correlation expansion produced.
///
/// `suspected` and `keysets` share the same ID order; the keyset map's
/// insertion order is what indexes any distance matrix derived from it.
#[derive(Debug)]
pub struct ExpansionReport {
    /// The thread the run was seeded from.
    pub seed: ThreadKey,
    /// Every unique ID posting in the seed thread, extraction order.
    pub origin: Vec<PosterId>,
    /// IDs common to the seed thread and the distinguished poster's other
    /// threads, in origin order.
    pub suspected: Vec<PosterId>,
    /// Posting-history key sets for each suspected ID.
    pub keysets: KeysetMap,
    /// Set when expansion was skipped because the distinguished ID has no
    /// registered posting history; holds the directory's message.
    pub skipped: Option<String>,
    /// Recoverable lookup failures encountered along the way.
    pub failures: Vec<LookupFailure>,
}

impl ExpansionReport {
    fn empty(seed: ThreadKey) -> Self {
        Self {
            seed,
            origin: Vec::new(),
            suspected: Vec::new(),
            keysets: KeysetMap::new(),
            skipped: None,
            failures: Vec::new(),
        }
    }
}

/// Default delay between successive directory calls.
pub const DEFAULT_PACE: Duration = Duration::from_millis(200);

/// Sequential, paced correlation expander over a [`ThreadDirectory`].
pub struct Expander<'a, D: ThreadDirectory> {
    directory: &'a D,
    pace: Duration,
}

impl<'a, D: ThreadDirectory> Expander<'a, D> {
    /// Create an expander with the default pacing delay.
    pub fn new(directory: &'a D) -> Self {
        Self {
            directory,
            pace: DEFAULT_PACE,
        }
    }

    /// Override the pacing delay (tests use `Duration::ZERO`).
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    fn pace(&self) {
        if !self.pace.is_zero() {
            std::thread::sleep(self.pace);
        }
    }

    /// Run a full expansion from `seed`.
    ///
    /// Only a failure to fetch the seed thread itself is fatal — without the
    /// origin set there is nothing to correlate. Every later lookup failure
    /// is recorded and the run continues with partial data.
    pub fn run(&self, seed: &ThreadKey) -> SockResult<ExpansionReport> {
        let origin = self
            .directory
            .ids_in_thread(seed)
            .map_err(|source| crate::error::EngineError::SeedUnavailable {
                key: seed.to_string(),
                source,
            })?;
        tracing::info!(key = %seed, ids = origin.len(), "fetched seed thread");

        let mut report = ExpansionReport::empty(seed.clone());
        report.origin = origin;
        let Some(distinguished) = report.origin.first().cloned() else {
            return Ok(report);
        };

        // Where else has the first poster been seen?
        self.pace();
        let history = match self.directory.threads_posted_in(&distinguished) {
            Ok(PostHistory::Known(keys)) => keys,
            Ok(PostHistory::Unregistered(message)) => {
                tracing::info!(id = %distinguished, "distinguished ID unregistered, skipping expansion");
                report.skipped = Some(message);
                return Ok(report);
            }
            Err(err) => {
                tracing::warn!(id = %distinguished, error = %err, "history lookup failed");
                report.failures.push(LookupFailure::poster(&distinguished, &err));
                return Ok(report);
            }
        };

        // Union the ID sets of every other thread the poster used.
        let mut another_set: HashSet<PosterId> = HashSet::new();
        for key in history.iter().filter(|k| *k != seed) {
            self.pace();
            match self.directory.ids_in_thread(key) {
                Ok(ids) => {
                    tracing::debug!(key = %key, ids = ids.len(), "unioned thread");
                    another_set.extend(ids);
                }
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "thread lookup failed, continuing");
                    report.failures.push(LookupFailure::thread(key, &err));
                }
            }
        }

        // Intersection in origin order: the suspected set.
        report.suspected = report
            .origin
            .iter()
            .filter(|id| another_set.contains(*id))
            .cloned()
            .collect();
        tracing::info!(
            origin = report.origin.len(),
            union = another_set.len(),
            suspected = report.suspected.len(),
            "computed suspected set"
        );

        // Posting history per suspected ID, for the Jaccard metric.
        for id in &report.suspected {
            self.pace();
            match self.directory.threads_posted_in(id) {
                Ok(PostHistory::Known(keys)) => report.keysets.insert(id.clone(), keys),
                Ok(PostHistory::Unregistered(_)) => report.keysets.insert(id.clone(), Vec::new()),
                Err(err) => {
                    tracing::warn!(id = %id, error = %err, "history lookup failed, continuing");
                    report.failures.push(LookupFailure::poster(id, &err));
                    report.keysets.insert(id.clone(), Vec::new());
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory directory double with per-item failure injection.
    #[derive(Default)]
    struct MemoryDirectory {
        threads: HashMap<ThreadKey, Vec<PosterId>>,
        histories: HashMap<PosterId, PostHistory>,
        failing_threads: Vec<ThreadKey>,
        failing_posters: Vec<PosterId>,
    }

    impl MemoryDirectory {
        fn thread(mut self, key: &str, ids: &[&str]) -> Self {
            self.threads.insert(
                ThreadKey::new(key),
                ids.iter().map(|i| PosterId::new(*i)).collect(),
            );
            self
        }

        fn history(mut self, id: &str, keys: &[&str]) -> Self {
            self.histories.insert(
                PosterId::new(id),
                PostHistory::Known(keys.iter().map(|k| ThreadKey::new(*k)).collect()),
            );
            self
        }

        fn unregistered(mut self, id: &str) -> Self {
            self.histories.insert(
                PosterId::new(id),
                PostHistory::Unregistered("no posts recorded for this ID yet".into()),
            );
            self
        }

        fn fail_thread(mut self, key: &str) -> Self {
            self.failing_threads.push(ThreadKey::new(key));
            self
        }

        fn fail_poster(mut self, id: &str) -> Self {
            self.failing_posters.push(PosterId::new(id));
            self
        }
    }

    impl ThreadDirectory for MemoryDirectory {
        fn ids_in_thread(&self, key: &ThreadKey) -> Result<Vec<PosterId>, LookupError> {
            if self.failing_threads.contains(key) {
                return Err(LookupError::Status {
                    status: 500,
                    url: format!("mem://{key}"),
                });
            }
            Ok(self.threads.get(key).cloned().unwrap_or_default())
        }

        fn threads_posted_in(&self, id: &PosterId) -> Result<PostHistory, LookupError> {
            if self.failing_posters.contains(id) {
                return Err(LookupError::Status {
                    status: 500,
                    url: format!("mem://{id}"),
                });
            }
            Ok(self
                .histories
                .get(id)
                .cloned()
                .unwrap_or(PostHistory::Unregistered("unknown".into())))
        }
    }

    fn expander(directory: &MemoryDirectory) -> Expander<'_, MemoryDirectory> {
        Expander::new(directory).with_pace(Duration::ZERO)
    }

    #[test]
    fn spec_scenario_intersects_origin_with_other_threads() {
        let dir = MemoryDirectory::default()
            .thread("T0", &["X", "Y", "Z"])
            .thread("T1", &["Y", "W"])
            .history("X", &["T0", "T1"])
            .history("Y", &["T0", "T1"]);

        let report = expander(&dir).run(&ThreadKey::new("T0")).unwrap();

        let suspected: Vec<&str> = report.suspected.iter().map(PosterId::as_str).collect();
        assert_eq!(suspected, vec!["Y"]);
        assert!(report.failures.is_empty());
        assert_eq!(report.keysets.len(), 1);
    }

    #[test]
    fn seed_key_is_excluded_from_history_threads() {
        // X's history only names the seed thread itself: nothing to union,
        // so the suspected set is empty.
        let dir = MemoryDirectory::default()
            .thread("T0", &["X", "Y"])
            .history("X", &["T0"]);

        let report = expander(&dir).run(&ThreadKey::new("T0")).unwrap();
        assert!(report.suspected.is_empty());
    }

    #[test]
    fn empty_seed_thread_short_circuits() {
        let dir = MemoryDirectory::default().thread("T0", &[]);
        let report = expander(&dir).run(&ThreadKey::new("T0")).unwrap();

        assert!(report.origin.is_empty());
        assert!(report.suspected.is_empty());
        assert!(report.keysets.is_empty());
    }

    #[test]
    fn unregistered_distinguished_id_skips_expansion() {
        let dir = MemoryDirectory::default()
            .thread("T0", &["X", "Y"])
            .unregistered("X");

        let report = expander(&dir).run(&ThreadKey::new("T0")).unwrap();
        assert!(report.skipped.is_some());
        assert!(report.suspected.is_empty());
        assert!(report.failures.is_empty());
    }

    #[test]
    fn one_failing_thread_does_not_block_the_others() {
        let dir = MemoryDirectory::default()
            .thread("T0", &["X", "Y", "Z"])
            .thread("T2", &["Z", "Q"])
            .history("X", &["T0", "T1", "T2"])
            .history("Z", &["T0", "T2"])
            .fail_thread("T1");

        let report = expander(&dir).run(&ThreadKey::new("T0")).unwrap();

        // T1 failed but T2's IDs still made it into the union.
        let suspected: Vec<&str> = report.suspected.iter().map(PosterId::as_str).collect();
        assert_eq!(suspected, vec!["Z"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.failures[0].subject,
            FailureSubject::Thread(ThreadKey::new("T1"))
        );
    }

    #[test]
    fn failing_history_lookup_yields_empty_keyset() {
        let dir = MemoryDirectory::default()
            .thread("T0", &["X", "Y"])
            .thread("T1", &["X", "Y"])
            .history("X", &["T0", "T1"])
            .fail_poster("Y");

        let report = expander(&dir).run(&ThreadKey::new("T0")).unwrap();

        let suspected: Vec<&str> = report.suspected.iter().map(PosterId::as_str).collect();
        assert_eq!(suspected, vec!["X", "Y"]);
        // Y's lookup failed: recorded, and its key set is present but empty.
        assert_eq!(report.keysets.len(), 2);
        assert!(report.keysets.get(&PosterId::new("Y")).unwrap().is_empty());
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn seed_fetch_failure_is_fatal() {
        let dir = MemoryDirectory::default().fail_thread("T0");
        let result = expander(&dir).run(&ThreadKey::new("T0"));
        assert!(result.is_err());
    }

    #[test]
    fn keyset_order_follows_suspected_order() {
        let dir = MemoryDirectory::default()
            .thread("T0", &["C", "A", "B"])
            .thread("T1", &["B", "A", "C"])
            .history("C", &["T0", "T1"])
            .history("A", &["T0"])
            .history("B", &["T1"]);

        let report = expander(&dir).run(&ThreadKey::new("T0")).unwrap();

        let posters = report.keysets.posters();
        let order: Vec<&str> = posters.iter().map(|p| p.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }
}
