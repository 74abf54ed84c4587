//! The run pipeline: load → fetch → reconcile → prune → save → project.
//!
//! One process performs a run start to finish; the persisted store is the
//! only shared resource and at most one run touches it at a time. A failed
//! run leaves the persisted state exactly as it was; a successful run with
//! warnings (ambiguous matches, skipped records) still persists, surfacing
//! the warnings through the change log.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{info, info_span};
use uuid::Uuid;

use crate::change::ChangeEntry;
use crate::config::MonitorConfig;
use crate::error::MonitorResult;
use crate::reconcile;
use crate::record::Fetcher;
use crate::store::FileStore;
use crate::summary::{self, Summary};

/// Identifier for one monitor run, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    /// Creates a fresh run id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What one completed run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Correlation id for this run.
    pub run_id: RunId,

    /// This run's change-log entries, in final (detected_at, id) order.
    pub changes: Vec<ChangeEntry>,

    /// The display projection of the committed store.
    pub summary: Summary,
}

/// Executes one full monitor run against the persisted store at
/// `store_file`.
///
/// The store file is read once, mutated in memory, and written back
/// atomically once. Any error before the save — fetch failure, the
/// empty-fetch guard, a corrupt store — aborts with the file untouched.
///
/// # Errors
///
/// Propagates [`crate::error::MonitorError`] from every stage; see the error
/// taxonomy for which conditions abort and which are recovered in-run.
pub fn run_once<F: Fetcher>(
    fetcher: &F,
    store_file: &FileStore,
    config: &MonitorConfig,
    now: DateTime<Utc>,
) -> MonitorResult<RunOutcome> {
    let run_id = RunId::new();
    let span = info_span!("monitor_run", run = %run_id);
    let _guard = span.enter();

    let prior = store_file.load_or_default()?;
    info!(hearings = prior.len(), "loaded prior store");

    let batch = fetcher.fetch_upcoming(config.lookback_days)?;
    info!(records = batch.len(), "fetched batch");

    let outcome = reconcile::reconcile(prior, &batch, now, config.lookback_days)?;
    let mut store = outcome.store;
    store.prune(now, config.lookback_days);
    store_file.save(&store)?;

    let summary = summary::project(&store, now);
    info!(
        changes = outcome.changes.len(),
        upcoming = summary.upcoming.len(),
        deferrals = summary.recent_deferrals.len(),
        reschedules = summary.recent_reschedules.len(),
        "run complete"
    );

    Ok(RunOutcome {
        run_id,
        changes: outcome.changes,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, MonitorError};
    use crate::record::RawRecord;
    use chrono::TimeZone;

    struct FixedFetcher(Vec<RawRecord>);

    impl Fetcher for FixedFetcher {
        fn fetch_upcoming(&self, _lookback_days: u32) -> Result<Vec<RawRecord>, FetchError> {
            Ok(self.0.clone())
        }
    }

    struct FailingFetcher;

    impl Fetcher for FailingFetcher {
        fn fetch_upcoming(&self, _lookback_days: u32) -> Result<Vec<RawRecord>, FetchError> {
            Err(FetchError::Transport {
                message: "api unreachable".to_string(),
            })
        }
    }

    fn record(id: &str, date: DateTime<Utc>) -> RawRecord {
        RawRecord {
            id: Some(id.to_string()),
            committee: Some("Finance".to_string()),
            topic: Some("Budget".to_string()),
            scheduled_date: Some(date),
            extra: serde_json::Map::new(),
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 10, 0, 0).unwrap()
    }

    #[test]
    fn run_persists_and_projects() {
        let dir = tempfile::tempdir().unwrap();
        let store_file = FileStore::new(dir.path().join("seen.json"));
        let fetcher = FixedFetcher(vec![record("h1", day(20))]);
        let config = MonitorConfig::default();

        let outcome = run_once(&fetcher, &store_file, &config, day(1)).unwrap();
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.summary.upcoming.len(), 1);

        let persisted = store_file.load().unwrap().unwrap();
        assert!(persisted.hearing(&"h1".into()).is_some());
    }

    #[test]
    fn second_run_on_same_data_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store_file = FileStore::new(dir.path().join("seen.json"));
        let fetcher = FixedFetcher(vec![record("h1", day(20))]);
        let config = MonitorConfig::default();

        run_once(&fetcher, &store_file, &config, day(1)).unwrap();
        let second = run_once(&fetcher, &store_file, &config, day(2)).unwrap();
        assert!(second.changes.is_empty());
    }

    #[test]
    fn fetch_failure_leaves_store_file_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store_file = FileStore::new(dir.path().join("seen.json"));
        let config = MonitorConfig::default();

        run_once(
            &FixedFetcher(vec![record("h1", day(20))]),
            &store_file,
            &config,
            day(1),
        )
        .unwrap();
        let before = std::fs::read(store_file.path()).unwrap();

        let err = run_once(&FailingFetcher, &store_file, &config, day(2)).unwrap_err();
        assert!(err.is_fetch());

        let after = std::fs::read(store_file.path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn empty_fetch_against_existing_store_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let store_file = FileStore::new(dir.path().join("seen.json"));
        let config = MonitorConfig::default();

        run_once(
            &FixedFetcher(vec![record("h1", day(20))]),
            &store_file,
            &config,
            day(1),
        )
        .unwrap();
        let before = std::fs::read(store_file.path()).unwrap();

        let err = run_once(&FixedFetcher(Vec::new()), &store_file, &config, day(2)).unwrap_err();
        assert!(matches!(err, MonitorError::EmptyFetch { .. }));
        assert_eq!(std::fs::read(store_file.path()).unwrap(), before);
    }
}
