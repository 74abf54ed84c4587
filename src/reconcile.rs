//! The reconciliation engine.
//!
//! One pass per run over the union of prior store ids and fetched ids,
//! applying the hearing state machine and the replacement matcher. Given the
//! same (prior store, fetched batch) pair the output is identical regardless
//! of input ordering: fetched records are keyed by id, traversal follows id
//! order, and the change log is sorted into its (detected_at, id) total
//! order at the end.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::change::{sort_entries, ChangeEntry, ChangeKind};
use crate::error::{MonitorError, MonitorResult};
use crate::hearing::{Hearing, HearingId, HearingStatus};
use crate::matcher;
use crate::record::{RawRecord, ValidRecord};
use crate::store::Store;

/// Result of one reconcile pass.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// The updated store, with this run's entries appended to its change log.
    pub store: Store,

    /// This run's change-log entries, in final order.
    pub changes: Vec<ChangeEntry>,
}

/// Merges a fetched batch against the prior store.
///
/// `lookback_days` bounds how long a deferred hearing keeps being offered to
/// the matcher: once its deferral is older than the window, matching stops
/// and the hearing simply ages out of summaries.
///
/// # Errors
///
/// Returns [`MonitorError::EmptyFetch`] when the batch is empty but the
/// prior store is not — an empty fetch is not evidence that every hearing
/// was deferred, so the run aborts with the store untouched. Store errors
/// from link bookkeeping propagate as [`MonitorError::Store`].
pub fn reconcile(
    prior: Store,
    batch: &[RawRecord],
    now: DateTime<Utc>,
    lookback_days: u32,
) -> MonitorResult<ReconcileOutcome> {
    if batch.is_empty() && !prior.is_empty() {
        return Err(MonitorError::EmptyFetch {
            prior_hearings: prior.len(),
        });
    }

    let mut store = prior;
    let mut changes: Vec<ChangeEntry> = Vec::new();

    // Key the batch by id; the last occurrence of a duplicated id wins, the
    // same way a paginated API pull would overwrite earlier pages. Invalid
    // records are skipped but their ids are remembered: a record the source
    // garbled is still a sighting, not evidence of absence.
    let mut fetched: BTreeMap<HearingId, ValidRecord> = BTreeMap::new();
    let mut invalid: BTreeSet<HearingId> = BTreeSet::new();
    for raw in batch {
        match raw.validate() {
            Ok(rec) => {
                fetched.insert(rec.id.clone(), rec);
            }
            Err(err) => {
                warn!(%err, "skipping invalid fetched record");
                // Only loggable against an id; an id-less record leaves no
                // change-log trace beyond the warning above.
                if let Some(id) = raw.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                    let id = HearingId::new(id);
                    changes.push(ChangeEntry::new(
                        id.clone(),
                        ChangeKind::SkippedInvalidRecord,
                        now,
                    ));
                    invalid.insert(id);
                }
            }
        }
    }

    // Pass 1: fetched records against prior state. Future-dated insertions
    // are this run's pool of potential replacement targets.
    let mut inserted: Vec<HearingId> = Vec::new();
    for (id, rec) in &fetched {
        if let Some(hearing) = store.hearings.get_mut(id) {
            apply_present(hearing, rec, now, &mut changes);
        } else {
            let status = if rec.scheduled_date > now {
                HearingStatus::Scheduled
            } else {
                // Lookback fetches include meetings that already happened.
                HearingStatus::Held
            };
            info!(%id, committee = %rec.committee, %status, "new hearing");
            store.hearings.insert(
                id.clone(),
                Hearing {
                    id: id.clone(),
                    committee: rec.committee.clone(),
                    topic: rec.topic.clone(),
                    scheduled_date: rec.scheduled_date,
                    status,
                    first_seen_at: now,
                    last_updated_at: now,
                    replaced_by: None,
                    replaces: None,
                    extra: rec.extra.clone(),
                },
            );
            changes.push(ChangeEntry::new(id.clone(), ChangeKind::NewHearing, now));
            if status == HearingStatus::Scheduled {
                inserted.push(id.clone());
            }
        }
    }

    // Pass 2: hearings the fetch no longer mentions. An id seen only on an
    // invalid record does not count as absent; its prior state is left alone
    // until the source sends something parseable.
    let absent: Vec<HearingId> = store
        .hearings
        .keys()
        .filter(|id| !fetched.contains_key(*id) && !invalid.contains(*id))
        .cloned()
        .collect();
    for id in absent {
        let Some(hearing) = store.hearings.get_mut(&id) else {
            continue;
        };
        if !matches!(
            hearing.status,
            HearingStatus::Scheduled | HearingStatus::Rescheduled
        ) {
            continue;
        }
        if hearing.scheduled_date <= now {
            hearing.status = HearingStatus::Held;
            hearing.last_updated_at = now;
            changes.push(ChangeEntry::new(id, ChangeKind::Held, now));
        } else {
            info!(%id, date = %hearing.scheduled_date, "hearing deferred");
            hearing.status = HearingStatus::Deferred;
            hearing.last_updated_at = now;
            changes.push(ChangeEntry::new(id, ChangeKind::Deferred, now));
        }
    }

    // Pass 3: offer every unmatched deferral (this run's and earlier runs')
    // to the matcher against this run's insertions, until the deferral ages
    // past the lookback window.
    let cutoff = now - Duration::days(i64::from(lookback_days));
    let awaiting: Vec<HearingId> = store
        .hearings
        .values()
        .filter(|h| {
            h.status == HearingStatus::Deferred
                && h.replaced_by.is_none()
                && h.last_updated_at >= cutoff
        })
        .map(|h| h.id.clone())
        .collect();

    for deferred_id in awaiting {
        let decision = {
            let Some(deferred) = store.hearings.get(&deferred_id) else {
                continue;
            };
            let candidates = inserted.iter().filter_map(|i| store.hearings.get(i));
            matcher::find_replacement(deferred, candidates)
        };

        let Some(decision) = decision else {
            continue;
        };
        info!(
            deferred = %deferred_id,
            replacement = %decision.replacement,
            ambiguous = decision.ambiguous,
            "deferred hearing matched to replacement"
        );
        store.link_replacement(&deferred_id, &decision.replacement, now)?;
        changes.push(ChangeEntry::new(
            deferred_id.clone(),
            ChangeKind::MatchFound,
            now,
        ));
        if decision.ambiguous {
            changes.push(ChangeEntry::new(
                deferred_id,
                ChangeKind::AmbiguousMatch,
                now,
            ));
        }
    }

    sort_entries(&mut changes);
    store.change_log.extend(changes.iter().cloned());

    Ok(ReconcileOutcome { store, changes })
}

/// Applies a fetched record to the hearing the store already knows.
fn apply_present(
    hearing: &mut Hearing,
    rec: &ValidRecord,
    now: DateTime<Utc>,
    changes: &mut Vec<ChangeEntry>,
) {
    match hearing.status {
        HearingStatus::Scheduled | HearingStatus::Rescheduled => {
            if hearing.scheduled_date != rec.scheduled_date {
                // The source moved the date without creating a new record.
                hearing.scheduled_date = rec.scheduled_date;
                hearing.topic = rec.topic.clone();
                hearing.committee = rec.committee.clone();
                hearing.last_updated_at = now;
                changes.push(ChangeEntry::new(
                    hearing.id.clone(),
                    ChangeKind::RescheduledSameId,
                    now,
                ));
            } else if hearing.topic != rec.topic || hearing.committee != rec.committee {
                hearing.topic = rec.topic.clone();
                hearing.committee = rec.committee.clone();
                hearing.last_updated_at = now;
                changes.push(ChangeEntry::new(
                    hearing.id.clone(),
                    ChangeKind::DetailsChanged,
                    now,
                ));
            }
            // Identical record: no-op, no log entry.
        }
        HearingStatus::Deferred => {
            // A deferral with no announced successor can reappear on the
            // calendar; once linked, the deferral is terminal.
            if hearing.replaced_by.is_none() && rec.scheduled_date > now {
                info!(id = %hearing.id, "deferred hearing reappeared; reverting to scheduled");
                hearing.status = HearingStatus::Scheduled;
                hearing.scheduled_date = rec.scheduled_date;
                hearing.topic = rec.topic.clone();
                hearing.committee = rec.committee.clone();
                hearing.last_updated_at = now;
                changes.push(ChangeEntry::new(
                    hearing.id.clone(),
                    ChangeKind::DeferralReverted,
                    now,
                ));
            }
        }
        HearingStatus::Held => {}
    }
}
