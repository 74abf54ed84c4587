//! The event store: the durable source of truth between runs.
//!
//! A store is a map from hearing id to [`Hearing`] plus a bounded,
//! append-only change log. It is loaded once at run start, mutated in memory
//! by the reconciler, and persisted atomically once at run end.

mod file;

pub use file::FileStore;

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::change::ChangeEntry;
use crate::error::StoreError;
use crate::hearing::{Hearing, HearingId, HearingStatus};

/// Persisted set of previously observed hearings plus their change history.
///
/// `BTreeMap` keeps iteration (and the serialized JSON) in id order, so the
/// persisted document is byte-stable for a given logical state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Store {
    /// All known hearings, keyed by source-system id.
    pub hearings: BTreeMap<HearingId, Hearing>,

    /// Detected transitions, ordered by (`detected_at`, id). Bounded by
    /// [`Store::prune`].
    #[serde(default)]
    pub change_log: Vec<ChangeEntry>,

    /// Top-level fields persisted by other versions of this crate.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Store {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of hearings in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hearings.len()
    }

    /// Returns true if the store holds no hearings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hearings.is_empty()
    }

    /// Looks up a hearing by id.
    #[must_use]
    pub fn hearing(&self, id: &HearingId) -> Option<&Hearing> {
        self.hearings.get(id)
    }

    /// Links a deferred hearing to its replacement, writing both sides of
    /// the weak-reference pair in one place.
    ///
    /// This is the only code path that sets `replaced_by` or `replaces`;
    /// neither side is ever written independently, which is what keeps the
    /// mutual-consistency invariant checkable.
    ///
    /// # Errors
    ///
    /// Returns `HearingNotFound` if either id is absent, `AlreadyLinked` if
    /// either side already carries a link.
    pub fn link_replacement(
        &mut self,
        deferred_id: &HearingId,
        replacement_id: &HearingId,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let deferred = self
            .hearings
            .get(deferred_id)
            .ok_or_else(|| StoreError::HearingNotFound(deferred_id.clone()))?;
        if let Some(existing) = &deferred.replaced_by {
            return Err(StoreError::AlreadyLinked {
                id: deferred_id.clone(),
                existing: existing.clone(),
            });
        }

        let replacement = self
            .hearings
            .get(replacement_id)
            .ok_or_else(|| StoreError::HearingNotFound(replacement_id.clone()))?;
        if let Some(existing) = &replacement.replaces {
            return Err(StoreError::AlreadyLinked {
                id: replacement_id.clone(),
                existing: existing.clone(),
            });
        }

        // Both lookups succeeded; the two inserts below cannot fail.
        if let Some(d) = self.hearings.get_mut(deferred_id) {
            d.replaced_by = Some(replacement_id.clone());
            d.last_updated_at = now;
        }
        if let Some(r) = self.hearings.get_mut(replacement_id) {
            r.replaces = Some(deferred_id.clone());
            r.last_updated_at = now;
        }
        Ok(())
    }

    /// Checks the store's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns `CorruptState` when a `replaces`/`replaced_by` pair is
    /// dangling or one-sided, or when a `rescheduled` hearing has no
    /// `replaces` link.
    pub fn validate(&self) -> Result<(), StoreError> {
        for (id, hearing) in &self.hearings {
            if let Some(target) = &hearing.replaced_by {
                let Some(replacement) = self.hearings.get(target) else {
                    return Err(StoreError::corrupt(format!(
                        "hearing {id} replaced_by missing hearing {target}"
                    )));
                };
                if replacement.replaces.as_ref() != Some(id) {
                    return Err(StoreError::corrupt(format!(
                        "hearing {id} replaced_by {target}, but {target} does not point back"
                    )));
                }
            }

            if let Some(source) = &hearing.replaces {
                let Some(deferred) = self.hearings.get(source) else {
                    return Err(StoreError::corrupt(format!(
                        "hearing {id} replaces missing hearing {source}"
                    )));
                };
                if deferred.replaced_by.as_ref() != Some(id) {
                    return Err(StoreError::corrupt(format!(
                        "hearing {id} replaces {source}, but {source} does not point back"
                    )));
                }
            }

            if hearing.status == HearingStatus::Rescheduled && hearing.replaces.is_none() {
                return Err(StoreError::corrupt(format!(
                    "hearing {id} has status rescheduled but no replaces link"
                )));
            }
        }
        Ok(())
    }

    /// Bounds store growth to the lookback window.
    ///
    /// Drops change-log entries older than the cutoff and hearings whose
    /// date is older than the cutoff and whose status is terminal (`held`).
    /// An unresolved `deferred` hearing is never dropped regardless of age;
    /// it may still be matched later. When a dropped hearing was one side of
    /// a replacement pair, the survivor's back-reference is cleared so the
    /// store still validates.
    pub fn prune(&mut self, now: DateTime<Utc>, lookback_days: u32) {
        let cutoff = now - Duration::days(i64::from(lookback_days));

        self.change_log.retain(|e| e.detected_at >= cutoff);

        let expired: Vec<HearingId> = self
            .hearings
            .values()
            .filter(|h| h.status == HearingStatus::Held && h.scheduled_date < cutoff)
            .map(|h| h.id.clone())
            .collect();

        for id in &expired {
            let Some(removed) = self.hearings.remove(id) else {
                continue;
            };
            if let Some(target) = removed.replaced_by {
                if let Some(replacement) = self.hearings.get_mut(&target) {
                    replacement.replaces = None;
                }
            }
            if let Some(source) = removed.replaces {
                if let Some(deferred) = self.hearings.get_mut(&source) {
                    deferred.replaced_by = None;
                }
            }
        }
    }
}
