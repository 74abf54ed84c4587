//! The change log: the ordered record of detected transitions between runs.
//!
//! Entries are kept both for pruning (bounded by the lookback window) and for
//! display. The final order of a run's entries is a deterministic total order
//! — (`detected_at`, hearing id), with insertion order preserved for ties —
//! independent of any internal traversal order.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hearing::HearingId;

/// Kind of transition detected during a reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A hearing appeared that the store had never seen.
    NewHearing,
    /// The source system moved a hearing's date without creating a new record.
    RescheduledSameId,
    /// Topic or committee text changed on an existing record, date unchanged.
    DetailsChanged,
    /// A scheduled hearing vanished from the fetch while its date is still in
    /// the future.
    Deferred,
    /// A deferred hearing reappeared in the fetch before any replacement was
    /// announced.
    DeferralReverted,
    /// A scheduled hearing vanished from the fetch after its date passed.
    Held,
    /// A deferred hearing was linked to the new hearing that continues it.
    MatchFound,
    /// The match had multiple plausible candidates; the earliest-dated one
    /// was chosen. Flagged for human review, never silently dropped.
    AmbiguousMatch,
    /// A fetched record was malformed and skipped.
    SkippedInvalidRecord,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NewHearing => "new_hearing",
            Self::RescheduledSameId => "rescheduled_same_id",
            Self::DetailsChanged => "details_changed",
            Self::Deferred => "deferred",
            Self::DeferralReverted => "deferral_reverted",
            Self::Held => "held",
            Self::MatchFound => "match_found",
            Self::AmbiguousMatch => "ambiguous_match",
            Self::SkippedInvalidRecord => "skipped_invalid_record",
        };
        write!(f, "{s}")
    }
}

/// One detected transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// The hearing the transition applies to.
    pub hearing_id: HearingId,

    /// What happened.
    pub kind: ChangeKind,

    /// When the reconciler observed it (the run's clock, not the meeting
    /// date).
    pub detected_at: DateTime<Utc>,
}

impl ChangeEntry {
    /// Creates an entry at the given observation time.
    #[must_use]
    pub fn new(hearing_id: HearingId, kind: ChangeKind, detected_at: DateTime<Utc>) -> Self {
        Self {
            hearing_id,
            kind,
            detected_at,
        }
    }
}

/// Sorts entries into the change log's total order.
///
/// The sort is stable, so entries for the same hearing detected at the same
/// instant keep their insertion order (`deferred` before `match_found`).
pub fn sort_entries(entries: &mut [ChangeEntry]) {
    entries.sort_by(|a, b| {
        a.detected_at
            .cmp(&b.detected_at)
            .then_with(|| a.hearing_id.cmp(&b.hearing_id))
    });
}
