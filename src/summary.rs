//! Display projection of the store.
//!
//! Three buckets, re-derivable at any time from the store alone — the
//! summarizer holds no state of its own. The renderer consumes this
//! structure; the core makes no assumption about its output format.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::hearing::{Hearing, HearingId, HearingStatus};
use crate::store::Store;

/// One hearing as presented to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryItem {
    /// Source-system id.
    pub id: HearingId,
    /// Name of the governing body.
    pub committee: String,
    /// Topic text.
    pub topic: String,
    /// Meeting date/time as currently known.
    pub scheduled_date: DateTime<Utc>,
    /// Lifecycle state.
    pub status: HearingStatus,
    /// When the hearing last changed.
    pub last_updated_at: DateTime<Utc>,
    /// For a replacement hearing: the deferral it continues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaces: Option<HearingId>,
    /// For a resolved deferral: the hearing that supersedes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced_by: Option<HearingId>,
}

impl From<&Hearing> for SummaryItem {
    fn from(h: &Hearing) -> Self {
        Self {
            id: h.id.clone(),
            committee: h.committee.clone(),
            topic: h.topic.clone(),
            scheduled_date: h.scheduled_date,
            status: h.status,
            last_updated_at: h.last_updated_at,
            replaces: h.replaces.clone(),
            replaced_by: h.replaced_by.clone(),
        }
    }
}

/// The display-ready projection of one committed store state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// When this projection was taken.
    pub generated_at: DateTime<Utc>,

    /// Scheduled hearings with dates at or after `generated_at`, ascending
    /// by date.
    pub upcoming: Vec<SummaryItem>,

    /// Deferred hearings, most recently updated first, annotated with their
    /// `replaced_by` target when the deferral has been resolved.
    pub recent_deferrals: Vec<SummaryItem>,

    /// Hearings that continue a deferral (non-null `replaces`), ascending by
    /// date.
    pub recent_reschedules: Vec<SummaryItem>,
}

/// Projects the store into the three display buckets.
///
/// Pure: same store and timestamp, same summary, every time.
#[must_use]
pub fn project(store: &Store, generated_at: DateTime<Utc>) -> Summary {
    let mut upcoming: Vec<SummaryItem> = store
        .hearings
        .values()
        .filter(|h| h.status == HearingStatus::Scheduled && h.scheduled_date >= generated_at)
        .map(SummaryItem::from)
        .collect();
    upcoming.sort_by(|a, b| {
        a.scheduled_date
            .cmp(&b.scheduled_date)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut recent_deferrals: Vec<SummaryItem> = store
        .hearings
        .values()
        .filter(|h| h.status == HearingStatus::Deferred)
        .map(SummaryItem::from)
        .collect();
    recent_deferrals.sort_by(|a, b| {
        b.last_updated_at
            .cmp(&a.last_updated_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut recent_reschedules: Vec<SummaryItem> = store
        .hearings
        .values()
        .filter(|h| h.replaces.is_some())
        .map(SummaryItem::from)
        .collect();
    recent_reschedules.sort_by(|a, b| {
        a.scheduled_date
            .cmp(&b.scheduled_date)
            .then_with(|| a.id.cmp(&b.id))
    });

    Summary {
        generated_at,
        upcoming,
        recent_deferrals,
        recent_reschedules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 10, 0, 0).unwrap()
    }

    fn hearing(id: &str, status: HearingStatus, date: DateTime<Utc>, updated: DateTime<Utc>) -> Hearing {
        Hearing {
            id: id.into(),
            committee: "Finance".to_string(),
            topic: "Budget".to_string(),
            scheduled_date: date,
            status,
            first_seen_at: day(1),
            last_updated_at: updated,
            replaced_by: None,
            replaces: None,
            extra: serde_json::Map::new(),
        }
    }

    fn store_with(hearings: Vec<Hearing>) -> Store {
        let mut store = Store::new();
        for h in hearings {
            store.hearings.insert(h.id.clone(), h);
        }
        store
    }

    #[test]
    fn upcoming_excludes_past_and_sorts_ascending() {
        let store = store_with(vec![
            hearing("late", HearingStatus::Scheduled, day(25), day(1)),
            hearing("soon", HearingStatus::Scheduled, day(12), day(1)),
            hearing("past", HearingStatus::Scheduled, day(2), day(1)),
            hearing("gone", HearingStatus::Held, day(20), day(1)),
        ]);
        let summary = project(&store, day(10));

        let ids: Vec<&str> = summary.upcoming.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["soon", "late"]);
    }

    #[test]
    fn deferrals_sort_most_recent_first_with_annotation() {
        let mut store = store_with(vec![
            hearing("d-old", HearingStatus::Deferred, day(5), day(6)),
            hearing("d-new", HearingStatus::Deferred, day(5), day(9)),
            hearing("n1", HearingStatus::Scheduled, day(20), day(9)),
        ]);
        store
            .link_replacement(&"d-new".into(), &"n1".into(), day(9))
            .unwrap();

        let summary = project(&store, day(10));
        let ids: Vec<&str> = summary
            .recent_deferrals
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, ["d-new", "d-old"]);
        assert_eq!(summary.recent_deferrals[0].replaced_by, Some("n1".into()));
        assert!(summary.recent_deferrals[1].replaced_by.is_none());
    }

    #[test]
    fn reschedules_bucket_lists_replacements_ascending() {
        let mut store = store_with(vec![
            hearing("d1", HearingStatus::Deferred, day(2), day(3)),
            hearing("d2", HearingStatus::Deferred, day(2), day(3)),
            hearing("n-late", HearingStatus::Scheduled, day(28), day(3)),
            hearing("n-soon", HearingStatus::Scheduled, day(18), day(3)),
        ]);
        store
            .link_replacement(&"d1".into(), &"n-late".into(), day(3))
            .unwrap();
        store
            .link_replacement(&"d2".into(), &"n-soon".into(), day(3))
            .unwrap();

        let summary = project(&store, day(10));
        let ids: Vec<&str> = summary
            .recent_reschedules
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, ["n-soon", "n-late"]);
        assert_eq!(summary.recent_reschedules[0].replaces, Some("d2".into()));
    }

    #[test]
    fn projection_is_reproducible() {
        let store = store_with(vec![
            hearing("a", HearingStatus::Scheduled, day(15), day(1)),
            hearing("b", HearingStatus::Deferred, day(5), day(8)),
        ]);
        assert_eq!(project(&store, day(10)), project(&store, day(10)));
    }
}
