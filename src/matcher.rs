//! Replacement matching for deferred hearings.
//!
//! Given a deferred hearing and the set of hearings newly observed in the
//! current fetch, decide whether one of them is the deferral's rescheduled
//! counterpart. Pure and deterministic: no hidden state, no I/O.

use crate::hearing::{Hearing, HearingId, HearingStatus};

/// Outcome of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDecision {
    /// The new hearing that continues the deferred one.
    pub replacement: HearingId,

    /// True when more than one candidate qualified and the earliest-dated
    /// one was selected. Surfaced as `ambiguous_match` in the change log so
    /// a human reviewer can audit the decision.
    pub ambiguous: bool,
}

/// Returns true if `candidate` could be the replacement for `deferred`.
///
/// The policy is deliberately exact: same committee, same normalized topic,
/// different id, and a date strictly after the deferred hearing's date.
/// Candidates re-listed with an earlier-or-equal date are excluded as the
/// conservative reading of upstream behavior.
#[must_use]
pub fn is_candidate(deferred: &Hearing, candidate: &Hearing) -> bool {
    candidate.id != deferred.id
        && candidate.status == HearingStatus::Scheduled
        && candidate.replaces.is_none()
        && candidate.committee == deferred.committee
        && candidate.topic_key() == deferred.topic_key()
        && candidate.scheduled_date > deferred.scheduled_date
}

/// Decides whether some hearing in `candidates` replaces `deferred`.
///
/// With multiple qualifying candidates (the same committee re-lists the
/// identical topic twice before resolution), the earliest `scheduled_date`
/// wins, tie-broken by lowest id, and the decision is flagged ambiguous.
#[must_use]
pub fn find_replacement<'a, I>(deferred: &Hearing, candidates: I) -> Option<MatchDecision>
where
    I: IntoIterator<Item = &'a Hearing>,
{
    let mut qualifying: Vec<&Hearing> = candidates
        .into_iter()
        .filter(|c| is_candidate(deferred, c))
        .collect();

    if qualifying.is_empty() {
        return None;
    }

    qualifying.sort_by(|a, b| {
        a.scheduled_date
            .cmp(&b.scheduled_date)
            .then_with(|| a.id.cmp(&b.id))
    });

    Some(MatchDecision {
        replacement: qualifying[0].id.clone(),
        ambiguous: qualifying.len() > 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 10, 0, 0).unwrap()
    }

    fn hearing(id: &str, committee: &str, topic: &str, date: DateTime<Utc>) -> Hearing {
        Hearing {
            id: id.into(),
            committee: committee.to_string(),
            topic: topic.to_string(),
            scheduled_date: date,
            status: HearingStatus::Scheduled,
            first_seen_at: day(1),
            last_updated_at: day(1),
            replaced_by: None,
            replaces: None,
            extra: serde_json::Map::new(),
        }
    }

    fn deferred(id: &str, committee: &str, topic: &str, date: DateTime<Utc>) -> Hearing {
        Hearing {
            status: HearingStatus::Deferred,
            ..hearing(id, committee, topic, date)
        }
    }

    #[test]
    fn single_candidate_matches() {
        let d = deferred("h1", "Finance", "Budget Modification No. 4", day(1));
        let n = hearing("h2", "Finance", "Budget Modification No. 4", day(15));
        let decision = find_replacement(&d, [&n]).unwrap();
        assert_eq!(decision.replacement, "h2".into());
        assert!(!decision.ambiguous);
    }

    #[test]
    fn topic_differing_by_one_character_never_matches() {
        let d = deferred("h1", "Finance", "Budget Modification No. 4", day(1));
        let n = hearing("h2", "Finance", "Budget Modification No. 5", day(15));
        assert!(find_replacement(&d, [&n]).is_none());
    }

    #[test]
    fn committee_must_match_even_with_identical_topic() {
        let d = deferred("h1", "Finance", "Budget Modification No. 4", day(1));
        let n = hearing("h2", "Land Use", "Budget Modification No. 4", day(15));
        assert!(find_replacement(&d, [&n]).is_none());
    }

    #[test]
    fn earlier_or_equal_dates_are_excluded() {
        let d = deferred("h1", "Finance", "Budget Modification No. 4", day(10));
        let same_day = hearing("h2", "Finance", "Budget Modification No. 4", day(10));
        let earlier = hearing("h3", "Finance", "Budget Modification No. 4", day(5));
        assert!(find_replacement(&d, [&same_day, &earlier]).is_none());
    }

    #[test]
    fn whitespace_and_dash_variants_still_match() {
        let d = deferred("h1", "Finance", "Oversight – Street  Safety", day(1));
        let n = hearing("h2", "Finance", "Oversight - Street Safety", day(15));
        assert!(find_replacement(&d, [&n]).is_some());
    }

    #[test]
    fn ambiguity_picks_earliest_date_and_flags() {
        let d = deferred("h1", "Finance", "Budget Modification No. 4", day(1));
        let late = hearing("h2", "Finance", "Budget Modification No. 4", day(20));
        let early = hearing("h3", "Finance", "Budget Modification No. 4", day(10));
        let decision = find_replacement(&d, [&late, &early]).unwrap();
        assert_eq!(decision.replacement, "h3".into());
        assert!(decision.ambiguous);
    }

    #[test]
    fn date_tie_breaks_on_lowest_id() {
        let d = deferred("h1", "Finance", "Budget Modification No. 4", day(1));
        let b = hearing("hb", "Finance", "Budget Modification No. 4", day(10));
        let a = hearing("ha", "Finance", "Budget Modification No. 4", day(10));
        let decision = find_replacement(&d, [&b, &a]).unwrap();
        assert_eq!(decision.replacement, "ha".into());
        assert!(decision.ambiguous);
    }

    #[test]
    fn already_used_replacement_is_skipped() {
        let d = deferred("h1", "Finance", "Budget Modification No. 4", day(1));
        let mut n = hearing("h2", "Finance", "Budget Modification No. 4", day(15));
        n.replaces = Some("h0".into());
        assert!(find_replacement(&d, [&n]).is_none());
    }

    #[test]
    fn deferred_hearing_never_matches_itself() {
        let d = deferred("h1", "Finance", "Budget Modification No. 4", day(1));
        let mut same = hearing("h1", "Finance", "Budget Modification No. 4", day(15));
        same.status = HearingStatus::Scheduled;
        assert!(find_replacement(&d, [&same]).is_none());
    }
}
