//! Hearing types and identity.
//!
//! A hearing is one agenda item tied to a committee meeting. Its id comes
//! from the source system and never changes; its topic text is the identity
//! key used to pair a deferred hearing with the hearing that replaces it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier assigned by the source system.
///
/// Ids are opaque strings and are ordered lexicographically; that ordering is
/// the deterministic tie-break used throughout matching and the change log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HearingId(String);

impl HearingId {
    /// Creates an id from the source system's raw identifier.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HearingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for HearingId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for HearingId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Lifecycle state of a hearing.
///
/// `Rescheduled` never comes out of the reconciler (a replacement hearing
/// keeps `Scheduled` and carries `replaces` instead) but it is accepted on
/// load so older store files keep round-tripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HearingStatus {
    /// On the calendar with a known future (or original) date.
    Scheduled,
    /// Removed from its date without an announced successor.
    Deferred,
    /// Legacy state for a hearing that continues a deferred one.
    Rescheduled,
    /// The meeting date has passed; terminal.
    Held,
}

impl HearingStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Deferred => "deferred",
            Self::Rescheduled => "rescheduled",
            Self::Held => "held",
        }
    }
}

impl TryFrom<String> for HearingStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("scheduled") {
            Ok(Self::Scheduled)
        } else if value.eq_ignore_ascii_case("deferred") {
            Ok(Self::Deferred)
        } else if value.eq_ignore_ascii_case("rescheduled") {
            Ok(Self::Rescheduled)
        } else if value.eq_ignore_ascii_case("held") {
            Ok(Self::Held)
        } else {
            Err(format!(
                "unknown hearing status: {value}. Expected scheduled, deferred, rescheduled, or held"
            ))
        }
    }
}

impl From<HearingStatus> for String {
    fn from(value: HearingStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for HearingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalizes topic text for identity comparison.
///
/// Runs of whitespace collapse to single spaces, en-dash spacing is folded
/// into hyphen spacing, and the result is lowercased. Matching is exact
/// equality on this form; deliberately not fuzzy, so unrelated agenda items
/// are never silently linked.
#[must_use]
pub fn normalize_topic(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace(" –", " -").replace("– ", "- ").to_lowercase()
}

/// One agenda item on a committee's meeting calendar.
///
/// `replaces` and `replaced_by` are weak references — plain id lookups into
/// the store map, never owned pointers. They are only ever written as a pair
/// through [`crate::store::Store::link_replacement`], which keeps the mutual
/// consistency invariant: if `A.replaced_by == B` then `B.replaces == A`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hearing {
    /// Source-system id, unique within the store.
    pub id: HearingId,

    /// Name of the governing body.
    pub committee: String,

    /// Text of the matter under consideration; the matching identity key.
    pub topic: String,

    /// Date/time of the meeting as currently known.
    pub scheduled_date: DateTime<Utc>,

    /// Lifecycle state (see the reconciler's transition table).
    pub status: HearingStatus,

    /// When this hearing first appeared in a fetch.
    pub first_seen_at: DateTime<Utc>,

    /// When this hearing last changed state or details.
    pub last_updated_at: DateTime<Utc>,

    /// Id of the hearing that supersedes this one after a deferral.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced_by: Option<HearingId>,

    /// Inverse of `replaced_by`: the deferred hearing this one continues.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<HearingId>,

    /// Fields persisted by other (possibly newer) versions of this crate.
    /// Preserved verbatim instead of being dropped.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Hearing {
    /// Returns the normalized topic used for identity comparison.
    #[must_use]
    pub fn topic_key(&self) -> String {
        normalize_topic(&self.topic)
    }
}
