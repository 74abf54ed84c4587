//! Error types for docketwatch.
//!
//! All errors are strongly typed using thiserror. Per-record problems are
//! recoverable and never abort a run; whole-batch and store problems abort
//! the run before any mutation is persisted.

use thiserror::Error;

use crate::hearing::HearingId;

/// Errors from the external fetch collaborator.
///
/// A fetch error means "no data" — the reconciler must leave the persisted
/// store untouched rather than inferring mass deferrals from an empty batch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The transport layer failed (connection, HTTP status, timeout).
    #[error("fetch transport failure: {message}")]
    Transport { message: String },

    /// The response arrived but could not be parsed into records.
    #[error("fetch response unparseable: {message}")]
    Malformed { message: String },
}

/// Errors from the persisted event store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The persisted structure could not be parsed, or its invariants do not
    /// hold. Surfaced to the caller; never silently replaced with an empty
    /// store.
    #[error("corrupt store state: {reason}")]
    CorruptState { reason: String },

    /// Filesystem failure while reading or writing the store.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A link operation referenced a hearing that is not in the store.
    #[error("hearing not found: {0}")]
    HearingNotFound(HearingId),

    /// A link operation would overwrite an existing replacement link.
    #[error("hearing {id} is already linked to {existing}")]
    AlreadyLinked { id: HearingId, existing: HearingId },
}

impl StoreError {
    /// Creates a corrupt-state error.
    #[must_use]
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptState {
            reason: reason.into(),
        }
    }
}

/// A single malformed fetched record. Recovered locally by skipping the
/// record; the rest of the batch is processed normally.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The record has no usable id.
    #[error("record is missing an id")]
    MissingId,

    /// The record has no usable topic text.
    #[error("record {id} is missing a topic")]
    MissingTopic { id: String },

    /// The record has no usable scheduled date.
    #[error("record {id} is missing a scheduled date")]
    MissingDate { id: String },
}

/// Errors from the configuration surface.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("config file unreadable: {0}")]
    Io(#[from] std::io::Error),

    /// The config file exists but is not valid JSON.
    #[error("config file unparseable: {0}")]
    Parse(#[from] serde_json::Error),

    /// `lookback_days` is outside the accepted range.
    #[error("lookback_days must be at least {min} (got {value})")]
    LookbackOutOfRange { value: u32, min: u32 },
}

/// Top-level error type for a monitor run.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// External fetch failed; the run aborts with the store untouched.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Store load, validation, or save failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration could not be loaded or validated.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The fetch succeeded but returned no records while the prior store is
    /// non-empty. Treated like a fetch failure: an empty pull is not
    /// evidence that every hearing was deferred.
    #[error("empty fetch against a store of {prior_hearings} hearings; aborting without mutation")]
    EmptyFetch { prior_hearings: usize },
}

impl MonitorError {
    /// Returns true if this is a fetch error (including the empty-fetch guard).
    #[must_use]
    pub const fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::EmptyFetch { .. })
    }

    /// Returns true if this is a store error.
    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns true if the persisted store is unreadable rather than merely
    /// unavailable.
    #[must_use]
    pub const fn is_corrupt_state(&self) -> bool {
        matches!(self, Self::Store(StoreError::CorruptState { .. }))
    }
}

/// Result type alias for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_message_carries_detail() {
        let err = FetchError::Transport {
            message: "connection refused".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn corrupt_state_is_detectable_at_top_level() {
        let err: MonitorError = StoreError::corrupt("truncated JSON").into();
        assert!(err.is_store());
        assert!(err.is_corrupt_state());
        assert!(!err.is_fetch());
        assert!(format!("{err}").contains("truncated JSON"));
    }

    #[test]
    fn empty_fetch_counts_as_fetch_failure() {
        let err = MonitorError::EmptyFetch { prior_hearings: 12 };
        assert!(err.is_fetch());
        assert!(!err.is_corrupt_state());
        assert!(format!("{err}").contains("12"));
    }

    #[test]
    fn record_errors_name_the_offending_record() {
        let err = RecordError::MissingTopic {
            id: "ev-991".to_string(),
        };
        assert!(format!("{err}").contains("ev-991"));
    }

    #[test]
    fn config_range_error_reports_value() {
        let err = ConfigError::LookbackOutOfRange { value: 0, min: 1 };
        let msg = format!("{err}");
        assert!(msg.contains("at least 1"));
        assert!(msg.contains("(got 0)"));
    }
}
