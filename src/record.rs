//! Raw fetched records and the fetch boundary.
//!
//! The HTTP client that talks to the legislative-records API lives outside
//! this crate; it hands over [`RawRecord`]s through the [`Fetcher`] trait.
//! Records are validated individually; one malformed record is skipped and
//! logged, never fatal to the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FetchError, RecordError};
use crate::hearing::HearingId;

/// A hearing record as fetched from the source API, before validation.
///
/// Every field the core cares about is optional here; the source system is
/// not trusted to be complete. Unrecognized fields ride along in `extra` and
/// are carried into the store on insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Source-system id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Name of the governing body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committee: Option<String>,

    /// Topic text of the matter under consideration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// Date/time of the meeting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<DateTime<Utc>>,

    /// Source fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A fetched record that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRecord {
    /// Source-system id.
    pub id: HearingId,
    /// Name of the governing body. May be empty when the source omits it;
    /// matching still requires committee equality, so an empty committee only
    /// ever matches another empty one.
    pub committee: String,
    /// Topic text.
    pub topic: String,
    /// Meeting date/time.
    pub scheduled_date: DateTime<Utc>,
    /// Passthrough source fields.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RawRecord {
    /// Validates the record for reconciliation.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` when the id, topic, or scheduled date is missing
    /// or blank. Callers skip such records and log `skipped_invalid_record`.
    pub fn validate(&self) -> Result<ValidRecord, RecordError> {
        let id = match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(RecordError::MissingId),
        };

        let topic = match self.topic.as_deref().map(str::trim) {
            Some(topic) if !topic.is_empty() => topic.to_string(),
            _ => return Err(RecordError::MissingTopic { id }),
        };

        let Some(scheduled_date) = self.scheduled_date else {
            return Err(RecordError::MissingDate { id });
        };

        let committee = self
            .committee
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        Ok(ValidRecord {
            id: HearingId::new(id),
            committee,
            topic,
            scheduled_date,
            extra: self.extra.clone(),
        })
    }
}

/// The external fetch collaborator.
///
/// Implementations own transport, pagination, and retry policy. The core
/// only requires that a failure is reported as [`FetchError`], which aborts
/// the run before any store mutation, rather than as an empty batch.
pub trait Fetcher {
    /// Fetches records from `lookback_days` in the past through the open
    /// future.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport or response-parse failure.
    fn fetch_upcoming(&self, lookback_days: u32) -> Result<Vec<RawRecord>, FetchError>;
}
