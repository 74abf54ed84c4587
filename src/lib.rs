//! # docketwatch - City-Council Hearing Monitor Core
//!
//! docketwatch tracks hearing events published through a legislative-records
//! API, detects when a hearing is newly scheduled, deferred, or rescheduled,
//! and links a deferred hearing to the hearing that later replaces it.
//!
//! The hard part is not the API call or the page rendering — those stay
//! outside this crate, behind the [`record::Fetcher`] trait and the
//! serializable [`summary::Summary`]. The core is the reconciliation engine:
//! given a freshly fetched snapshot and the persisted history, compute the
//! minimal correct state transition for every hearing, pairing deferrals
//! with their replacements by exact topic identity, idempotent across
//! repeated runs.
//!
//! ## Core Concepts
//!
//! - **Hearing**: one agenda item on a committee's meeting calendar
//! - **Deferral**: a hearing removed from its date without an announced
//!   successor
//! - **Match**: linking a deferred hearing to the new hearing that continues
//!   its topic
//! - **Change log**: the ordered record of detected transitions between runs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docketwatch::{monitor, FileStore, MonitorConfig};
//! use chrono::Utc;
//!
//! let config = MonitorConfig::from_file("config.json")?;
//! let store = FileStore::new("data/seen_hearings.json");
//! let outcome = monitor::run_once(&api_client, &store, &config, Utc::now())?;
//! render(&outcome.summary);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod change;
pub mod config;
pub mod error;
pub mod hearing;
pub mod matcher;
pub mod monitor;
pub mod reconcile;
pub mod record;
pub mod store;
pub mod summary;

// Re-export primary types at crate root for convenience
pub use change::{ChangeEntry, ChangeKind};
pub use config::MonitorConfig;
pub use error::{
    ConfigError, FetchError, MonitorError, MonitorResult, RecordError, StoreError,
};
pub use hearing::{Hearing, HearingId, HearingStatus};
pub use matcher::MatchDecision;
pub use monitor::{RunId, RunOutcome};
pub use reconcile::ReconcileOutcome;
pub use record::{Fetcher, RawRecord};
pub use store::{FileStore, Store};
pub use summary::{Summary, SummaryItem};
