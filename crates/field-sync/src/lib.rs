//! Client side of AgriLog field capture.
//!
//! - [`wizard`]: the step machine a farmer or extension worker walks to
//!   record one activity.
//! - [`queue`]: entries saved while offline, persisted as a JSON file.
//! - [`sync`]: sequential replay of the queue once a connection returns.
//! - [`client`]: the HTTP client used as the replay target.

pub mod client;
pub mod error;
pub mod payload;
pub mod queue;
pub mod sync;
pub mod wizard;

pub use client::AgrilogClient;
pub use error::SyncError;
pub use payload::{NewActivityPayload, SyncStatus};
pub use queue::{OfflineQueue, QueuedEntry};
pub use sync::{flush, ActivitySink, FlushReport, SyncManager};
pub use wizard::{
    ActivityDetails, ActivityWizard, EvidenceKind, Transition, WizardMode, WizardStep,
};
