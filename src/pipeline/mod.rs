//! Lip-sync pipeline: mode selection and stage orchestration.

pub mod coordinator;
pub mod messages;

pub use coordinator::{LipSyncPipeline, SyncRequest};
pub use messages::{SpeechResponse, SyncMode};
