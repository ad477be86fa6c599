// Library surface shared by the binary and tests
pub mod api;
pub mod config;
pub mod domain;
pub mod format;
pub mod sync;
pub mod view;

pub use api::{ApiClient, ApiError};
pub use domain::{Decision, Segment, TimingSegment};
pub use sync::{SyncController, SyncEffect, SyncEvent, SyncState};
