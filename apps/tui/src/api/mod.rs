pub mod client;
pub mod export;
pub mod models;

pub use client::{ApiClient, ApiError, CustomerQuery};
pub use export::{AudienceExport, ExportLinks, TimingFilter};
