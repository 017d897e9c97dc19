//! HTTP request handlers.

mod health;
pub(crate) mod problem_details;
mod reports;
mod snapshots;
mod version;

pub use health::{health, livez};
pub use reports::{get_report, list_reports, submit_report};
pub use snapshots::{download_snapshot, snapshot_exists, upload_snapshot};
pub use version::version;
