//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod node_death_repo;
pub mod report_exception_repo;
pub mod status_report_repo;
pub mod task_progress_repo;
pub mod traffic_sample_repo;

pub use node_death_repo::NodeDeathRepo;
pub use report_exception_repo::ReportExceptionRepo;
pub use status_report_repo::StatusReportRepo;
pub use task_progress_repo::TaskProgressRepo;
pub use traffic_sample_repo::TrafficSampleRepo;
