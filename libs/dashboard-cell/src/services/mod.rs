pub mod dashboard;
pub mod stats;

pub use dashboard::DashboardService;
pub use stats::{doctor_stats, growth_rate, latest_appointments, summarize, Period, ReportingPeriods};
