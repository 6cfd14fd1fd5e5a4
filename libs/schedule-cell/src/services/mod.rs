pub mod availability;
pub mod catalogue;
pub mod merge;
pub mod schedule;
pub mod snapshot;
pub mod store;
pub mod weekly;

pub use availability::resolve_availability;
pub use merge::merge_contiguous;
pub use schedule::ScheduleService;
pub use snapshot::BranchSnapshot;
pub use store::{DoctorFilter, ScheduleFilter, ScheduleStore, SupabaseScheduleStore};
