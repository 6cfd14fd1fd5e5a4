pub mod auth;
pub mod error;
pub mod lifecycle;
pub mod tenant;

pub use lifecycle::{RecordStatus, SoftDelete};
pub use tenant::{BranchOwned, BranchScope};
