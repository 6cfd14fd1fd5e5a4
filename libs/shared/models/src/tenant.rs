use serde::Serialize;
use tracing::warn;

use crate::auth::User;
use crate::error::AppError;

/// Records that belong to exactly one branch. Rows with no branch are
/// unassigned and belong to nobody.
pub trait BranchOwned {
    fn branch_id(&self) -> Option<i64>;
}

/// The tenant a request is allowed to read. Every read entry point takes one;
/// there is no unscoped variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BranchScope {
    branch_id: i64,
}

impl BranchScope {
    pub fn new(branch_id: i64) -> Self {
        Self { branch_id }
    }

    /// Derives the scope from the validated token. A user without a branch
    /// assignment cannot read branch data at all.
    pub fn for_user(user: &User) -> Result<Self, AppError> {
        user.branch_id
            .map(Self::new)
            .ok_or_else(|| AppError::Forbidden("User is not assigned to a branch".to_string()))
    }

    pub fn branch_id(&self) -> i64 {
        self.branch_id
    }

    pub fn admits<T: BranchOwned + ?Sized>(&self, record: &T) -> bool {
        record.branch_id() == Some(self.branch_id)
    }

    /// PostgREST filter fragment every branch query carries.
    pub fn filter(&self) -> String {
        format!("branch_id=eq.{}", self.branch_id)
    }

    /// Keeps only this branch's records. The store is already asked for one
    /// branch, so anything dropped here is logged.
    pub fn retain<T: BranchOwned>(&self, records: Vec<T>, kind: &str) -> Vec<T> {
        let total = records.len();
        let kept: Vec<T> = records.into_iter().filter(|r| self.admits(r)).collect();
        if kept.len() != total {
            warn!(
                "Dropped {} {} record(s) outside branch {}",
                total - kept.len(),
                kind,
                self.branch_id
            );
        }
        kept
    }
}
