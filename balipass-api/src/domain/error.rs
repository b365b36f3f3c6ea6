use thiserror::Error;

use crate::repositories::RepositoryError;

/// Failure taxonomy of the planner services.
///
/// `Validation` is raised before any query is issued; the remaining
/// variants surface storage outcomes. Callers keep their last-known-good
/// state on any of these: caches are only touched after a successful
/// round trip.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("persistence failure: {0}")]
    Persistence(#[source] RepositoryError),
}

impl From<RepositoryError> for PlannerError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => Self::NotFound(what),
            RepositoryError::Constraint(what) => Self::Constraint(what),
            RepositoryError::Database(_) => Self::Persistence(err),
        }
    }
}
