use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Constraint violated: {0}")]
    Constraint(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_foreign_key_violation()
                || db_err.is_unique_violation()
                || db_err.is_check_violation()
            {
                return Self::Constraint(db_err.message().to_string());
            }
        }
        Self::Database(err)
    }
}
