use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Unique constraints on `users` the service layer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Id,
    Email,
}

/// Database layer errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    DatabaseError(DieselError),

    #[error("Pool error: {0}")]
    PoolError(#[from] diesel_async::pooled_connection::bb8::RunError),

    #[error("Unique constraint violated on {0:?}")]
    UniqueViolation(UniqueField),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    CoreError(#[from] elevate_core::error::CoreError),
}

impl From<DieselError> for DbError {
    fn from(err: DieselError) -> Self {
        if let DieselError::DatabaseError(kind, info) = &err {
            match (kind, info.constraint_name()) {
                (DatabaseErrorKind::UniqueViolation, Some("users_email_key")) => {
                    return Self::UniqueViolation(UniqueField::Email);
                }
                (DatabaseErrorKind::UniqueViolation, Some("users_pkey")) => {
                    return Self::UniqueViolation(UniqueField::Id);
                }
                (DatabaseErrorKind::ForeignKeyViolation, constraint) => {
                    return Self::ForeignKeyViolation(constraint.unwrap_or("unknown").to_string());
                }
                _ => {}
            }
        }
        Self::DatabaseError(err)
    }
}

pub type DbResult<T> = std::result::Result<T, DbError>;
