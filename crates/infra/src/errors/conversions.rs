//! Conversions from external infrastructure errors into domain errors.

use clinicsync_domain::ClinicSyncError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ClinicSyncError);

impl From<InfraError> for ClinicSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ClinicSyncError> for InfraError {
    fn from(value: ClinicSyncError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → ClinicSyncError */
/* -------------------------------------------------------------------------- */

impl From<SqlError> for InfraError {
    fn from(err: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;

        let mapped = match &err {
            SqlError::QueryReturnedNoRows => {
                ClinicSyncError::NotFound("query returned no rows".into())
            }
            SqlError::SqliteFailure(code, message) => {
                let message = message.clone().unwrap_or_default();
                match code.code {
                    ErrorCode::DatabaseBusy => ClinicSyncError::Database("database is busy".into()),
                    ErrorCode::DatabaseLocked => {
                        ClinicSyncError::Database("database is locked".into())
                    }
                    ErrorCode::ConstraintViolation => ClinicSyncError::Database(format!(
                        "constraint violation: {message}"
                    )),
                    _ => ClinicSyncError::Database(message),
                }
            }
            other => ClinicSyncError::Database(other.to_string()),
        };

        InfraError(mapped)
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → ClinicSyncError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(err: r2d2::Error) -> Self {
        InfraError(ClinicSyncError::Database(format!("connection pool error: {err}")))
    }
}

/* -------------------------------------------------------------------------- */
/* tokio::task::JoinError → ClinicSyncError */
/* -------------------------------------------------------------------------- */

impl From<tokio::task::JoinError> for InfraError {
    fn from(err: tokio::task::JoinError) -> Self {
        let mapped = if err.is_cancelled() {
            ClinicSyncError::Internal("blocking task cancelled".into())
        } else {
            ClinicSyncError::Internal(format!("blocking task failed: {err}"))
        };
        InfraError(mapped)
    }
}
