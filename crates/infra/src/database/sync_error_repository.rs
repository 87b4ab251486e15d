//! Sync error ledger implementation
//!
//! Durable record of failed calendar propagations. Retry counts only
//! increase and the resolved flag is monotonic, so a crash between the
//! counter update and the retry attempt can never under-count.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clinicsync_core::SyncErrorRepository;
use clinicsync_domain::{ClinicSyncError, NewSyncError, Result, SyncError, SyncErrorCategory};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::manager::{with_connection, DbManager};
use crate::errors::InfraError;

/// SQLite-based sync error ledger
pub struct SqliteSyncErrorRepository {
    db: Arc<DbManager>,
}

impl SqliteSyncErrorRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SyncErrorRepository for SqliteSyncErrorRepository {
    async fn record(&self, error: NewSyncError) -> Result<SyncError> {
        with_connection(&self.db, move |conn| {
            let now = Utc::now();
            let entry = SyncError {
                id: Uuid::now_v7().to_string(),
                appointment_id: error.appointment_id,
                professional_id: error.professional_id,
                user_id: error.user_id,
                category: error.category,
                message: error.message,
                retry_count: 0,
                max_attempts: error.max_attempts,
                resolved: false,
                created_at: now,
                updated_at: now,
            };

            conn.execute(
                "INSERT INTO sync_errors (id, appointment_id, professional_id, user_id,
                                          category, message, retry_count, max_attempts,
                                          resolved, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, 0, ?8, ?8)",
                params![
                    entry.id,
                    entry.appointment_id,
                    entry.professional_id,
                    entry.user_id,
                    entry.category.to_string(),
                    entry.message,
                    entry.max_attempts,
                    now.timestamp(),
                ],
            )
            .map_err(InfraError::from)?;
            Ok(entry)
        })
        .await
    }

    async fn find(&self, error_id: &str) -> Result<SyncError> {
        let error_id = error_id.to_string();
        with_connection(&self.db, move |conn| query_entry(conn, &error_id)).await
    }

    async fn list_unresolved(&self, appointment_id: Option<&str>) -> Result<Vec<SyncError>> {
        let appointment_id = appointment_id.map(str::to_string);
        with_connection(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, appointment_id, professional_id, user_id, category, message,
                            retry_count, max_attempts, resolved, created_at, updated_at
                     FROM sync_errors
                     WHERE resolved = 0 AND (?1 IS NULL OR appointment_id = ?1)
                     ORDER BY created_at DESC, id DESC",
                )
                .map_err(InfraError::from)?;

            let rows = stmt
                .query_map(params![appointment_id], map_sync_error_row)
                .map_err(InfraError::from)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(InfraError::from)?;
            Ok(rows)
        })
        .await
    }

    async fn mark_resolved(&self, error_id: &str) -> Result<()> {
        let error_id = error_id.to_string();
        with_connection(&self.db, move |conn| {
            // Monotonic flag: already-resolved entries are left untouched,
            // so calling twice is safe.
            let changed = conn
                .execute(
                    "UPDATE sync_errors SET resolved = 1, updated_at = ?1
                     WHERE id = ?2 AND resolved = 0",
                    params![Utc::now().timestamp(), error_id],
                )
                .map_err(InfraError::from)?;
            if changed == 0 {
                // Distinguish "already resolved" (fine) from "missing".
                query_entry(conn, &error_id)?;
            }
            Ok(())
        })
        .await
    }

    async fn increment_retry(&self, error_id: &str) -> Result<SyncError> {
        let error_id = error_id.to_string();
        with_connection(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE sync_errors SET retry_count = retry_count + 1, updated_at = ?1
                     WHERE id = ?2",
                    params![Utc::now().timestamp(), error_id],
                )
                .map_err(InfraError::from)?;
            if changed == 0 {
                return Err(ClinicSyncError::NotFound(format!(
                    "sync error {error_id} not found"
                )));
            }
            query_entry(conn, &error_id)
        })
        .await
    }

    async fn update_message(&self, error_id: &str, message: &str) -> Result<()> {
        let error_id = error_id.to_string();
        let message = message.to_string();
        with_connection(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE sync_errors SET message = ?1, updated_at = ?2 WHERE id = ?3",
                    params![message, Utc::now().timestamp(), error_id],
                )
                .map_err(InfraError::from)?;
            if changed == 0 {
                return Err(ClinicSyncError::NotFound(format!(
                    "sync error {error_id} not found"
                )));
            }
            Ok(())
        })
        .await
    }
}

// ============================================================================
// SQL Operations (synchronous)
// ============================================================================

fn query_entry(conn: &Connection, error_id: &str) -> Result<SyncError> {
    conn.query_row(
        "SELECT id, appointment_id, professional_id, user_id, category, message,
                retry_count, max_attempts, resolved, created_at, updated_at
         FROM sync_errors WHERE id = ?1",
        params![error_id],
        map_sync_error_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            ClinicSyncError::NotFound(format!("sync error {error_id} not found"))
        }
        other => InfraError::from(other).into(),
    })
}

fn map_sync_error_row(row: &Row<'_>) -> rusqlite::Result<SyncError> {
    let category_raw: String = row.get(4)?;
    let category = SyncErrorCategory::from_str(&category_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())),
        )
    })?;

    Ok(SyncError {
        id: row.get(0)?,
        appointment_id: row.get(1)?,
        professional_id: row.get(2)?,
        user_id: row.get(3)?,
        category,
        message: row.get(5)?,
        retry_count: row.get(6)?,
        max_attempts: row.get(7)?,
        resolved: row.get(8)?,
        created_at: epoch(row, 9)?,
        updated_at: epoch(row, 10)?,
    })
}

fn epoch(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(idx)?;
    DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Integer,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("timestamp {secs} out of range"),
            )),
        )
    })
}

// ============================================================================
// Tests
// ============================================================================
