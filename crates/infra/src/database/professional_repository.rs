//! Professional repository implementation

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use clinicsync_core::ProfessionalRepository;
use clinicsync_domain::{ClinicSyncError, Professional, Result};
use rusqlite::{params, Row};

use super::manager::{with_connection, DbManager};
use crate::errors::InfraError;

/// SQLite-based professional repository
pub struct SqliteProfessionalRepository {
    db: Arc<DbManager>,
}

impl SqliteProfessionalRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfessionalRepository for SqliteProfessionalRepository {
    async fn get_professional(&self, professional_id: &str) -> Result<Professional> {
        let professional_id = professional_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.query_row(
                "SELECT id, user_id, display_name, time_zone, active, calendar_refresh_token
                 FROM professionals WHERE id = ?1",
                params![professional_id],
                map_professional_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => ClinicSyncError::NotFound(format!(
                    "professional {professional_id} not found"
                )),
                other => InfraError::from(other).into(),
            })
        })
        .await
    }

    async fn set_refresh_token(&self, professional_id: &str, refresh_token: &str) -> Result<()> {
        let professional_id = professional_id.to_string();
        let refresh_token = refresh_token.to_string();
        with_connection(&self.db, move |conn| {
            update_refresh_token(conn, &professional_id, Some(&refresh_token))
        })
        .await
    }

    async fn clear_refresh_token(&self, professional_id: &str) -> Result<()> {
        let professional_id = professional_id.to_string();
        with_connection(&self.db, move |conn| {
            update_refresh_token(conn, &professional_id, None)
        })
        .await
    }
}

fn update_refresh_token(
    conn: &rusqlite::Connection,
    professional_id: &str,
    refresh_token: Option<&str>,
) -> Result<()> {
    let now = Utc::now().timestamp();
    let changed = conn
        .execute(
            "UPDATE professionals SET calendar_refresh_token = ?1, updated_at = ?2
             WHERE id = ?3",
            params![refresh_token, now, professional_id],
        )
        .map_err(InfraError::from)?;
    if changed == 0 {
        return Err(ClinicSyncError::NotFound(format!(
            "professional {professional_id} not found"
        )));
    }
    Ok(())
}

fn map_professional_row(row: &Row<'_>) -> rusqlite::Result<Professional> {
    Ok(Professional {
        id: row.get(0)?,
        user_id: row.get(1)?,
        display_name: row.get(2)?,
        time_zone: row.get(3)?,
        active: row.get(4)?,
        calendar_refresh_token: row.get(5)?,
    })
}
