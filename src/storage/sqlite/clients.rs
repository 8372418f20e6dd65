//! SQLite implementation for client record storage

use crate::errors::StorageError;
use crate::oauth::types::ClientStatus;
use crate::storage::client_record::ClientRecord;
use crate::storage::traits::{ClientRecordStore, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

/// SQLite implementation of `ClientRecordStore`
pub struct SqliteClientStore {
    pool: SqlitePool,
}

impl SqliteClientStore {
    /// Create a new SQLite client store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run the bundled SQLite migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations/sqlite")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Migration failed: {}", e)))?;
        Ok(())
    }

    fn get_column<T>(row: &SqliteRow, column: &str) -> Result<T>
    where
        T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
    {
        row.try_get(column)
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get {}: {}", column, e)))
    }

    fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(value)
            .map_err(|e| StorageError::InvalidData(format!("Invalid {} timestamp: {}", column, e)))?
            .with_timezone(&Utc))
    }

    /// Convert SQLite row to ClientRecord
    fn row_to_client_record(row: &SqliteRow) -> Result<ClientRecord> {
        let created_at: String = Self::get_column(row, "cr_dtimes")?;
        let updated_at: Option<String> = Self::get_column(row, "upd_dtimes")?;

        Ok(ClientRecord {
            id: Self::get_column(row, "id")?,
            name: Self::get_column(row, "name")?,
            rp_id: Self::get_column(row, "rp_id")?,
            logo_uri: Self::get_column(row, "logo_uri")?,
            public_key: Self::get_column(row, "public_key")?,
            redirect_uris: Self::get_column(row, "redirect_uris")?,
            claims: Self::get_column(row, "claims")?,
            acr_values: Self::get_column(row, "acr_values")?,
            grant_types: Self::get_column(row, "grant_types")?,
            client_auth_methods: Self::get_column(row, "auth_methods")?,
            status: Self::get_column(row, "status")?,
            created_at: Self::parse_timestamp("cr_dtimes", &created_at)?,
            updated_at: updated_at
                .as_deref()
                .map(|value| Self::parse_timestamp("upd_dtimes", value))
                .transpose()?,
        })
    }
}

#[async_trait]
impl ClientRecordStore for SqliteClientStore {
    async fn find_client(&self, client_id: &str) -> Result<Option<ClientRecord>> {
        let row = sqlx::query("SELECT * FROM client_detail WHERE id = ?")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        row.as_ref().map(Self::row_to_client_record).transpose()
    }

    async fn find_client_with_status(
        &self,
        client_id: &str,
        status: ClientStatus,
    ) -> Result<Option<ClientRecord>> {
        let row = sqlx::query("SELECT * FROM client_detail WHERE id = ? AND status = ?")
            .bind(client_id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        row.as_ref().map(Self::row_to_client_record).transpose()
    }

    async fn insert_client(&self, record: &ClientRecord) -> Result<ClientRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO client_detail (
                id, name, rp_id, logo_uri, public_key, redirect_uris, claims,
                acr_values, grant_types, auth_methods, status, cr_dtimes, upd_dtimes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.rp_id)
        .bind(&record.logo_uri)
        .bind(&record.public_key)
        .bind(&record.redirect_uris)
        .bind(&record.claims)
        .bind(&record.acr_values)
        .bind(&record.grant_types)
        .bind(&record.client_auth_methods)
        .bind(&record.status)
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.map(|value| value.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::AlreadyExists(record.id.clone()));
        }

        Ok(record.clone())
    }

    async fn save_client(&self, record: &ClientRecord) -> Result<ClientRecord> {
        let result = sqlx::query(
            r#"
            UPDATE client_detail SET
                name = ?, rp_id = ?, logo_uri = ?, public_key = ?, redirect_uris = ?,
                claims = ?, acr_values = ?, grant_types = ?, auth_methods = ?,
                status = ?, upd_dtimes = ?
            WHERE id = ?
            "#,
        )
        .bind(&record.name)
        .bind(&record.rp_id)
        .bind(&record.logo_uri)
        .bind(&record.public_key)
        .bind(&record.redirect_uris)
        .bind(&record.claims)
        .bind(&record.acr_values)
        .bind(&record.grant_types)
        .bind(&record.client_auth_methods)
        .bind(&record.status)
        .bind(record.updated_at.map(|value| value.to_rfc3339()))
        .bind(&record.id)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(record.id.clone()));
        }

        Ok(record.clone())
    }
}
