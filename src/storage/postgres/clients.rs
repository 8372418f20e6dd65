//! PostgreSQL implementation for client record storage

use crate::errors::StorageError;
use crate::oauth::types::ClientStatus;
use crate::storage::client_record::ClientRecord;
use crate::storage::traits::{ClientRecordStore, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};

/// PostgreSQL implementation of `ClientRecordStore`
pub struct PostgresClientStore {
    pool: PgPool,
}

impl PostgresClientStore {
    /// Create a new PostgreSQL client store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the bundled PostgreSQL migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations/postgres")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Migration failed: {}", e)))?;
        Ok(())
    }

    fn get_column<T>(row: &PgRow, column: &str) -> Result<T>
    where
        T: for<'r> sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        row.try_get(column)
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get {}: {}", column, e)))
    }

    /// Convert PostgreSQL row to ClientRecord
    fn row_to_client_record(row: &PgRow) -> Result<ClientRecord> {
        let created_at: DateTime<Utc> = Self::get_column(row, "cr_dtimes")?;
        let updated_at: Option<DateTime<Utc>> = Self::get_column(row, "upd_dtimes")?;

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
            created_at,
            updated_at,
        })
    }
}

#[async_trait]
impl ClientRecordStore for PostgresClientStore {
    async fn find_client(&self, client_id: &str) -> Result<Option<ClientRecord>> {
        let row = sqlx::query("SELECT * FROM client_detail WHERE id = $1")
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
        let row = sqlx::query("SELECT * FROM client_detail WHERE id = $1 AND status = $2")
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
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO NOTHING
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
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::AlreadyExists(record.id.clone()));
        }

        Ok(record.clone())
    }

    async fn save_client(&self, record: &ClientRecord) -> Result<ClientRecord> {
        let row = sqlx::query(
            r#"
            UPDATE client_detail SET
                name = $1, rp_id = $2, logo_uri = $3, public_key = $4, redirect_uris = $5,
                claims = $6, acr_values = $7, grant_types = $8, auth_methods = $9,
                status = $10, upd_dtimes = $11
            WHERE id = $12
            RETURNING *
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
        .bind(record.updated_at)
        .bind(&record.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => Self::row_to_client_record(&row),
            None => Err(StorageError::NotFound(record.id.clone())),
        }
    }
}
