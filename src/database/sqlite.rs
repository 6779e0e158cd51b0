// ABOUTME: SQLite-backed sync store built on sqlx
// ABOUTME: Owns the schema for configurations, glucose readings, and the unified patient registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use tracing::{debug, info};
use uuid::Uuid;

use super::SyncStore;
use crate::errors::{StoreError, StoreResult};
use crate::models::{
    ConfigurationFilter, ConfigurationUpdate, ConnectionStatus, GlucoseRecord, ProviderKind,
    SyncConfiguration, UpsertOutcome,
};

const MAX_FILE_CONNECTIONS: u32 = 5;

const CONFIGURATION_COLUMNS: &str = "id, patient_phone, patient_phone_normalized, \
    unified_patient_id, patient_name, patient_mrn, sync_enabled, dexcom_username, \
    dexcom_password_encrypted, libre_email, libre_password_encrypted, libre_region, \
    nightscout_url, nightscout_api_secret_encrypted, connection_status, sync_error_count, \
    last_sync_error, last_sync_attempt_at, last_successful_sync_at, created_at, updated_at";

const READING_COLUMNS: &str = "natural_id, config_id, unified_patient_id, patient_phone, \
    patient_name, patient_mrn, glucose_value, glucose_units, trend_direction, trend_arrow, \
    reading_timestamp, device_name, data_source, sync_batch_id, fetched_at";

/// Sync store over a SQLite pool
#[derive(Clone)]
pub struct SqliteSyncStore {
    pool: Pool<Sqlite>,
}

impl SqliteSyncStore {
    /// Connect to `database_url`, creating the file if needed, and migrate
    ///
    /// In-memory URLs get a single long-lived connection so every query sees
    /// the same database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed, the connection fails, or the
    /// schema cannot be created
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let in_memory = database_url.contains(":memory:");

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(MAX_FILE_CONNECTIONS)
        };
        let pool = pool_options.connect_with(options).await?;

        let store = Self { pool };
        store.migrate().await?;
        info!(in_memory, "CGM sync store ready");
        Ok(store)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Create tables and indexes if they do not exist
    ///
    /// # Errors
    ///
    /// Returns an error if a DDL statement fails
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS cgm_sync_configurations (
                id TEXT PRIMARY KEY,
                patient_phone TEXT NOT NULL,
                patient_phone_normalized TEXT NOT NULL,
                unified_patient_id TEXT,
                patient_name TEXT,
                patient_mrn TEXT,
                sync_enabled BOOLEAN NOT NULL DEFAULT 1,
                dexcom_username TEXT,
                dexcom_password_encrypted TEXT,
                libre_email TEXT,
                libre_password_encrypted TEXT,
                libre_region TEXT,
                nightscout_url TEXT,
                nightscout_api_secret_encrypted TEXT,
                connection_status TEXT NOT NULL DEFAULT 'active'
                    CHECK (connection_status IN ('active', 'unauthorized', 'error')),
                sync_error_count INTEGER NOT NULL DEFAULT 0,
                last_sync_error TEXT,
                last_sync_attempt_at DATETIME,
                last_successful_sync_at DATETIME,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_cgm_configs_phone ON cgm_sync_configurations(patient_phone)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_cgm_configs_phone_normalized ON cgm_sync_configurations(patient_phone_normalized)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS cgm_glucose_readings (
                natural_id TEXT NOT NULL UNIQUE,
                config_id TEXT NOT NULL REFERENCES cgm_sync_configurations(id),
                unified_patient_id TEXT,
                patient_phone TEXT NOT NULL,
                patient_name TEXT,
                patient_mrn TEXT,
                glucose_value REAL NOT NULL,
                glucose_units TEXT NOT NULL,
                trend_direction TEXT,
                trend_arrow TEXT,
                reading_timestamp DATETIME NOT NULL,
                device_name TEXT,
                data_source TEXT NOT NULL,
                sync_batch_id TEXT NOT NULL,
                fetched_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_cgm_readings_phone_time ON cgm_glucose_readings(patient_phone, reading_timestamp)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS unified_patients (
                id TEXT PRIMARY KEY,
                phone_normalized TEXT NOT NULL UNIQUE,
                full_name TEXT,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Provision a configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including on a duplicate id
    pub async fn insert_configuration(&self, config: &SyncConfiguration) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO cgm_sync_configurations ({CONFIGURATION_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&config.id)
        .bind(&config.patient_phone)
        .bind(&config.patient_phone_normalized)
        .bind(&config.unified_patient_id)
        .bind(&config.patient_name)
        .bind(&config.patient_mrn)
        .bind(config.sync_enabled)
        .bind(&config.dexcom_username)
        .bind(&config.dexcom_password_encrypted)
        .bind(&config.libre_email)
        .bind(&config.libre_password_encrypted)
        .bind(&config.libre_region)
        .bind(&config.nightscout_url)
        .bind(&config.nightscout_api_secret_encrypted)
        .bind(config.connection_status.as_str())
        .bind(i64::from(config.sync_error_count))
        .bind(&config.last_sync_error)
        .bind(config.last_sync_attempt_at)
        .bind(config.last_successful_sync_at)
        .bind(config.created_at)
        .bind(config.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Register a unified patient identity
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including on a duplicate phone
    pub async fn insert_unified_patient(
        &self,
        id: &str,
        phone_normalized: &str,
        full_name: Option<&str>,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO unified_patients (id, phone_normalized, full_name, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(phone_normalized)
        .bind(full_name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch a configuration by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored value cannot be decoded
    pub async fn get_configuration(&self, config_id: &str) -> StoreResult<Option<SyncConfiguration>> {
        let row = sqlx::query(&format!(
            "SELECT {CONFIGURATION_COLUMNS} FROM cgm_sync_configurations WHERE id = ?"
        ))
        .bind(config_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_configuration).transpose()
    }

    /// Count persisted readings for a configured phone
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_readings_for_phone(&self, patient_phone: &str) -> StoreResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cgm_glucose_readings WHERE patient_phone = ?")
                .bind(patient_phone)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Persisted readings of a configuration, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored value cannot be decoded
    pub async fn readings_for_configuration(
        &self,
        config_id: &str,
    ) -> StoreResult<Vec<GlucoseRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {READING_COLUMNS} FROM cgm_glucose_readings WHERE config_id = ? ORDER BY reading_timestamp"
        ))
        .bind(config_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_record).collect()
    }
}

fn decode_status(raw: &str) -> StoreResult<ConnectionStatus> {
    ConnectionStatus::from_str(raw).map_err(|e| StoreError::Decode(e.to_string()))
}

fn row_to_configuration(row: &SqliteRow) -> StoreResult<SyncConfiguration> {
    let status: String = row.try_get("connection_status")?;
    let error_count: i64 = row.try_get("sync_error_count")?;

    Ok(SyncConfiguration {
        id: row.try_get("id")?,
        patient_phone: row.try_get("patient_phone")?,
        patient_phone_normalized: row.try_get("patient_phone_normalized")?,
        unified_patient_id: row.try_get("unified_patient_id")?,
        patient_name: row.try_get("patient_name")?,
        patient_mrn: row.try_get("patient_mrn")?,
        sync_enabled: row.try_get("sync_enabled")?,
        dexcom_username: row.try_get("dexcom_username")?,
        dexcom_password_encrypted: row.try_get("dexcom_password_encrypted")?,
        libre_email: row.try_get("libre_email")?,
        libre_password_encrypted: row.try_get("libre_password_encrypted")?,
        libre_region: row.try_get("libre_region")?,
        nightscout_url: row.try_get("nightscout_url")?,
        nightscout_api_secret_encrypted: row.try_get("nightscout_api_secret_encrypted")?,
        connection_status: decode_status(&status)?,
        sync_error_count: u32::try_from(error_count)
            .map_err(|e| StoreError::Decode(format!("sync_error_count {error_count}: {e}")))?,
        last_sync_error: row.try_get("last_sync_error")?,
        last_sync_attempt_at: row.try_get::<Option<DateTime<Utc>>, _>("last_sync_attempt_at")?,
        last_successful_sync_at: row
            .try_get::<Option<DateTime<Utc>>, _>("last_successful_sync_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_record(row: &SqliteRow) -> StoreResult<GlucoseRecord> {
    let source: String = row.try_get("data_source")?;
    let batch: String = row.try_get("sync_batch_id")?;

    Ok(GlucoseRecord {
        natural_id: row.try_get("natural_id")?,
        config_id: row.try_get("config_id")?,
        unified_patient_id: row.try_get("unified_patient_id")?,
        patient_phone: row.try_get("patient_phone")?,
        patient_name: row.try_get("patient_name")?,
        patient_mrn: row.try_get("patient_mrn")?,
        glucose_value: row.try_get("glucose_value")?,
        glucose_units: row.try_get("glucose_units")?,
        trend_direction: row.try_get("trend_direction")?,
        trend_arrow: row.try_get("trend_arrow")?,
        reading_timestamp: row.try_get("reading_timestamp")?,
        device_name: row.try_get("device_name")?,
        data_source: ProviderKind::from_str(&source)
            .map_err(|e| StoreError::Decode(e.to_string()))?,
        sync_batch_id: Uuid::parse_str(&batch)
            .map_err(|e| StoreError::Decode(format!("sync_batch_id {batch}: {e}")))?,
        fetched_at: row.try_get("fetched_at")?,
    })
}

#[async_trait]
impl SyncStore for SqliteSyncStore {
    async fn find_configuration_by_phone(
        &self,
        e164: &str,
        normalized: &str,
    ) -> StoreResult<Option<SyncConfiguration>> {
        let row = sqlx::query(&format!(
            "SELECT {CONFIGURATION_COLUMNS} FROM cgm_sync_configurations \
             WHERE patient_phone IN (?, ?) OR patient_phone_normalized IN (?, ?) \
             ORDER BY created_at, id LIMIT 1"
        ))
        .bind(e164)
        .bind(normalized)
        .bind(e164)
        .bind(normalized)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_configuration).transpose()
    }

    async fn find_configuration(&self, config_id: &str) -> StoreResult<Option<SyncConfiguration>> {
        self.get_configuration(config_id).await
    }

    async fn list_configurations(
        &self,
        filter: &ConfigurationFilter,
    ) -> StoreResult<Vec<SyncConfiguration>> {
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
            "SELECT {CONFIGURATION_COLUMNS} FROM cgm_sync_configurations WHERE 1 = 1"
        ));
        if let Some(enabled) = filter.sync_enabled {
            builder.push(" AND sync_enabled = ").push_bind(enabled);
        }
        if !filter.statuses.is_empty() {
            builder.push(" AND connection_status IN (");
            let mut separated = builder.separated(", ");
            for status in &filter.statuses {
                separated.push_bind(status.as_str());
            }
            separated.push_unseparated(")");
        }
        builder.push(" ORDER BY created_at, id");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_configuration).collect()
    }

    async fn find_unified_patient_id(&self, normalized_phone: &str) -> StoreResult<Option<String>> {
        let id: Option<String> =
            sqlx::query_scalar("SELECT id FROM unified_patients WHERE phone_normalized = ?")
                .bind(normalized_phone)
                .fetch_optional(&self.pool)
                .await?;
        Ok(id)
    }

    async fn link_unified_patient(
        &self,
        config_id: &str,
        unified_patient_id: &str,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE cgm_sync_configurations SET unified_patient_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(unified_patient_id)
        .bind(Utc::now())
        .bind(config_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "sync configuration",
                id: config_id.to_owned(),
            });
        }
        Ok(())
    }

    async fn upsert_reading(&self, record: &GlucoseRecord) -> StoreResult<UpsertOutcome> {
        let result = sqlx::query(&format!(
            "INSERT INTO cgm_glucose_readings ({READING_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(natural_id) DO NOTHING"
        ))
        .bind(&record.natural_id)
        .bind(&record.config_id)
        .bind(&record.unified_patient_id)
        .bind(&record.patient_phone)
        .bind(&record.patient_name)
        .bind(&record.patient_mrn)
        .bind(record.glucose_value)
        .bind(&record.glucose_units)
        .bind(&record.trend_direction)
        .bind(&record.trend_arrow)
        .bind(record.reading_timestamp)
        .bind(&record.device_name)
        .bind(record.data_source.as_str())
        .bind(record.sync_batch_id.to_string())
        .bind(record.fetched_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(natural_id = %record.natural_id, "Reading already present");
            Ok(UpsertOutcome::Duplicate)
        } else {
            Ok(UpsertOutcome::Inserted)
        }
    }

    async fn update_configuration(
        &self,
        config_id: &str,
        update: &ConfigurationUpdate,
    ) -> StoreResult<()> {
        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("UPDATE cgm_sync_configurations SET updated_at = ");
        builder.push_bind(Utc::now());

        if let Some(status) = update.connection_status {
            builder.push(", connection_status = ").push_bind(status.as_str());
        }
        if let Some(count) = update.sync_error_count {
            builder.push(", sync_error_count = ").push_bind(i64::from(count));
        }
        if let Some(error) = &update.last_sync_error {
            builder.push(", last_sync_error = ").push_bind(error.clone());
        }
        if let Some(at) = update.last_sync_attempt_at {
            builder.push(", last_sync_attempt_at = ").push_bind(at);
        }
        if let Some(at) = update.last_successful_sync_at {
            builder.push(", last_successful_sync_at = ").push_bind(at);
        }
        builder.push(" WHERE id = ").push_bind(config_id);

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "sync configuration",
                id: config_id.to_owned(),
            });
        }
        Ok(())
    }
}
