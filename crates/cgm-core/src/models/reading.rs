// ABOUTME: Glucose reading returned by a provider and the deduplicated record persisted for it
// ABOUTME: Natural identifier synthesis makes re-fetching an overlapping window idempotent
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProviderKind, SyncConfiguration};
use crate::constants::units;

/// One glucose observation as returned by a provider adapter
///
/// Ephemeral: turned into a [`GlucoseRecord`] and dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Glucose value
    pub glucose_value: f64,
    /// Unit of `glucose_value`
    pub glucose_units: String,
    /// Trend direction name (`Flat`, `FortyFiveUp`, ...)
    pub trend_direction: Option<String>,
    /// Trend arrow glyph
    pub trend_arrow: Option<String>,
    /// Reporting device name
    pub device_name: Option<String>,
    /// When the reading was taken
    pub reading_timestamp: DateTime<Utc>,
    /// Provider-supplied identifier, when the provider has one
    pub nightscout_id: Option<String>,
    /// Source tag
    pub source: ProviderKind,
}

impl Reading {
    /// Reading in mg/dL with no trend, device or identifier
    #[must_use]
    pub fn new(source: ProviderKind, glucose_value: f64, reading_timestamp: DateTime<Utc>) -> Self {
        Self {
            glucose_value,
            glucose_units: units::MG_DL.to_owned(),
            trend_direction: None,
            trend_arrow: None,
            device_name: None,
            reading_timestamp,
            nightscout_id: None,
            source,
        }
    }
}

/// Deduplication key for a reading
///
/// The provider identifier when present, otherwise `{patient_phone}_{epoch millis}`,
/// a pure function of the configured phone and the reading timestamp.
#[must_use]
pub fn natural_identifier(reading: &Reading, patient_phone: &str) -> String {
    match reading.nightscout_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_owned(),
        _ => format!(
            "{patient_phone}_{}",
            reading.reading_timestamp.timestamp_millis()
        ),
    }
}

/// A reading as persisted, carrying patient identity and sync metadata
///
/// Append-only; a conflicting `natural_id` is treated as already present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseRecord {
    /// Deduplication key
    pub natural_id: String,
    /// Owning configuration
    pub config_id: String,
    /// Unified patient reference, when linked
    pub unified_patient_id: Option<String>,
    /// Configured patient phone
    pub patient_phone: String,
    /// Patient display name
    pub patient_name: Option<String>,
    /// Medical record number
    pub patient_mrn: Option<String>,
    /// Glucose value
    pub glucose_value: f64,
    /// Unit of `glucose_value`
    pub glucose_units: String,
    /// Trend direction name
    pub trend_direction: Option<String>,
    /// Trend arrow glyph
    pub trend_arrow: Option<String>,
    /// When the reading was taken
    pub reading_timestamp: DateTime<Utc>,
    /// Reporting device name
    pub device_name: Option<String>,
    /// Source tag
    pub data_source: ProviderKind,
    /// Sync run that fetched the reading
    pub sync_batch_id: Uuid,
    /// When the reading was fetched
    pub fetched_at: DateTime<Utc>,
}

impl GlucoseRecord {
    /// Build the persisted record for a reading fetched for `config`
    #[must_use]
    pub fn from_reading(
        config: &SyncConfiguration,
        reading: Reading,
        sync_batch_id: Uuid,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let natural_id = natural_identifier(&reading, &config.patient_phone);
        Self {
            natural_id,
            config_id: config.id.clone(),
            unified_patient_id: config.unified_patient_id.clone(),
            patient_phone: config.patient_phone.clone(),
            patient_name: config.patient_name.clone(),
            patient_mrn: config.patient_mrn.clone(),
            glucose_value: reading.glucose_value,
            glucose_units: reading.glucose_units,
            trend_direction: reading.trend_direction,
            trend_arrow: reading.trend_arrow,
            reading_timestamp: reading.reading_timestamp,
            device_name: reading.device_name,
            data_source: reading.source,
            sync_batch_id,
            fetched_at,
        }
    }
}

/// Result of an ignore-on-duplicate upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new record was written
    Inserted,
    /// A record with the same natural identifier already existed
    Duplicate,
}
