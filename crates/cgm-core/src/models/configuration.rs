// ABOUTME: Per-patient CGM sync configuration and the partial-update and filter contracts for it
// ABOUTME: Holds encrypted provider credential sets, connection status, and sync bookkeeping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ConnectionStatus;

/// One patient-device link
///
/// Created out-of-band when a device link is provisioned. The sync engine
/// mutates status, counters and timestamps on every attempt and backfills
/// `unified_patient_id` lazily; it never deletes a configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfiguration {
    /// Configuration identifier
    pub id: String,
    /// Patient phone in E.164 form (`+15551234567`)
    pub patient_phone: String,
    /// Patient phone in digits-only form (`5551234567`)
    pub patient_phone_normalized: String,
    /// Internal unified patient reference, once linked
    pub unified_patient_id: Option<String>,
    /// Patient display name, copied onto every persisted reading
    pub patient_name: Option<String>,
    /// Medical record number, copied onto every persisted reading
    pub patient_mrn: Option<String>,
    /// Whether sync runs at all for this patient
    pub sync_enabled: bool,
    /// Dexcom Share username
    pub dexcom_username: Option<String>,
    /// Dexcom Share password, encrypted
    pub dexcom_password_encrypted: Option<String>,
    /// `LibreLinkUp` account email
    pub libre_email: Option<String>,
    /// `LibreLinkUp` password, encrypted
    pub libre_password_encrypted: Option<String>,
    /// `LibreLinkUp` region code (`us`, `eu`, ...)
    pub libre_region: Option<String>,
    /// Nightscout site URL
    pub nightscout_url: Option<String>,
    /// Nightscout API secret, encrypted
    pub nightscout_api_secret_encrypted: Option<String>,
    /// Upstream link health
    pub connection_status: ConnectionStatus,
    /// Consecutive non-auth failures since the last success
    pub sync_error_count: u32,
    /// Message of the most recent failure or informational result
    pub last_sync_error: Option<String>,
    /// When a sync was last attempted
    pub last_sync_attempt_at: Option<DateTime<Utc>>,
    /// When a sync last completed with readings
    pub last_successful_sync_at: Option<DateTime<Utc>>,
    /// Record creation time
    pub created_at: DateTime<Utc>,
    /// Record modification time
    pub updated_at: DateTime<Utc>,
}

fn is_present(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

impl SyncConfiguration {
    /// Create an enabled configuration with no credentials and default status
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        patient_phone: impl Into<String>,
        patient_phone_normalized: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            patient_phone: patient_phone.into(),
            patient_phone_normalized: patient_phone_normalized.into(),
            unified_patient_id: None,
            patient_name: None,
            patient_mrn: None,
            sync_enabled: true,
            dexcom_username: None,
            dexcom_password_encrypted: None,
            libre_email: None,
            libre_password_encrypted: None,
            libre_region: None,
            nightscout_url: None,
            nightscout_api_secret_encrypted: None,
            connection_status: ConnectionStatus::Active,
            sync_error_count: 0,
            last_sync_error: None,
            last_sync_attempt_at: None,
            last_successful_sync_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Dexcom username and encrypted password are both set
    #[must_use]
    pub fn has_dexcom_credentials(&self) -> bool {
        is_present(self.dexcom_username.as_ref())
            && is_present(self.dexcom_password_encrypted.as_ref())
    }

    /// Libre email and encrypted password are both set
    #[must_use]
    pub fn has_libre_credentials(&self) -> bool {
        is_present(self.libre_email.as_ref()) && is_present(self.libre_password_encrypted.as_ref())
    }

    /// Nightscout URL is set; the API secret is optional for public sites
    #[must_use]
    pub fn has_nightscout_credentials(&self) -> bool {
        is_present(self.nightscout_url.as_ref())
    }
}

/// Partial update of a configuration's sync bookkeeping
///
/// `None` leaves a field untouched. `last_sync_error: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationUpdate {
    /// New connection status
    pub connection_status: Option<ConnectionStatus>,
    /// New consecutive-failure counter
    pub sync_error_count: Option<u32>,
    /// New last error message, or `Some(None)` to clear
    pub last_sync_error: Option<Option<String>>,
    /// New last-attempt timestamp
    pub last_sync_attempt_at: Option<DateTime<Utc>>,
    /// New last-success timestamp
    pub last_successful_sync_at: Option<DateTime<Utc>>,
}

/// Selection of configurations for enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationFilter {
    /// Required `sync_enabled` value, if any
    pub sync_enabled: Option<bool>,
    /// Allowed statuses; empty means any
    pub statuses: Vec<ConnectionStatus>,
}

impl ConfigurationFilter {
    /// Enabled configurations a fleet sync should attempt
    #[must_use]
    pub fn fleet() -> Self {
        Self {
            sync_enabled: Some(true),
            statuses: vec![ConnectionStatus::Active, ConnectionStatus::Error],
        }
    }
}
