//! Consent bookkeeping.
//!
//! A consent records that one profile allows another to see its position.
//! Records live in memory for the lifetime of the process.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Scope used when a request names none.
pub const DEFAULT_SCOPE: &str = "location";

/// Consent errors.
#[derive(Debug, Error)]
pub enum ConsentError {
    /// A required field is empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// No record with that id.
    #[error("consent {0}")]
    NotFound(Uuid),

    /// The record was already revoked.
    #[error("consent {0} is already revoked")]
    AlreadyRevoked(Uuid),
}

/// A consent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRecord {
    /// Record identifier.
    pub consent_id: Uuid,
    /// Profile granting consent.
    pub profile_id: String,
    /// Profile receiving consent.
    pub grantee_id: String,
    /// What the consent covers.
    pub scope: String,
    /// When consent was granted.
    pub granted_at: DateTime<Utc>,
    /// When consent lapses, if ever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// When consent was revoked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ConsentRecord {
    /// Evaluate the record at `now`.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> ConsentStatus {
        if self.revoked_at.is_some() {
            ConsentStatus::Revoked
        } else if self.expires_at.is_some_and(|at| at <= now) {
            ConsentStatus::Expired
        } else {
            ConsentStatus::Valid
        }
    }
}

/// Result of validating a consent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentStatus {
    /// Consent is in force.
    Valid,
    /// Consent was revoked.
    Revoked,
    /// Consent lapsed.
    Expired,
    /// No such consent.
    NotFound,
}

impl ConsentStatus {
    /// Whether the consent is in force.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, ConsentStatus::Valid)
    }
}

/// Request to grant consent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConsent {
    /// Profile granting consent.
    #[serde(default)]
    pub profile_id: String,
    /// Profile receiving consent.
    #[serde(default)]
    pub grantee_id: String,
    /// Consent scope.
    pub scope: Option<String>,
    /// Lifetime in seconds. Zero never expires; absent uses the default.
    pub ttl_seconds: Option<u64>,
}

/// In-memory consent store.
pub struct ConsentStore {
    records: DashMap<Uuid, ConsentRecord>,
    default_ttl: Option<Duration>,
}

impl ConsentStore {
    /// Create a store with a default consent lifetime.
    #[must_use]
    pub fn new(default_ttl: Option<Duration>) -> Self {
        Self {
            records: DashMap::new(),
            default_ttl,
        }
    }

    /// Grant consent.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile or grantee id is empty.
    pub fn create(&self, request: NewConsent) -> Result<ConsentRecord, ConsentError> {
        if request.profile_id.trim().is_empty() {
            return Err(ConsentError::MissingField("profileId"));
        }
        if request.grantee_id.trim().is_empty() {
            return Err(ConsentError::MissingField("granteeId"));
        }

        let ttl = match request.ttl_seconds {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => self.default_ttl,
        };

        let now = Utc::now();
        let record = ConsentRecord {
            consent_id: Uuid::new_v4(),
            profile_id: request.profile_id,
            grantee_id: request.grantee_id,
            scope: request
                .scope
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            granted_at: now,
            expires_at: ttl
                .and_then(|ttl| ChronoDuration::from_std(ttl).ok())
                .and_then(|ttl| now.checked_add_signed(ttl)),
            revoked_at: None,
        };

        debug!(
            consent = %record.consent_id,
            profile = %record.profile_id,
            grantee = %record.grantee_id,
            "Consent granted"
        );
        self.records.insert(record.consent_id, record.clone());

        Ok(record)
    }

    /// Get a record.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<ConsentRecord> {
        self.records.get(&id).map(|r| r.value().clone())
    }

    /// Validate a consent.
    #[must_use]
    pub fn validate(&self, id: Uuid) -> ConsentStatus {
        self.records
            .get(&id)
            .map(|r| r.status_at(Utc::now()))
            .unwrap_or(ConsentStatus::NotFound)
    }

    /// Revoke a consent.
    ///
    /// # Errors
    ///
    /// Returns an error if the consent is unknown or already revoked.
    pub fn revoke(&self, id: Uuid) -> Result<ConsentRecord, ConsentError> {
        let mut record = self.records.get_mut(&id).ok_or(ConsentError::NotFound(id))?;
        if record.revoked_at.is_some() {
            return Err(ConsentError::AlreadyRevoked(id));
        }
        record.revoked_at = Some(Utc::now());
        debug!(consent = %id, "Consent revoked");
        Ok(record.value().clone())
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
