//! Decision Service
//!
//! Orchestrates the event store, signal extractor, risk aggregator, decision
//! policy and audit ledger on behalf of the external transport layer. Risk is
//! recomputed from stored history on every request, never cached.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::geo::{GeoLocation, GeoResolver};
use crate::ledger::{AuditLedger, LedgerConfig, LedgerExport, Transaction, TransactionKind};
use crate::models::{
    DeviceEvent, FileAccessEvent, FileAction, LoginEvent, NewUser, RiskAssessment, User,
    UserActivity, UserReport, UserStatus,
};
use crate::policy::{self, ZoneInfo};
use crate::risk;
use crate::signals;
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub username: String,
    pub role: String,
    pub location: GeoLocation,
    pub assessment: RiskAssessment,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterDeviceRequest {
    pub username: String,
    pub device_id: String,
    pub mac_address: String,
    pub os: String,
    pub wifi_ssid: String,
    pub hostname: String,
    pub ip_address: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceRegistrationOutcome {
    pub location: GeoLocation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileAccessRequest {
    pub user_id: String,
    pub file_name: String,
    pub action: String,
    pub ip_address: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileAccessOutcome {
    pub timestamp: DateTime<Utc>,
}

/// The engine facade handed to the transport layer.
///
/// Holds the process-wide audit ledger, constructed once with its genesis
/// block; requests share it through this service.
pub struct DecisionService<S, G> {
    store: S,
    geo: G,
    ledger: AuditLedger,
}

impl<S: Store, G: GeoResolver> DecisionService<S, G> {
    pub fn new(store: S, geo: G, config: &EngineConfig) -> Self {
        Self {
            store,
            geo,
            ledger: AuditLedger::new(LedgerConfig::from(config)),
        }
    }

    /// Authenticate a user and score the attempt.
    ///
    /// Pending and revoked accounts fail before anything is recorded. Bad
    /// credentials record a failed login event and audit transaction, then
    /// fail. Successful logins record, score and return the full assessment.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        source_ip: &str,
    ) -> EngineResult<LoginOutcome> {
        let user = self.store.find_user(username).await?;

        if let Some(user) = &user {
            match user.status {
                UserStatus::Pending => {
                    tracing::info!(username, "login rejected: account pending");
                    return Err(EngineError::AccountPending);
                }
                UserStatus::Revoked => {
                    tracing::info!(username, "login rejected: account revoked");
                    return Err(EngineError::AccountRevoked);
                }
                UserStatus::Active => {}
            }
        }

        let geo = self.geo.resolve(source_ip).await;
        let authenticated = user
            .as_ref()
            .map(|u| verify_password(password, &u.password_hash))
            .unwrap_or(false);

        let event = LoginEvent {
            user_id: username.to_string(),
            timestamp: Utc::now(),
            source_ip: geo.ip.clone(),
            succeeded: authenticated,
            country: geo.country.clone(),
            city: geo.city.clone(),
        };

        if authenticated {
            // Primary record: a persistence failure here is surfaced.
            self.store.record_login(event).await?;
        } else if let Err(err) = self.store.record_login(event).await {
            // The attempt log for a rejected login is non-critical.
            tracing::warn!(username, error = %err, "failed to record rejected login attempt");
        }

        self.ledger.append(Transaction {
            kind: TransactionKind::Login,
            user: username.to_string(),
            ip: geo.ip.clone(),
            detail: format!(
                "login {} from {}",
                if authenticated { "succeeded" } else { "failed" },
                geo.display()
            ),
            timestamp: Utc::now(),
        })?;

        let Some(user) = user.filter(|_| authenticated) else {
            return Err(EngineError::InvalidCredentials);
        };

        let assessment = self.assessment_for(username).await?;
        tracing::info!(
            username,
            score = assessment.score,
            decision = ?assessment.decision,
            "login scored"
        );

        Ok(LoginOutcome {
            username: user.username,
            role: user.role,
            location: geo,
            assessment,
        })
    }

    /// Create a user account. Self-registrations land in Pending; seeding
    /// and admin flows pass an explicit status.
    pub async fn register_user(&self, new_user: NewUser) -> EngineResult<User> {
        if new_user.username.is_empty() {
            return Err(EngineError::Validation("username must not be empty".to_string()));
        }
        if new_user.password.is_empty() {
            return Err(EngineError::Validation("password must not be empty".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            password_hash: hash_password(&new_user.password)?,
            role: new_user.role.unwrap_or_else(|| "user".to_string()),
            status: new_user.status.unwrap_or(UserStatus::Pending),
            created_at: Utc::now(),
        };
        Ok(self.store.create_user(user).await?)
    }

    /// Upsert a device fingerprint. Newly seen devices are untrusted until an
    /// administrator clears them.
    pub async fn register_device(
        &self,
        request: RegisterDeviceRequest,
    ) -> EngineResult<DeviceRegistrationOutcome> {
        if request.username.is_empty() || request.device_id.is_empty() {
            return Err(EngineError::Validation(
                "username and device_id must not be empty".to_string(),
            ));
        }

        let geo = self.geo.resolve(&request.ip_address).await;

        self.store
            .upsert_device(DeviceEvent {
                user_id: request.username.clone(),
                device_id: request.device_id.clone(),
                mac_address: request.mac_address,
                os: request.os,
                wifi_ssid: request.wifi_ssid,
                hostname: request.hostname,
                ip_address: geo.ip.clone(),
                trusted: false,
                first_seen: Utc::now(),
            })
            .await?;

        self.ledger.append(Transaction {
            kind: TransactionKind::DeviceRegistration,
            user: request.username,
            ip: geo.ip.clone(),
            detail: format!("device {}", request.device_id),
            timestamp: Utc::now(),
        })?;

        Ok(DeviceRegistrationOutcome { location: geo })
    }

    /// Append a file access record. Malformed payloads are rejected before
    /// anything is recorded.
    pub async fn record_file_access(
        &self,
        request: FileAccessRequest,
    ) -> EngineResult<FileAccessOutcome> {
        if request.user_id.is_empty() || request.file_name.is_empty() {
            return Err(EngineError::Validation(
                "user_id and file_name must not be empty".to_string(),
            ));
        }
        let action = FileAction::parse(&request.action).ok_or_else(|| {
            EngineError::Validation(format!("unknown file action: {}", request.action))
        })?;

        let timestamp = Utc::now();
        self.store
            .record_file_access(FileAccessEvent {
                user_id: request.user_id.clone(),
                file_name: request.file_name.clone(),
                action,
                ip_address: request.ip_address.clone(),
                timestamp,
            })
            .await?;

        self.ledger.append(Transaction {
            kind: TransactionKind::FileAccess,
            user: request.user_id,
            ip: request.ip_address,
            detail: format!("{} {}", action.as_str(), request.file_name),
            timestamp,
        })?;

        Ok(FileAccessOutcome { timestamp })
    }

    /// Compute the current assessment for a user.
    ///
    /// Total over any input: a user with no history (or entirely unknown)
    /// scores 0 / LOW / ALLOW with an empty signal list.
    pub async fn assessment_for(&self, user_id: &str) -> EngineResult<RiskAssessment> {
        let history = self.store.history_for(user_id).await?;
        let hits = signals::extract(&history, Utc::now());
        let score = risk::aggregate(&hits);
        let verdict = policy::resolve(score);

        Ok(RiskAssessment {
            user_id: user_id.to_string(),
            score,
            level: verdict.level,
            decision: verdict.decision,
            zone: verdict.zone,
            signals: hits,
        })
    }

    /// Administrative review: assessment plus activity summary for every user
    /// that has ever produced a login log. Read-only; risk is recomputed.
    pub async fn all_assessments(&self) -> EngineResult<Vec<UserReport>> {
        let mut reports = Vec::new();
        for user_id in self.store.distinct_login_users().await? {
            reports.push(self.user_report(&user_id).await?);
        }
        Ok(reports)
    }

    /// Per-user review view.
    pub async fn user_report(&self, user_id: &str) -> EngineResult<UserReport> {
        let assessment = self.assessment_for(user_id).await?;
        let logins = self.store.logins_for(user_id).await?;
        let devices = self.store.devices_for(user_id).await?;

        let last_login = logins.iter().max_by_key(|l| l.timestamp);
        let latest_device = devices.iter().max_by_key(|d| d.first_seen);

        let activity = UserActivity {
            user_id: user_id.to_string(),
            total_logins: logins.len() as u64,
            last_login: last_login.map(|l| l.timestamp),
            ip_address: last_login.map(|l| l.source_ip.clone()),
            country: last_login.map(|l| l.country.clone()),
            city: last_login.map(|l| l.city.clone()),
            mac_address: latest_device.map(|d| d.mac_address.clone()),
            wifi_ssid: latest_device.map(|d| d.wifi_ssid.clone()),
            hostname: latest_device.map(|d| d.hostname.clone()),
            os: latest_device.map(|d| d.os.clone()),
        };

        Ok(UserReport { assessment, activity })
    }

    pub async fn recent_file_accesses(
        &self,
        user_id: &str,
    ) -> EngineResult<Vec<FileAccessEvent>> {
        Ok(self.store.recent_file_accesses(user_id, 50).await?)
    }

    pub async fn all_file_accesses(&self) -> EngineResult<Vec<FileAccessEvent>> {
        Ok(self.store.all_file_accesses(100).await?)
    }

    /// Last `limit` audit blocks with hashes, plus chain validity.
    pub fn ledger(&self, limit: usize) -> LedgerExport {
        self.ledger.export(limit)
    }

    /// Recompute all hash links.
    pub fn verify_ledger(&self) -> bool {
        self.ledger.verify()
    }

    /// Static micro-segmentation zone table.
    pub fn zones(&self) -> Vec<ZoneInfo> {
        policy::zones()
    }
}

fn hash_password(password: &str) -> EngineResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::Internal(err.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
