//! Risk assessment models
//!
//! A RiskAssessment is a pure function of the user's event history at
//! evaluation time. It is computed on demand and never cached or stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::signals::SignalHit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessDecision {
    Allow,
    Restrict,
    Deny,
}

/// Security zone granted to the user.
///
/// The naming is deliberately inverted relative to risk: a LOW-risk user is
/// granted the CRITICAL zone (most sensitive assets), a CRITICAL-risk user
/// only the PUBLIC zone. Downstream consumers rely on this mapping; do not
/// rename it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SecurityZone {
    Critical,
    Sensitive,
    Internal,
    Public,
}

impl SecurityZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Sensitive => "SENSITIVE",
            Self::Internal => "INTERNAL",
            Self::Public => "PUBLIC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub user_id: String,
    /// Bounded to [0, 100]
    pub score: u32,
    pub level: RiskLevel,
    pub decision: AccessDecision,
    pub zone: SecurityZone,
    pub signals: Vec<SignalHit>,
}

/// Raw recent-activity summary returned alongside assessments in the review
/// operations. Never feeds back into scoring.
#[derive(Debug, Clone, Serialize)]
pub struct UserActivity {
    pub user_id: String,
    pub total_logins: u64,
    pub last_login: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub mac_address: Option<String>,
    pub wifi_ssid: Option<String>,
    pub hostname: Option<String>,
    pub os: Option<String>,
}

/// Assessment plus activity summary for the administrative review view.
#[derive(Debug, Clone, Serialize)]
pub struct UserReport {
    pub assessment: RiskAssessment,
    pub activity: UserActivity,
}
