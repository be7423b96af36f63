//! Decision Policy
//!
//! Pure step function from risk score to (level, decision, zone), plus the
//! static micro-segmentation zone table exposed to clients.

use serde::Serialize;

use crate::models::{AccessDecision, RiskLevel, SecurityZone};

/// Outcome of the policy step function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub level: RiskLevel,
    pub decision: AccessDecision,
    pub zone: SecurityZone,
}

/// Resolve a bounded score into level, decision and accessible zone.
///
/// Band upper bounds are inclusive. The zone naming is inverted on purpose:
/// the least risky users reach the CRITICAL (most sensitive) zone.
pub fn resolve(score: u32) -> Verdict {
    if score <= 30 {
        Verdict {
            level: RiskLevel::Low,
            decision: AccessDecision::Allow,
            zone: SecurityZone::Critical,
        }
    } else if score <= 50 {
        Verdict {
            level: RiskLevel::Medium,
            decision: AccessDecision::Restrict,
            zone: SecurityZone::Sensitive,
        }
    } else if score <= 70 {
        Verdict {
            level: RiskLevel::High,
            decision: AccessDecision::Restrict,
            zone: SecurityZone::Internal,
        }
    } else {
        Verdict {
            level: RiskLevel::Critical,
            decision: AccessDecision::Deny,
            zone: SecurityZone::Public,
        }
    }
}

/// A zone in the static policy table.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneInfo {
    pub name: SecurityZone,
    /// Maximum risk score still admitted to this zone
    pub risk_threshold: u32,
    pub resources: &'static [&'static str],
    pub description: &'static str,
}

/// The zone -> risk_threshold -> resource mapping, read-only.
pub fn zones() -> Vec<ZoneInfo> {
    vec![
        ZoneInfo {
            name: SecurityZone::Public,
            risk_threshold: 100,
            resources: &["Company Website", "Public Docs", "General Info"],
            description: "Accessible to all users",
        },
        ZoneInfo {
            name: SecurityZone::Internal,
            risk_threshold: 70,
            resources: &["Email", "Calendar", "Team Chat", "Project Management"],
            description: "Internal business resources",
        },
        ZoneInfo {
            name: SecurityZone::Sensitive,
            risk_threshold: 50,
            resources: &["Customer Data", "Financial Reports", "HR Records", "Source Code"],
            description: "Confidential business data",
        },
        ZoneInfo {
            name: SecurityZone::Critical,
            risk_threshold: 30,
            resources: &["Payment Systems", "Database Credentials", "Encryption Keys", "Executive Comms"],
            description: "Highest security assets",
        },
    ]
}
