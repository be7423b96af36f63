//! Signal Extractor
//!
//! Derives named anomaly signals from a user's event history. Each signal is
//! computed independently over its own lookback window and only emitted when
//! its count clears a fixed threshold. The extraction is a pure function of
//! the history and the evaluation instant - no side effects, fully
//! deterministic, so assessments stay reproducible between events.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{DeviceEvent, FileAccessEvent, FileAction, LoginEvent};

/// Working hours: logins before 08:00 or after 18:00 count as odd-hour.
const WORK_START_HOUR: u32 = 8;
const WORK_END_HOUR: u32 = 18;

const FAILED_LOGIN_THRESHOLD: u64 = 3;
const DISTINCT_IP_THRESHOLD: u64 = 2;
const FILE_ACCESS_THRESHOLD: u64 = 50;
const FILE_DELETION_THRESHOLD: u64 = 5;
const DISTINCT_COUNTRY_THRESHOLD: u64 = 2;
const DISTINCT_MAC_THRESHOLD: u64 = 2;

/// Enumerated anomaly signal.
///
/// Signals are derived fresh on every evaluation and never persisted; the
/// event store is the single source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    OddHourLogin,
    FailedLoginAttempts,
    MultipleIps,
    WeekendAccess,
    UntrustedDevices,
    ExcessiveFileAccess,
    FileDeletions,
    GeolocationAnomaly,
    DeviceChangeDetected,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OddHourLogin => "ODD_HOUR_LOGIN",
            Self::FailedLoginAttempts => "FAILED_LOGIN_ATTEMPTS",
            Self::MultipleIps => "MULTIPLE_IPS",
            Self::WeekendAccess => "WEEKEND_ACCESS",
            Self::UntrustedDevices => "UNTRUSTED_DEVICES",
            Self::ExcessiveFileAccess => "EXCESSIVE_FILE_ACCESS",
            Self::FileDeletions => "FILE_DELETIONS",
            Self::GeolocationAnomaly => "GEOLOCATION_ANOMALY",
            Self::DeviceChangeDetected => "DEVICE_CHANGE_DETECTED",
        }
    }
}

/// A signal with its occurrence count at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalHit {
    pub signal: Signal,
    pub count: u64,
}

/// A user's full event history as read from the event store.
#[derive(Debug, Clone, Default)]
pub struct UserHistory {
    pub logins: Vec<LoginEvent>,
    pub devices: Vec<DeviceEvent>,
    pub file_accesses: Vec<FileAccessEvent>,
}

/// Extract all anomaly signals for a user at instant `now`.
///
/// Signals are emitted in a fixed order so downstream consumers see a stable
/// list; the aggregator is order-independent regardless.
pub fn extract(history: &UserHistory, now: DateTime<Utc>) -> Vec<SignalHit> {
    let mut hits = Vec::new();

    let day_ago = now - Duration::hours(24);
    let hour_ago = now - Duration::hours(1);
    let week_ago = now - Duration::days(7);

    // Odd-hour logins over the trailing 24h, per occurrence
    let odd_hours = history
        .logins
        .iter()
        .filter(|l| l.timestamp > day_ago)
        .filter(|l| {
            let hour = l.timestamp.hour();
            hour < WORK_START_HOUR || hour > WORK_END_HOUR
        })
        .count() as u64;
    if odd_hours > 0 {
        hits.push(SignalHit { signal: Signal::OddHourLogin, count: odd_hours });
    }

    // Failed attempts over the trailing hour
    let failed = history
        .logins
        .iter()
        .filter(|l| l.timestamp > hour_ago && !l.succeeded)
        .count() as u64;
    if failed > FAILED_LOGIN_THRESHOLD {
        hits.push(SignalHit { signal: Signal::FailedLoginAttempts, count: failed });
    }

    // Distinct source IPs over the trailing hour
    let ips: HashSet<&str> = history
        .logins
        .iter()
        .filter(|l| l.timestamp > hour_ago)
        .map(|l| l.source_ip.as_str())
        .collect();
    if ips.len() as u64 > DISTINCT_IP_THRESHOLD {
        hits.push(SignalHit { signal: Signal::MultipleIps, count: ips.len() as u64 });
    }

    // Weekend logins over the trailing 7 days, per occurrence
    let weekend = history
        .logins
        .iter()
        .filter(|l| l.timestamp > week_ago)
        .filter(|l| matches!(l.timestamp.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as u64;
    if weekend > 0 {
        hits.push(SignalHit { signal: Signal::WeekendAccess, count: weekend });
    }

    // Untrusted devices, cumulative, per device
    let untrusted = history.devices.iter().filter(|d| !d.trusted).count() as u64;
    if untrusted > 0 {
        hits.push(SignalHit { signal: Signal::UntrustedDevices, count: untrusted });
    }

    // File access volume over the trailing 24h
    let accesses = history
        .file_accesses
        .iter()
        .filter(|f| f.timestamp > day_ago)
        .count() as u64;
    if accesses > FILE_ACCESS_THRESHOLD {
        hits.push(SignalHit { signal: Signal::ExcessiveFileAccess, count: accesses });
    }

    // Deletions over the trailing 24h
    let deletions = history
        .file_accesses
        .iter()
        .filter(|f| f.timestamp > day_ago && f.action == FileAction::Delete)
        .count() as u64;
    if deletions > FILE_DELETION_THRESHOLD {
        hits.push(SignalHit { signal: Signal::FileDeletions, count: deletions });
    }

    // Distinct login countries over the trailing 7 days
    let countries: HashSet<&str> = history
        .logins
        .iter()
        .filter(|l| l.timestamp > week_ago)
        .map(|l| l.country.as_str())
        .collect();
    if countries.len() as u64 > DISTINCT_COUNTRY_THRESHOLD {
        hits.push(SignalHit {
            signal: Signal::GeolocationAnomaly,
            count: countries.len() as u64,
        });
    }

    // Distinct device fingerprints, cumulative
    let macs: HashSet<&str> = history
        .devices
        .iter()
        .map(|d| d.mac_address.as_str())
        .collect();
    if macs.len() as u64 > DISTINCT_MAC_THRESHOLD {
        hits.push(SignalHit {
            signal: Signal::DeviceChangeDetected,
            count: macs.len() as u64,
        });
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(hours_ago: i64, succeeded: bool, ip: &str, now: DateTime<Utc>) -> LoginEvent {
        LoginEvent {
            user_id: "alice".to_string(),
            timestamp: now - Duration::hours(hours_ago),
            source_ip: ip.to_string(),
            succeeded,
            country: "Germany".to_string(),
            city: "Berlin".to_string(),
        }
    }

    fn file(hours_ago: i64, action: FileAction, now: DateTime<Utc>) -> FileAccessEvent {
        FileAccessEvent {
            user_id: "alice".to_string(),
            file_name: "report.xlsx".to_string(),
            action,
            ip_address: "10.0.0.1".to_string(),
            timestamp: now - Duration::hours(hours_ago),
        }
    }

    fn device(mac: &str, trusted: bool, now: DateTime<Utc>) -> DeviceEvent {
        DeviceEvent {
            user_id: "alice".to_string(),
            device_id: format!("dev-{mac}"),
            mac_address: mac.to_string(),
            os: "Linux".to_string(),
            wifi_ssid: "office".to_string(),
            hostname: "alice-laptop".to_string(),
            ip_address: "10.0.0.1".to_string(),
            trusted,
            first_seen: now,
        }
    }

    #[test]
    fn empty_history_yields_no_signals() {
        let hits = extract(&UserHistory::default(), Utc::now());
        assert!(hits.is_empty());
    }

    #[test]
    fn failed_logins_below_threshold_stay_silent() {
        let now = Utc::now();
        let history = UserHistory {
            logins: (0..3).map(|_| login(0, false, "1.2.3.4", now)).collect(),
            ..Default::default()
        };
        let hits = extract(&history, now);
        assert!(!hits.iter().any(|h| h.signal == Signal::FailedLoginAttempts));
    }

    #[test]
    fn four_failed_logins_in_last_hour_trip_the_signal() {
        let now = Utc::now();
        let history = UserHistory {
            logins: (0..4).map(|_| login(0, false, "1.2.3.4", now)).collect(),
            ..Default::default()
        };
        let hits = extract(&history, now);
        let hit = hits
            .iter()
            .find(|h| h.signal == Signal::FailedLoginAttempts)
            .expect("signal present");
        assert_eq!(hit.count, 4);
    }

    #[test]
    fn old_failed_logins_fall_outside_the_window() {
        let now = Utc::now();
        let history = UserHistory {
            logins: (0..6).map(|_| login(2, false, "1.2.3.4", now)).collect(),
            ..Default::default()
        };
        let hits = extract(&history, now);
        assert!(!hits.iter().any(|h| h.signal == Signal::FailedLoginAttempts));
    }

    #[test]
    fn three_distinct_ips_trip_multiple_ips() {
        let now = Utc::now();
        let history = UserHistory {
            logins: vec![
                login(0, true, "1.1.1.1", now),
                login(0, true, "2.2.2.2", now),
                login(0, true, "3.3.3.3", now),
            ],
            ..Default::default()
        };
        let hits = extract(&history, now);
        let hit = hits.iter().find(|h| h.signal == Signal::MultipleIps).expect("present");
        assert_eq!(hit.count, 3);
    }

    #[test]
    fn untrusted_devices_counted_per_device() {
        let now = Utc::now();
        let history = UserHistory {
            devices: vec![
                device("aa:bb", false, now),
                device("cc:dd", false, now),
                device("ee:ff", true, now),
            ],
            ..Default::default()
        };
        let hits = extract(&history, now);
        let hit = hits
            .iter()
            .find(|h| h.signal == Signal::UntrustedDevices)
            .expect("present");
        assert_eq!(hit.count, 2);
    }

    #[test]
    fn excessive_file_access_and_deletions() {
        let now = Utc::now();
        let mut accesses: Vec<_> = (0..51).map(|_| file(1, FileAction::Read, now)).collect();
        accesses.extend((0..6).map(|_| file(1, FileAction::Delete, now)));
        let history = UserHistory { file_accesses: accesses, ..Default::default() };
        let hits = extract(&history, now);
        assert!(hits.iter().any(|h| h.signal == Signal::ExcessiveFileAccess));
        let del = hits.iter().find(|h| h.signal == Signal::FileDeletions).expect("present");
        assert_eq!(del.count, 6);
    }

    #[test]
    fn three_countries_trip_geolocation_anomaly() {
        let now = Utc::now();
        let mut logins = vec![login(0, true, "1.1.1.1", now); 3];
        logins[0].country = "Germany".to_string();
        logins[1].country = "Brazil".to_string();
        logins[2].country = "Japan".to_string();
        let history = UserHistory { logins, ..Default::default() };
        let hits = extract(&history, now);
        assert!(hits.iter().any(|h| h.signal == Signal::GeolocationAnomaly));
    }

    #[test]
    fn extraction_is_deterministic() {
        let now = Utc::now();
        let history = UserHistory {
            logins: (0..5).map(|_| login(0, false, "1.2.3.4", now)).collect(),
            devices: vec![device("aa:bb", false, now)],
            ..Default::default()
        };
        assert_eq!(extract(&history, now), extract(&history, now));
    }
}
