use std::collections::HashMap;

use crate::tls::{CertificateSnapshot, CertificateStatus};

/// Alerts fire once a certificate has this many days left or fewer
pub const DEFAULT_ALERT_WINDOW_DAYS: i64 = 30;

/// Per-domain record of the countdown value the last alert was sent at.
///
/// This is a coarse dedup: a repeat alert is suppressed only while the
/// countdown stays the same between checks.
#[derive(Debug, Clone)]
pub struct NotificationLedger {
    alert_window_days: i64,
    sent: HashMap<String, i64>,
}

impl NotificationLedger {
    pub fn new(alert_window_days: i64) -> Self {
        Self {
            alert_window_days,
            sent: HashMap::new(),
        }
    }

    pub fn alert_window_days(&self) -> i64 {
        self.alert_window_days
    }

    /// True when `snapshot` is a valid certificate inside the alert window and
    /// no alert has been recorded for `domain` at this countdown value.
    pub fn should_notify(&self, domain: &str, snapshot: &CertificateSnapshot) -> bool {
        if snapshot.status != CertificateStatus::Valid {
            return false;
        }
        let Some(days) = snapshot.days_until_expiry else {
            return false;
        };
        if days > self.alert_window_days {
            return false;
        }
        self.sent.get(domain) != Some(&days)
    }

    /// Overwrite the entry for `domain`
    pub fn record_sent(&mut self, domain: &str, days: i64) {
        self.sent.insert(domain.to_string(), days);
    }

    pub fn purge(&mut self, domain: &str) -> Option<i64> {
        self.sent.remove(domain)
    }

    pub fn last_sent(&self, domain: &str) -> Option<i64> {
        self.sent.get(domain).copied()
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }
}

impl Default for NotificationLedger {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_WINDOW_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InspectionError;
    use chrono::{Duration, Utc};

    fn snapshot(days: i64) -> CertificateSnapshot {
        let now = Utc::now();
        CertificateSnapshot::from_validity(
            "a.example",
            "a.example",
            Some("Example CA".to_string()),
            now - Duration::days(60),
            now + Duration::days(days) + Duration::hours(1),
            now,
        )
    }

    #[test]
    fn test_outside_window_never_notifies() {
        let ledger = NotificationLedger::default();
        assert!(!ledger.should_notify("a.example", &snapshot(31)));
        assert!(!ledger.should_notify("a.example", &snapshot(365)));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let ledger = NotificationLedger::default();
        assert!(!ledger.should_notify("a.example", &snapshot(31)));
        assert!(ledger.should_notify("a.example", &snapshot(30)));
    }

    #[test]
    fn test_expired_and_error_never_notify() {
        let ledger = NotificationLedger::default();
        let expired = snapshot(-5);
        assert_eq!(expired.status, CertificateStatus::Expired);
        assert!(!ledger.should_notify("a.example", &expired));

        let err = InspectionError::InvalidHost(String::new());
        let failed = CertificateSnapshot::failed("a.example", "a.example", &err);
        assert!(!ledger.should_notify("a.example", &failed));
    }

    #[test]
    fn test_countdown_scenario() {
        let mut ledger = NotificationLedger::default();

        assert!(ledger.should_notify("a.example", &snapshot(10)));
        ledger.record_sent("a.example", 10);

        // Same countdown on the next check
        assert!(!ledger.should_notify("a.example", &snapshot(10)));

        // A day later
        assert!(ledger.should_notify("a.example", &snapshot(9)));
    }

    #[test]
    fn test_record_sent_is_idempotent() {
        let mut ledger = NotificationLedger::default();
        ledger.record_sent("a.example", 7);
        ledger.record_sent("a.example", 7);
        assert_eq!(ledger.last_sent("a.example"), Some(7));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_purge_clears_suppression() {
        let mut ledger = NotificationLedger::default();
        ledger.record_sent("a.example", 12);
        assert!(!ledger.should_notify("a.example", &snapshot(12)));

        assert_eq!(ledger.purge("a.example"), Some(12));
        assert!(ledger.is_empty());
        assert!(ledger.should_notify("a.example", &snapshot(12)));
    }

    #[test]
    fn test_entries_are_per_domain() {
        let mut ledger = NotificationLedger::default();
        ledger.record_sent("a.example", 5);
        assert!(ledger.should_notify("b.example", &snapshot(5)));
    }

    #[test]
    fn test_custom_window() {
        let ledger = NotificationLedger::new(7);
        assert!(!ledger.should_notify("a.example", &snapshot(8)));
        assert!(ledger.should_notify("a.example", &snapshot(7)));
        assert_eq!(ledger.alert_window_days(), 7);
    }
}
