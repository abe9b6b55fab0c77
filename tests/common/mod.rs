#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::{Notify, Semaphore};

use ssl_watcher::delivery::{Delivery, RecipientStore};
use ssl_watcher::error::{DeliveryError, InspectionError, ReportError};
use ssl_watcher::monitor::Monitor;
use ssl_watcher::observability::metrics::MetricsCollector;
use ssl_watcher::report::ReportRenderer;
use ssl_watcher::state::MonitorState;
use ssl_watcher::tls::{normalize_domain, CertificateSnapshot, Inspector};

/// Inspector that answers from a table of days-until-expiry. Domains not in
/// the table come back as errors.
#[derive(Default)]
pub struct FakeInspector {
    days: Mutex<HashMap<String, i64>>,
    calls: Mutex<Vec<String>>,
}

impl FakeInspector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_days(&self, domain: &str, days: i64) {
        self.days.lock().unwrap().insert(domain.to_string(), days);
    }

    pub fn clear(&self, domain: &str) {
        self.days.lock().unwrap().remove(domain);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Inspector for FakeInspector {
    async fn inspect(&self, domain: &str) -> CertificateSnapshot {
        self.calls.lock().unwrap().push(domain.to_string());
        let host = normalize_domain(domain);
        match self.days.lock().unwrap().get(domain) {
            Some(days) => {
                let now = Utc::now();
                CertificateSnapshot::from_validity(
                    domain,
                    host,
                    Some("Fake CA".to_string()),
                    now - Duration::days(90),
                    now + Duration::days(*days) + Duration::hours(1),
                    now,
                )
            }
            None => {
                let err = InspectionError::NoCertificate { host: host.clone() };
                CertificateSnapshot::failed(domain, host, &err)
            }
        }
    }
}

/// Inspector that reports a fixed countdown, but only once released.
/// Lets a test act while an inspection is in flight.
pub struct GatedInspector {
    days: i64,
    started: Notify,
    gate: Semaphore,
}

impl GatedInspector {
    pub fn new(days: i64) -> Arc<Self> {
        Arc::new(Self {
            days,
            started: Notify::new(),
            gate: Semaphore::new(0),
        })
    }

    /// Wait until some inspection is blocked on the gate
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.gate.add_permits(1024);
    }
}

#[async_trait]
impl Inspector for GatedInspector {
    async fn inspect(&self, domain: &str) -> CertificateSnapshot {
        self.started.notify_one();
        let _permit = self.gate.acquire().await;
        let now = Utc::now();
        CertificateSnapshot::from_validity(
            domain,
            normalize_domain(domain),
            Some("Gated CA".to_string()),
            now - Duration::days(90),
            now + Duration::days(self.days) + Duration::hours(1),
            now,
        )
    }
}

/// One recorded delivery
#[derive(Debug, Clone)]
pub struct SentAlert {
    pub recipients: Vec<String>,
    pub domain: String,
    pub days: Option<i64>,
    pub attachment: Option<Vec<u8>>,
}

/// Delivery that records every alert, optionally failing after recording
#[derive(Default)]
pub struct RecordingDelivery {
    sent: Mutex<Vec<SentAlert>>,
    fail: bool,
}

impl RecordingDelivery {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn sent(&self) -> Vec<SentAlert> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn send(
        &self,
        recipients: &[String],
        snapshot: &CertificateSnapshot,
        attachment: Option<&[u8]>,
    ) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(SentAlert {
            recipients: recipients.to_vec(),
            domain: snapshot.domain.clone(),
            days: snapshot.days_until_expiry,
            attachment: attachment.map(<[u8]>::to_vec),
        });
        if self.fail {
            return Err(DeliveryError::NoRecipients);
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}

/// Renders the domain list as plain bytes, or always fails. Remembers the
/// alert window of every render.
pub struct StaticReport {
    fail: bool,
    windows: Mutex<Vec<i64>>,
}

impl StaticReport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            windows: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            windows: Mutex::new(Vec::new()),
        })
    }

    pub fn windows(&self) -> Vec<i64> {
        self.windows.lock().unwrap().clone()
    }
}

impl ReportRenderer for StaticReport {
    fn render(
        &self,
        snapshots: &[CertificateSnapshot],
        alert_window_days: i64,
    ) -> Result<Vec<u8>, ReportError> {
        self.windows.lock().unwrap().push(alert_window_days);
        if self.fail {
            return Err(ReportError::Render("renderer unavailable".to_string()));
        }
        let names: Vec<&str> = snapshots.iter().map(|s| s.domain.as_str()).collect();
        Ok(format!("REPORT {}", names.join(",")).into_bytes())
    }

    fn content_type(&self) -> &'static str {
        "text/plain"
    }
}

pub struct Harness {
    pub monitor: Monitor,
    pub inspector: Arc<FakeInspector>,
    pub delivery: Arc<RecordingDelivery>,
    pub report: Arc<StaticReport>,
    // Keeps the recipient file alive for the test's duration
    pub dir: TempDir,
}

pub struct HarnessBuilder {
    state: MonitorState,
    delivery: Arc<RecordingDelivery>,
    report: Arc<StaticReport>,
    recipients: Vec<String>,
    inspector: Option<Arc<dyn Inspector>>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            state: MonitorState::new(),
            delivery: RecordingDelivery::new(),
            report: StaticReport::new(),
            recipients: vec!["ops@example.com".to_string()],
            inspector: None,
        }
    }

    pub fn state(mut self, state: MonitorState) -> Self {
        self.state = state;
        self
    }

    pub fn delivery(mut self, delivery: Arc<RecordingDelivery>) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn report(mut self, report: Arc<StaticReport>) -> Self {
        self.report = report;
        self
    }

    /// Inspect through `inspector` instead of the table-driven fake
    pub fn inspector(mut self, inspector: Arc<dyn Inspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    pub fn recipients(mut self, recipients: &[&str]) -> Self {
        self.recipients = recipients.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn build(self) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = RecipientStore::new(dir.path().join("emails.json"));
        store.save(&self.recipients).unwrap();

        let inspector = FakeInspector::new();
        let active: Arc<dyn Inspector> = match self.inspector {
            Some(custom) => custom,
            None => inspector.clone(),
        };
        let monitor = Monitor::new(
            self.state,
            active,
            self.report.clone(),
            self.delivery.clone(),
            Arc::new(store),
            Arc::new(MetricsCollector::new().unwrap()),
        );

        Harness {
            monitor,
            inspector,
            delivery: self.delivery,
            report: self.report,
            dir,
        }
    }
}

pub fn harness() -> Harness {
    HarnessBuilder::new().build()
}
