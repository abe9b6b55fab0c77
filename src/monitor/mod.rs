//! Monitoring core: domain registry, alert dedup ledger, and the flow that
//! ties inspection to delivery.
//!
//! The registry and ledger live behind a single lock. Network I/O
//! (inspection, report rendering input, delivery) always happens with the
//! lock released. The alert decision and its ledger write are made together
//! under the lock, so two concurrent checks of the same domain cannot both
//! send.

pub mod ledger;
pub mod registry;
pub mod scheduler;

use chrono::{Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::delivery::{Delivery, RecipientStore};
use crate::error::{DeliveryError, InspectionError, ReportError};
use crate::observability::metrics::MetricsCollector;
use crate::report::{ReportRenderer, ReportSummary};
use crate::state::{MonitorState, SharedState};
use crate::tls::{normalize_domain, CertificateSnapshot, Inspector};

pub use ledger::{NotificationLedger, DEFAULT_ALERT_WINDOW_DAYS};
pub use registry::DomainRegistry;
pub use scheduler::{Scheduler, SchedulerHandle, SchedulerState};

const DEFAULT_MAX_CONCURRENT_CHECKS: usize = 8;

/// Result of an add request
#[derive(Debug, Clone, Serialize)]
pub struct AddDomainOutcome {
    /// False when the domain was already monitored (or empty)
    pub added: bool,
    pub domains: Vec<String>,
    /// Inspection performed right after adding
    pub certificate: Option<CertificateSnapshot>,
    pub notified: bool,
}

/// Result of a remove request
#[derive(Debug, Clone, Serialize)]
pub struct RemoveDomainOutcome {
    pub removed: bool,
    pub domains: Vec<String>,
}

/// One pass over the registry
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub snapshots: Vec<CertificateSnapshot>,
    /// Registry identities an alert was dispatched for
    pub notified: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub stats: ReportSummary,
    /// Soonest expiry first, unreadable certificates last
    pub certificates: Vec<CertificateSnapshot>,
    pub domains: Vec<String>,
    pub emails: Vec<String>,
}

/// Where the report attached to an alert gets its rows from
enum ReportSource<'a> {
    /// Snapshots already taken during this cycle
    Snapshots(&'a [CertificateSnapshot]),
    /// Inspect the whole registry again
    Fresh,
}

/// Owned monitoring state plus its collaborators. Cheap to clone; clones
/// share the same registry and ledger.
#[derive(Clone)]
pub struct Monitor {
    state: SharedState,
    inspector: Arc<dyn Inspector>,
    reporter: Arc<dyn ReportRenderer>,
    delivery: Arc<dyn Delivery>,
    recipients: Arc<RecipientStore>,
    metrics: Arc<MetricsCollector>,
    max_concurrent_checks: usize,
}

impl Monitor {
    pub fn new(
        state: MonitorState,
        inspector: Arc<dyn Inspector>,
        reporter: Arc<dyn ReportRenderer>,
        delivery: Arc<dyn Delivery>,
        recipients: Arc<RecipientStore>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        metrics.set_monitored_domains(state.registry.len());
        Self {
            state: state.into_shared(),
            inspector,
            reporter,
            delivery,
            recipients,
            metrics,
            max_concurrent_checks: DEFAULT_MAX_CONCURRENT_CHECKS,
        }
    }

    pub fn with_max_concurrent_checks(mut self, limit: usize) -> Self {
        self.max_concurrent_checks = limit.max(1);
        self
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn recipients(&self) -> &RecipientStore {
        &self.recipients
    }

    pub fn report_content_type(&self) -> &'static str {
        self.reporter.content_type()
    }

    /// Handle on the locked registry and ledger
    pub fn shared_state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    pub async fn list_domains(&self) -> Vec<String> {
        self.state.lock().await.registry.list()
    }

    /// Window the ledger alerts on, shared with report and dashboard counts
    pub async fn alert_window_days(&self) -> i64 {
        self.state.lock().await.ledger.alert_window_days()
    }

    pub async fn scheduler_state(&self) -> SchedulerState {
        if self.state.lock().await.registry.is_empty() {
            SchedulerState::Idle
        } else {
            SchedulerState::Running
        }
    }

    /// Add a domain, then inspect it once and alert if it is inside the
    /// window. The caller waits for the inspection and any alert.
    pub async fn add_domain(&self, domain: &str) -> AddDomainOutcome {
        let (identity, domains) = {
            let mut state = self.state.lock().await;
            let identity = state.registry.add(domain);
            (identity, state.registry.list())
        };
        self.metrics.set_monitored_domains(domains.len());

        let Some(identity) = identity else {
            debug!("Domain {:?} already monitored or empty, nothing added", domain);
            return AddDomainOutcome {
                added: false,
                domains,
                certificate: None,
                notified: false,
            };
        };
        info!("Added domain: {}", identity);

        let snapshot = self.inspect(&identity).await;
        let notified = self
            .dispatch_if_due(&identity, &snapshot, ReportSource::Fresh)
            .await;

        AddDomainOutcome {
            added: true,
            domains,
            certificate: Some(snapshot),
            notified,
        }
    }

    /// Remove a domain and purge its ledger entry atomically
    pub async fn remove_domain(&self, domain: &str) -> RemoveDomainOutcome {
        let (removed, domains) = {
            let mut state = self.state.lock().await;
            let removed = state.remove_domain(domain);
            (removed, state.registry.list())
        };
        self.metrics.set_monitored_domains(domains.len());

        match &removed {
            Some(identity) => info!("Removed domain: {}", identity),
            None => debug!("Domain {:?} not monitored, nothing removed", domain),
        }

        RemoveDomainOutcome {
            removed: removed.is_some(),
            domains,
        }
    }

    /// Inspect every domain and run the alert decision for each, in registry
    /// order. Used by the scheduler and by manual checks.
    pub async fn run_cycle(&self) -> CycleReport {
        let domains = self.list_domains().await;
        let snapshots = self.inspect_many(&domains).await;

        let mut notified = Vec::new();
        for (identity, snapshot) in domains.iter().zip(&snapshots) {
            if self
                .dispatch_if_due(identity, snapshot, ReportSource::Snapshots(&snapshots))
                .await
            {
                notified.push(identity.clone());
            }
        }

        self.metrics.record_cycle();
        CycleReport {
            snapshots,
            notified,
        }
    }

    /// Inspect every domain without touching the ledger
    pub async fn snapshot_all(&self) -> Vec<CertificateSnapshot> {
        let domains = self.list_domains().await;
        self.inspect_many(&domains).await
    }

    pub async fn dashboard(&self) -> Dashboard {
        let domains = self.list_domains().await;
        let mut certificates = self.inspect_many(&domains).await;
        let window = self.alert_window_days().await;

        let stats = ReportSummary::from_snapshots(&certificates, window);
        certificates.sort_by_key(|s| s.days_until_expiry.unwrap_or(i64::MAX));

        let emails = self.recipients.load().unwrap_or_else(|e| {
            warn!("Failed to load recipients: {}", e);
            Vec::new()
        });

        Dashboard {
            stats,
            certificates,
            domains,
            emails,
        }
    }

    /// Render a report over a fresh inspection of the registry
    pub async fn export_report(&self) -> Result<Vec<u8>, ReportError> {
        let snapshots = self.snapshot_all().await;
        let window = self.alert_window_days().await;
        self.reporter.render(&snapshots, window)
    }

    /// Send a sample alert to every recipient. Bypasses the ledger.
    /// Returns the number of recipients.
    pub async fn send_test_alert(&self) -> Result<usize, DeliveryError> {
        let now = Utc::now();
        let snapshot = CertificateSnapshot::from_validity(
            "example.com",
            "example.com",
            Some("Test Issuer".to_string()),
            now - ChronoDuration::days(60),
            now + ChronoDuration::days(15) + ChronoDuration::hours(1),
            now,
        );
        self.deliver(&snapshot, ReportSource::Fresh).await
    }

    async fn inspect(&self, domain: &str) -> CertificateSnapshot {
        let snapshot = self.inspector.inspect(domain).await;
        self.metrics.record_inspection(&snapshot);
        snapshot
    }

    /// Inspect concurrently, bounded by `max_concurrent_checks`. Results come
    /// back in the order of `domains`.
    async fn inspect_many(&self, domains: &[String]) -> Vec<CertificateSnapshot> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_checks));
        let mut tasks = JoinSet::new();

        for (idx, domain) in domains.iter().enumerate() {
            let inspector = Arc::clone(&self.inspector);
            let semaphore = Arc::clone(&semaphore);
            let domain = domain.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (idx, inspector.inspect(&domain).await)
            });
        }

        let mut results: Vec<Option<CertificateSnapshot>> = vec![None; domains.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, snapshot)) => results[idx] = Some(snapshot),
                Err(e) => error!("Inspection task failed: {}", e),
            }
        }

        results
            .into_iter()
            .zip(domains)
            .map(|(snapshot, domain)| {
                let snapshot = snapshot.unwrap_or_else(|| {
                    let err = InspectionError::Task("task did not complete".to_string());
                    CertificateSnapshot::failed(domain.as_str(), normalize_domain(domain), &err)
                });
                self.metrics.record_inspection(&snapshot);
                snapshot
            })
            .collect()
    }

    /// Decide, record, then deliver. Returns true when an alert was
    /// dispatched, whether or not delivery succeeded.
    async fn dispatch_if_due(
        &self,
        identity: &str,
        snapshot: &CertificateSnapshot,
        report: ReportSource<'_>,
    ) -> bool {
        let days = {
            let mut state = self.state.lock().await;
            // A domain removed while it was being inspected gets no alert
            // and no ledger entry.
            if !state.registry.contains(identity)
                || !state.ledger.should_notify(identity, snapshot)
            {
                return false;
            }
            let Some(days) = snapshot.days_until_expiry else {
                return false;
            };
            state.ledger.record_sent(identity, days);
            days
        };

        info!(
            "Certificate for {} expires in {} days, sending alert",
            identity, days
        );
        self.metrics.record_notification();

        if let Err(e) = self.deliver(snapshot, report).await {
            error!("Failed to deliver alert for {}: {}", identity, e);
        }
        true
    }

    async fn deliver(
        &self,
        snapshot: &CertificateSnapshot,
        report: ReportSource<'_>,
    ) -> Result<usize, DeliveryError> {
        let recipients = self.recipients.load().unwrap_or_else(|e| {
            error!("Failed to load recipients: {}", e);
            Vec::new()
        });
        if recipients.is_empty() {
            warn!(
                "No email addresses configured, {} alert for {} dropped",
                self.delivery.channel_name(),
                snapshot.domain
            );
            self.metrics.record_delivery_failure();
            return Err(DeliveryError::NoRecipients);
        }

        let attachment = self.render_attachment(report).await;

        match self
            .delivery
            .send(&recipients, snapshot, attachment.as_deref())
            .await
        {
            Ok(()) => {
                debug!(
                    "Alert for {} delivered via {} to {} recipients",
                    snapshot.domain,
                    self.delivery.channel_name(),
                    recipients.len()
                );
                Ok(recipients.len())
            }
            Err(e) => {
                warn!(
                    "Delivery via {} failed for {}",
                    self.delivery.channel_name(),
                    snapshot.domain
                );
                self.metrics.record_delivery_failure();
                Err(e)
            }
        }
    }

    async fn render_attachment(&self, report: ReportSource<'_>) -> Option<Vec<u8>> {
        let fresh;
        let snapshots = match report {
            ReportSource::Snapshots(snapshots) => snapshots,
            ReportSource::Fresh => {
                fresh = self.snapshot_all().await;
                &fresh[..]
            }
        };

        let window = self.alert_window_days().await;
        match self.reporter.render(snapshots, window) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Report generation failed, sending alert without attachment: {}", e);
                None
            }
        }
    }
}
