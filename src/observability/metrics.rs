use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

use crate::tls::{CertificateSnapshot, CertificateStatus};

/// Prometheus counters for the monitoring loop and alert path
pub struct MetricsCollector {
    registry: Registry,
    inspections: IntCounter,
    inspection_errors: IntCounter,
    notifications: IntCounter,
    delivery_failures: IntCounter,
    check_cycles: IntCounter,
    monitored_domains: IntGauge,
}

impl MetricsCollector {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let inspections = IntCounter::new(
            "ssl_watcher_inspections_total",
            "Total number of certificate inspections",
        )?;
        let inspection_errors = IntCounter::new(
            "ssl_watcher_inspection_errors_total",
            "Inspections that ended in error status",
        )?;
        let notifications = IntCounter::new(
            "ssl_watcher_notifications_total",
            "Expiry alerts dispatched",
        )?;
        let delivery_failures = IntCounter::new(
            "ssl_watcher_delivery_failures_total",
            "Expiry alerts the transport failed to deliver",
        )?;
        let check_cycles = IntCounter::new(
            "ssl_watcher_check_cycles_total",
            "Completed check cycles, scheduled or manual",
        )?;
        let monitored_domains = IntGauge::new(
            "ssl_watcher_monitored_domains",
            "Number of domains in the registry",
        )?;

        registry.register(Box::new(inspections.clone()))?;
        registry.register(Box::new(inspection_errors.clone()))?;
        registry.register(Box::new(notifications.clone()))?;
        registry.register(Box::new(delivery_failures.clone()))?;
        registry.register(Box::new(check_cycles.clone()))?;
        registry.register(Box::new(monitored_domains.clone()))?;

        Ok(Self {
            registry,
            inspections,
            inspection_errors,
            notifications,
            delivery_failures,
            check_cycles,
            monitored_domains,
        })
    }

    pub fn record_inspection(&self, snapshot: &CertificateSnapshot) {
        self.inspections.inc();
        if snapshot.status == CertificateStatus::Error {
            self.inspection_errors.inc();
        }
    }

    pub fn record_notification(&self) {
        self.notifications.inc();
    }

    pub fn record_delivery_failure(&self) {
        self.delivery_failures.inc();
    }

    pub fn record_cycle(&self) {
        self.check_cycles.inc();
    }

    pub fn set_monitored_domains(&self, count: usize) {
        self.monitored_domains.set(count as i64);
    }

    pub fn inspections(&self) -> u64 {
        self.inspections.get()
    }

    pub fn notifications(&self) -> u64 {
        self.notifications.get()
    }

    pub fn delivery_failures(&self) -> u64 {
        self.delivery_failures.get()
    }

    pub fn export_metrics(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
