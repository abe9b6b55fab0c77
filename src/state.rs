use crate::config::MonitorConfig;
use crate::monitor::ledger::NotificationLedger;
use crate::monitor::registry::DomainRegistry;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Registry and ledger, always mutated together under one lock
#[derive(Debug, Clone, Default)]
pub struct MonitorState {
    pub registry: DomainRegistry,
    pub ledger: NotificationLedger,
}

pub type SharedState = Arc<Mutex<MonitorState>>;

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        let mut registry = DomainRegistry::new(config.normalize_registry);
        for domain in &config.domains {
            registry.add(domain);
        }

        Self {
            registry,
            ledger: NotificationLedger::new(config.alert_threshold_days),
        }
    }

    /// Remove a domain and its ledger entry in one step
    pub fn remove_domain(&mut self, domain: &str) -> Option<String> {
        let identity = self.registry.remove(domain)?;
        self.ledger.purge(&identity);
        Some(identity)
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }
}
