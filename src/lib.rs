//! Monitors TLS certificate expiry for a set of domains, sends at most one
//! alert per countdown value, and renders summary reports on demand.

pub mod api;
pub mod config;
pub mod delivery;
pub mod error;
pub mod monitor;
pub mod observability;
pub mod report;
pub mod state;
pub mod tls;
