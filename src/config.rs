use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::monitor::{scheduler::DEFAULT_CHECK_INTERVAL, DEFAULT_ALERT_WINDOW_DAYS};
use crate::tls::inspector::DEFAULT_CONNECT_TIMEOUT;

/// Environment variable that overrides `smtp.password`
pub const SMTP_PASSWORD_ENV: &str = "SSL_WATCHER_SMTP_PASSWORD";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    #[serde(default)]
    pub recipients: RecipientsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen_addr: default_listen_addr() }
    }
}

fn default_listen_addr() -> String { "0.0.0.0:5000".to_string() }

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_output")]
    pub output: String,
    #[serde(default)]
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            output: default_log_output(),
            file_path: None,
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "text".to_string() }
fn default_log_output() -> String { "console".to_string() }

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MonitorConfig {
    /// Seconds between scheduler cycles
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    /// Bound on TCP connect and TLS handshake, each
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Alerts fire when days until expiry is at or below this value
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold_days: i64,
    /// Upper bound on inspections running at once during a cycle
    #[serde(default = "default_max_concurrent_checks")]
    pub max_concurrent_checks: usize,
    /// Store the normalized host instead of the raw input as registry identity
    #[serde(default)]
    pub normalize_registry: bool,
    /// Domains monitored from startup
    #[serde(default)]
    pub domains: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval(),
            connect_timeout_secs: default_connect_timeout(),
            alert_threshold_days: default_alert_threshold(),
            max_concurrent_checks: default_max_concurrent_checks(),
            normalize_registry: false,
            domains: Vec::new(),
        }
    }
}

fn default_check_interval() -> u64 { DEFAULT_CHECK_INTERVAL.as_secs() }
fn default_connect_timeout() -> u64 { DEFAULT_CONNECT_TIMEOUT.as_secs() }
fn default_alert_threshold() -> i64 { DEFAULT_ALERT_WINDOW_DAYS }
fn default_max_concurrent_checks() -> usize { 8 }

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SmtpConfig {
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub from_address: String,
    #[serde(default = "default_starttls")]
    pub starttls: bool,
}

fn default_smtp_port() -> u16 { 587 }
fn default_starttls() -> bool { true }

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RecipientsConfig {
    #[serde(default = "default_recipients_path")]
    pub path: String,
}

impl Default for RecipientsConfig {
    fn default() -> Self {
        Self { path: default_recipients_path() }
    }
}

fn default_recipients_path() -> String { "emails.json".to_string() }

/// Read and parse a TOML config file, applying environment overrides
pub fn load_config(path: &str) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path))?;
    let mut config = parse_config(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path))?;

    if let Ok(password) = std::env::var(SMTP_PASSWORD_ENV) {
        if let Some(smtp) = config.smtp.as_mut() {
            smtp.password = password;
        }
    }

    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents)?;
    Ok(config)
}

/// Reject configurations the service cannot run with
pub fn validate_config(config: &Config) -> Result<()> {
    config
        .server
        .listen_addr
        .parse::<SocketAddr>()
        .with_context(|| format!("Invalid listen address: {}", config.server.listen_addr))?;

    if config.monitor.check_interval_secs == 0 {
        bail!("monitor.check_interval_secs must be greater than zero");
    }
    if config.monitor.connect_timeout_secs == 0 {
        bail!("monitor.connect_timeout_secs must be greater than zero");
    }
    if config.monitor.max_concurrent_checks == 0 {
        bail!("monitor.max_concurrent_checks must be greater than zero");
    }

    if let Some(smtp) = &config.smtp {
        if smtp.server.trim().is_empty() {
            bail!("smtp.server must not be empty");
        }
        smtp.from_address
            .parse::<lettre::message::Mailbox>()
            .with_context(|| format!("Invalid smtp.from_address: {}", smtp.from_address))?;
    }

    Ok(())
}
