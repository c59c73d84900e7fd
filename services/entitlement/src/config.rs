use serde::Deserialize;

use daypass_core::config::Config;

/// Entitlement service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct EntitlementConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port to listen on. Env var: `PORT`.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Transactional-email API endpoint that accepts `{from,to,subject,html,text}`.
    pub mail_api_url: String,
    /// Bearer key for the email API.
    pub mail_api_key: String,
    /// Sender address, e.g. `Daypass <no-reply@example.com>`.
    pub mail_from: String,
    #[serde(default = "default_contact_window_secs")]
    pub contact_window_secs: i64,
    #[serde(default = "default_contact_max_requests")]
    pub contact_max_requests: u32,
    #[serde(default = "default_contact_block_secs")]
    pub contact_block_secs: i64,
    /// Interval of the limiter eviction task.
    #[serde(default = "default_rate_limit_sweep_secs")]
    pub rate_limit_sweep_secs: u64,
}

impl Config for EntitlementConfig {}

fn default_port() -> u16 {
    3120
}

fn default_contact_window_secs() -> i64 {
    60
}

fn default_contact_max_requests() -> u32 {
    5
}

fn default_contact_block_secs() -> i64 {
    900
}

fn default_rate_limit_sweep_secs() -> u64 {
    60
}
