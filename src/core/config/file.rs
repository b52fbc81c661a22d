//! Defines the structure mirroring the TOML configuration file format.

use serde::Deserialize;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub(crate) network: NetworkConfig,
    #[serde(default)]
    pub(crate) search: SearchConfig,
    #[serde(default)]
    pub(crate) dns: DnsConfig,
    #[serde(default)]
    pub(crate) smtp: SmtpConfig,
    #[serde(default)]
    pub(crate) verification: VerificationConfig,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct NetworkConfig {
    pub(crate) request_timeout: Option<u64>,
    pub(crate) user_agent: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct SearchConfig {
    pub(crate) enable_web_search: Option<bool>,
    pub(crate) search_url: Option<String>,
    pub(crate) max_search_results: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct DnsConfig {
    pub(crate) dns_timeout_ms: Option<u64>,
    pub(crate) dns_servers: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct SmtpConfig {
    pub(crate) smtp_timeout_ms: Option<u64>,
    pub(crate) smtp_port: Option<u16>,
    pub(crate) smtp_sender_email: Option<String>,
    pub(crate) helo_name: Option<String>,
    pub(crate) max_mx_hosts: Option<usize>,
    pub(crate) catch_all_check: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct VerificationConfig {
    pub(crate) verify: Option<bool>,
    pub(crate) extended_patterns: Option<bool>,
    pub(crate) max_patterns_per_contact: Option<usize>,
    pub(crate) pacing_delay_ms: Option<u64>,
    pub(crate) max_concurrency: Option<usize>,
    pub(crate) checkpoint_interval: Option<usize>,
}
