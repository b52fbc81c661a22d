//! Handles loading configuration from files and applying it to the Config struct.

use super::{Config, ConfigFile};
use anyhow::Context;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Loads configuration settings from a TOML file.
/// Returns the parsed `ConfigFile` content.
pub(crate) fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!(
            "File not found or is not a file: {}",
            file_path
        ));
    }
    tracing::debug!("Attempting to read config file: {}", file_path);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    parse_config_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))
}

pub(crate) fn parse_config_str(content: &str) -> anyhow::Result<ConfigFile> {
    let config_file_content: ConfigFile = toml::from_str(content)?;
    Ok(config_file_content)
}

/// Applies settings from a parsed `ConfigFile` onto a mutable `Config` instance.
/// Used for both file contents and builder overrides, so only `Some` values win.
pub(crate) fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    // Network
    if let Some(timeout) = file_config.network.request_timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }
    if let Some(ref user_agent) = file_config.network.user_agent {
        config.user_agent = user_agent.clone();
    }

    // Search
    if let Some(enable) = file_config.search.enable_web_search {
        config.enable_web_search = enable;
    }
    if let Some(ref url) = file_config.search.search_url {
        if !url.trim().is_empty() {
            config.search_url = url.trim().to_string();
        }
    }
    if let Some(max) = file_config.search.max_search_results {
        config.max_search_results = max;
    }

    // DNS
    if let Some(timeout) = file_config.dns.dns_timeout_ms {
        config.dns_timeout = Duration::from_millis(timeout);
    }
    if let Some(ref servers) = file_config.dns.dns_servers {
        config.dns_servers = servers.clone();
    }

    // SMTP
    if let Some(timeout) = file_config.smtp.smtp_timeout_ms {
        config.smtp_timeout = Duration::from_millis(timeout);
    }
    if let Some(port) = file_config.smtp.smtp_port {
        config.smtp_port = port;
    }
    if let Some(ref sender) = file_config.smtp.smtp_sender_email {
        config.smtp_sender_email = sender.clone();
    }
    if let Some(ref helo) = file_config.smtp.helo_name {
        config.helo_name = helo.clone();
    }
    if let Some(hosts) = file_config.smtp.max_mx_hosts {
        config.max_mx_hosts = hosts;
    }
    if let Some(enable) = file_config.smtp.catch_all_check {
        config.catch_all_check = enable;
    }

    // Verification
    if let Some(verify) = file_config.verification.verify {
        config.verify = verify;
    }
    if let Some(extended) = file_config.verification.extended_patterns {
        config.extended_patterns = extended;
    }
    if let Some(max) = file_config.verification.max_patterns_per_contact {
        config.max_patterns_per_contact = max;
    }
    if let Some(delay) = file_config.verification.pacing_delay_ms {
        config.pacing_delay = Duration::from_millis(delay);
    }
    if let Some(concurrency) = file_config.verification.max_concurrency {
        config.max_concurrency = concurrency;
    }
    if let Some(interval) = file_config.verification.checkpoint_interval {
        config.checkpoint_interval = interval;
    }
}
