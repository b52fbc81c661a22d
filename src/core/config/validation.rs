//! Contains validation logic for the final Config struct.

use super::{Config, Result};
use crate::core::error::AppError;

/// Validates the configuration settings after loading and potential overrides.
/// Mutates the config to clamp values where that is harmless; rejects the rest.
pub(crate) fn validate_config(config: &mut Config) -> Result<()> {
    if config.max_concurrency == 0 {
        return Err(AppError::Config(
            "Max concurrency must be at least 1.".to_string(),
        ));
    }
    if config.smtp_timeout.is_zero() || config.dns_timeout.is_zero() {
        return Err(AppError::Config(
            "SMTP and DNS timeouts must be greater than zero.".to_string(),
        ));
    }
    if config.smtp_port == 0 {
        return Err(AppError::Config("SMTP port cannot be 0.".to_string()));
    }
    if !config.smtp_sender_email.contains('@') || !config.smtp_sender_email.contains('.') {
        return Err(AppError::Config(format!(
            "Invalid SMTP sender email format: {}",
            config.smtp_sender_email
        )));
    }
    if config.helo_name.trim().is_empty() || config.helo_name.contains(char::is_whitespace) {
        return Err(AppError::Config(format!(
            "Invalid EHLO name: '{}'",
            config.helo_name
        )));
    }
    if config.max_mx_hosts == 0 {
        tracing::warn!("Max MX hosts was set to 0. Setting to 1.");
        config.max_mx_hosts = 1;
    }
    if config.max_patterns_per_contact == 0 {
        tracing::warn!("Max patterns per contact was set to 0. Setting to 1.");
        config.max_patterns_per_contact = 1;
    }
    if config.checkpoint_interval == 0 {
        tracing::warn!("Checkpoint interval was set to 0. Setting to 1.");
        config.checkpoint_interval = 1;
    }
    if config.enable_web_search && url::Url::parse(&config.search_url).is_err() {
        return Err(AppError::Config(format!(
            "Invalid search URL: {}",
            config.search_url
        )));
    }
    if config.dns_servers.is_empty() {
        tracing::warn!("DNS servers list is empty. Resolver will use system defaults.");
    }
    if !config.verify && config.extended_patterns {
        tracing::warn!(
            "Extended patterns have no effect without verification; only the first pattern is reported."
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_harmless_zeroes() {
        let mut config = Config::default();
        config.max_mx_hosts = 0;
        config.checkpoint_interval = 0;
        validate_config(&mut config).expect("clamped, not rejected");
        assert_eq!(config.max_mx_hosts, 1);
        assert_eq!(config.checkpoint_interval, 1);
    }

    #[test]
    fn test_rejects_bad_sender() {
        let mut config = Config::default();
        config.smtp_sender_email = "not-an-address".to_string();
        assert!(validate_config(&mut config).is_err());
    }
}
