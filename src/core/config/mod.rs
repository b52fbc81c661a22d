//! Defines the core runtime `Config` struct, its defaults, and related utilities.
//! Submodules handle loading, building, and validation.

pub(crate) mod builder;
pub(crate) mod file;
pub(crate) mod loading;
pub(crate) mod validation;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

pub(crate) use crate::core::error::Result;
use regex::Regex;
use std::time::Duration;

/// Syntax check applied to every candidate before it is probed.
pub(crate) const EMAIL_SYNTAX_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

/// Runtime configuration settings used by the email-finder core logic.
pub struct Config {
    pub request_timeout: Duration,
    pub user_agent: String,

    pub enable_web_search: bool,
    pub search_url: String,
    pub max_search_results: usize,

    pub dns_timeout: Duration,
    pub dns_servers: Vec<String>,

    /// Applies to each SMTP step separately: connect, every read, every write.
    pub smtp_timeout: Duration,
    pub smtp_port: u16,
    pub smtp_sender_email: String,
    pub helo_name: String,
    pub max_mx_hosts: usize,
    /// Issue a second RCPT TO for a nonexistent mailbox in the same session.
    pub catch_all_check: bool,

    pub verify: bool,
    pub extended_patterns: bool,
    pub max_patterns_per_contact: usize,
    /// Delay between successive probes for one contact (all against the same domain).
    pub pacing_delay: Duration,
    pub max_concurrency: usize,
    pub checkpoint_interval: usize,

    pub email_regex: Regex,

    pub loaded_config_path: Option<String>,
}

impl Config {
    fn build_default() -> Self {
        let email_regex = Regex::new(EMAIL_SYNTAX_PATTERN)
            .expect("Default email regex pattern failed to compile. This is a bug.");
        let dns_servers = vec![
            "8.8.8.8".to_string(),
            "8.8.4.4".to_string(),
            "1.1.1.1".to_string(),
            "1.0.0.1".to_string(),
        ];

        Config {
            request_timeout: Duration::from_secs(10),
            user_agent: format!("email-finder/{}", env!("CARGO_PKG_VERSION")),
            enable_web_search: true,
            search_url: "https://html.duckduckgo.com/html/".to_string(),
            max_search_results: 10,
            dns_timeout: Duration::from_secs(10),
            dns_servers,
            smtp_timeout: Duration::from_secs(10),
            smtp_port: 25,
            smtp_sender_email: "verify@verify.local".to_string(),
            helo_name: "verify.local".to_string(),
            max_mx_hosts: 2,
            catch_all_check: true,
            verify: true,
            extended_patterns: false,
            max_patterns_per_contact: 8,
            pacing_delay: Duration::from_millis(500),
            max_concurrency: 3,
            checkpoint_interval: 50,
            email_regex,
            loaded_config_path: None,
        }
    }

    /// Quick syntax check run before any network access.
    pub fn is_valid_syntax(&self, email: &str) -> bool {
        self.email_regex.is_match(email)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::build_default()
    }
}

impl Clone for Config {
    fn clone(&self) -> Self {
        Self {
            request_timeout: self.request_timeout,
            user_agent: self.user_agent.clone(),
            enable_web_search: self.enable_web_search,
            search_url: self.search_url.clone(),
            max_search_results: self.max_search_results,
            dns_timeout: self.dns_timeout,
            dns_servers: self.dns_servers.clone(),
            smtp_timeout: self.smtp_timeout,
            smtp_port: self.smtp_port,
            smtp_sender_email: self.smtp_sender_email.clone(),
            helo_name: self.helo_name.clone(),
            max_mx_hosts: self.max_mx_hosts,
            catch_all_check: self.catch_all_check,
            verify: self.verify,
            extended_patterns: self.extended_patterns,
            max_patterns_per_contact: self.max_patterns_per_contact,
            pacing_delay: self.pacing_delay,
            max_concurrency: self.max_concurrency,
            checkpoint_interval: self.checkpoint_interval,
            email_regex: self.email_regex.clone(),
            loaded_config_path: self.loaded_config_path.clone(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .field("enable_web_search", &self.enable_web_search)
            .field("search_url", &self.search_url)
            .field("max_search_results", &self.max_search_results)
            .field("dns_timeout", &self.dns_timeout)
            .field("dns_servers_count", &self.dns_servers.len())
            .field("smtp_timeout", &self.smtp_timeout)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_sender_email", &self.smtp_sender_email)
            .field("helo_name", &self.helo_name)
            .field("max_mx_hosts", &self.max_mx_hosts)
            .field("catch_all_check", &self.catch_all_check)
            .field("verify", &self.verify)
            .field("extended_patterns", &self.extended_patterns)
            .field("max_patterns_per_contact", &self.max_patterns_per_contact)
            .field("pacing_delay", &self.pacing_delay)
            .field("max_concurrency", &self.max_concurrency)
            .field("checkpoint_interval", &self.checkpoint_interval)
            .field("email_regex", &self.email_regex.as_str())
            .field("loaded_config_path", &self.loaded_config_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_check() {
        let config = Config::default();
        assert!(config.is_valid_syntax("john.smith@acme.com"));
        assert!(config.is_valid_syntax("j_s+1@sub.acme.co.uk"));
        assert!(!config.is_valid_syntax("john smith@acme.com"));
        assert!(!config.is_valid_syntax("john@acme"));
        assert!(!config.is_valid_syntax("@acme.com"));
        assert!(!config.is_valid_syntax("john@acme.c"));
    }

    #[test]
    fn test_defaults_match_probe_policy() {
        let config = Config::default();
        assert_eq!(config.smtp_timeout, Duration::from_secs(10));
        assert_eq!(config.max_mx_hosts, 2);
        assert_eq!(config.max_patterns_per_contact, 8);
        assert_eq!(config.checkpoint_interval, 50);
        assert!(config.verify);
        assert!(config.catch_all_check);
    }
}
