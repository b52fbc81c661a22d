//! Provides the `ConfigBuilder` for fluent configuration construction.

use super::loading::{apply_file_config, load_config_file};
use super::validation::validate_config;
use super::{Config, ConfigFile, Result};
use crate::AppError;
use std::path::Path;
use std::time::Duration;

/// Builder pattern for creating `Config` instances fluently.
///
/// This is the primary way users should create a `Config` object.
/// It handles loading from files, applying overrides, and validation.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    config_file_path: Option<String>,
    skip_default_files: bool,
    overrides: ConfigFile,
}

impl ConfigBuilder {
    /// Creates a new builder with default configuration values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify an optional configuration file path to load.
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    /// Do not look for `./email-finder.toml` / `./config.toml` when no file was given.
    pub fn without_default_files(mut self) -> Self {
        self.skip_default_files = true;
        self
    }

    pub fn max_concurrency(mut self, value: usize) -> Self {
        self.overrides.verification.max_concurrency = Some(value);
        self
    }
    pub fn checkpoint_interval(mut self, value: usize) -> Self {
        self.overrides.verification.checkpoint_interval = Some(value);
        self
    }
    pub fn verify(mut self, enable: bool) -> Self {
        self.overrides.verification.verify = Some(enable);
        self
    }
    pub fn extended_patterns(mut self, enable: bool) -> Self {
        self.overrides.verification.extended_patterns = Some(enable);
        self
    }
    pub fn max_patterns_per_contact(mut self, value: usize) -> Self {
        self.overrides.verification.max_patterns_per_contact = Some(value);
        self
    }
    pub fn pacing_delay(mut self, duration: Duration) -> Self {
        self.overrides.verification.pacing_delay_ms = Some(duration.as_millis() as u64);
        self
    }
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.overrides.network.request_timeout = Some(duration.as_secs());
        self
    }
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.overrides.network.user_agent = Some(value.into());
        self
    }
    pub fn enable_web_search(mut self, enable: bool) -> Self {
        self.overrides.search.enable_web_search = Some(enable);
        self
    }
    pub fn search_url(mut self, value: impl Into<String>) -> Self {
        self.overrides.search.search_url = Some(value.into());
        self
    }
    pub fn smtp_timeout(mut self, duration: Duration) -> Self {
        self.overrides.smtp.smtp_timeout_ms = Some(duration.as_millis() as u64);
        self
    }
    pub fn smtp_port(mut self, port: u16) -> Self {
        self.overrides.smtp.smtp_port = Some(port);
        self
    }
    pub fn smtp_sender_email(mut self, value: impl Into<String>) -> Self {
        self.overrides.smtp.smtp_sender_email = Some(value.into());
        self
    }
    pub fn helo_name(mut self, value: impl Into<String>) -> Self {
        self.overrides.smtp.helo_name = Some(value.into());
        self
    }
    pub fn max_mx_hosts(mut self, value: usize) -> Self {
        self.overrides.smtp.max_mx_hosts = Some(value);
        self
    }
    pub fn catch_all_check(mut self, enable: bool) -> Self {
        self.overrides.smtp.catch_all_check = Some(enable);
        self
    }
    pub fn dns_timeout(mut self, duration: Duration) -> Self {
        self.overrides.dns.dns_timeout_ms = Some(duration.as_millis() as u64);
        self
    }
    pub fn dns_servers(mut self, servers: Vec<String>) -> Self {
        self.overrides.dns.dns_servers = Some(servers);
        self
    }

    /// Builds the final `Config` object, applying defaults, file settings, overrides, and validation.
    pub fn build(mut self) -> Result<Config> {
        let mut loaded_path: Option<String> = None;

        if let Some(ref path) = self.config_file_path {
            match load_config_file(path) {
                Ok(file_config) => {
                    apply_file_config(&mut self.config, &file_config);
                    loaded_path = Some(path.clone());
                    tracing::info!("Loaded base configuration from specified file: {}", path);
                }
                Err(e) => {
                    tracing::error!("Failed to load specified config file '{}': {}", path, e);
                    return Err(AppError::Config(format!(
                        "Failed to load specified configuration file '{}': {}",
                        path, e
                    )));
                }
            }
        } else if !self.skip_default_files {
            tracing::debug!("No config file specified, checking default locations.");
            for path_str in ["./email-finder.toml", "./config.toml"] {
                if Path::new(path_str).exists() {
                    tracing::debug!("Found potential default config file: {}", path_str);
                    match load_config_file(path_str) {
                        Ok(file_config) => {
                            apply_file_config(&mut self.config, &file_config);
                            loaded_path = Some(path_str.to_string());
                            tracing::info!(
                                "Loaded base configuration from default location: {}",
                                path_str
                            );
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Failed to load or parse default config '{}': {}",
                                path_str,
                                e
                            );
                        }
                    }
                }
            }
            if loaded_path.is_none() {
                tracing::info!("No configuration file found. Using default values and overrides.");
            }
        }

        apply_file_config(&mut self.config, &self.overrides);
        self.config.loaded_config_path = loaded_path;
        validate_config(&mut self.config)?;

        tracing::debug!("Final configuration built successfully.");
        Ok(self.config)
    }
}
