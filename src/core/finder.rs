//! Per-contact discovery: resolve the domain, generate candidates, probe them in order.

use crate::core::cache::RunCaches;
use crate::core::config::validation::validate_config;
use crate::core::config::Config;
use crate::core::error::{AppError, ErrorKind, Result};
use crate::core::models::{Contact, ContactResult, ContactStatus, VerificationOutcome};
use crate::core::resolver::DomainResolver;
use crate::utils::dns::{DnsLookup, TrustDnsLookup};
use crate::utils::patterns::{generate_email_patterns, generate_email_patterns_extended};
use crate::utils::search::{DuckDuckGoSearch, WebSearch};
use crate::utils::smtp::{MailServerProbe, MailboxProbe};

use std::sync::Arc;
use tokio::time::sleep;

/// Finds one email per contact. Cheap to share across workers behind an `Arc`.
#[derive(Clone)]
pub struct EmailFinder {
    config: Arc<Config>,
    resolver: DomainResolver,
    probe: Arc<dyn MailboxProbe>,
}

impl EmailFinder {
    pub fn new(config: Arc<Config>, resolver: DomainResolver, probe: Arc<dyn MailboxProbe>) -> Self {
        Self {
            config,
            resolver,
            probe,
        }
    }

    /// Builds the production collaborators: trust-dns lookups, DuckDuckGo search
    /// (when enabled) and the SMTP probe. The config is validated first.
    pub fn from_config(mut config: Config) -> Result<Self> {
        tracing::debug!("Initializing EmailFinder components...");
        validate_config(&mut config)?;
        let config = Arc::new(config);

        let dns: Arc<dyn DnsLookup> = Arc::new(TrustDnsLookup::from_config(&config)?);
        tracing::debug!("DNS resolver initialized.");

        let search: Option<Arc<dyn WebSearch>> = if config.enable_web_search {
            Some(Arc::new(DuckDuckGoSearch::from_config(&config)?))
        } else {
            tracing::debug!("Web search fallback disabled.");
            None
        };

        let resolver = DomainResolver::new(Arc::clone(&dns), search, config.max_search_results);
        let probe: Arc<dyn MailboxProbe> =
            Arc::new(MailServerProbe::new(Arc::clone(&config), dns));

        tracing::info!("EmailFinder initialized successfully.");
        Ok(Self::new(config, resolver, probe))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the whole procedure for one contact. Never fails: every problem ends
    /// up as the result's status, `failure` and `detail`.
    pub async fn find_email_for_contact(
        &self,
        row: usize,
        contact: &Contact,
        caches: &RunCaches,
    ) -> ContactResult {
        let Some((first_name, last_name, company)) = contact.required_fields() else {
            let reason = missing_fields(contact);
            tracing::warn!(target: "find_email_task", "[row {}] Skipping contact: {}", row, reason);
            let mut result = ContactResult::new(row, contact, ContactStatus::MissingData);
            result.failure = AppError::InsufficientInput(reason.clone()).kind();
            result.detail = Some(reason);
            return result;
        };
        let task_label = format!("{} {} / {}", first_name, last_name, company);
        tracing::info!(target: "find_email_task", "[{}] Starting email discovery", task_label);

        let mut result = ContactResult::new(row, contact, ContactStatus::NoDomain);

        let Some(candidate) = self.resolver.resolve(company, &caches.domains).await else {
            tracing::warn!(target: "find_email_task", "[{}] No domain found for company", task_label);
            result.failure = Some(ErrorKind::DomainUnresolved);
            result.detail = Some(format!("Could not determine a domain for '{}'", company));
            return result;
        };
        result.domain = Some(candidate.domain.clone());
        result.domain_verified = candidate.verified;

        let patterns = if self.config.extended_patterns {
            generate_email_patterns_extended(first_name, last_name, &candidate.domain)
        } else {
            generate_email_patterns(first_name, last_name, &candidate.domain)
        };
        if patterns.is_empty() {
            tracing::warn!(target: "find_email_task", "[{}] Names produced no usable patterns", task_label);
            result.status = ContactStatus::NoPatterns;
            result.failure = Some(ErrorKind::NoPatternsGenerated);
            result.detail = Some("Names contain no usable characters after normalization".to_string());
            return result;
        }
        tracing::debug!(target: "find_email_task", "[{}] {} candidates: {:?}", task_label, patterns.len(), patterns);

        if !self.config.verify {
            result.status = ContactStatus::Unverified;
            result.found_email = Some(patterns[0].clone());
            result.patterns_tried = 1;
            result.detail = Some("Verification disabled; most common pattern".to_string());
            tracing::info!(target: "find_email_task", "[{}] Using unverified {}", task_label, patterns[0]);
            return result;
        }

        let mut attempted = 0;
        for (index, email) in patterns
            .iter()
            .take(self.config.max_patterns_per_contact)
            .enumerate()
        {
            if !self.config.is_valid_syntax(email) {
                tracing::debug!(target: "find_email_task", "[{}] Skipping {}: invalid syntax", task_label, email);
                result.failure = Some(ErrorKind::SyntaxInvalidCandidate);
                continue;
            }
            if attempted > 0 && !self.config.pacing_delay.is_zero() {
                sleep(self.config.pacing_delay).await;
            }
            attempted += 1;

            let probe = self.probe.probe(email, &caches.mx).await;
            tracing::debug!(target: "find_email_task",
                "[{}] {} -> {:?} ({})", task_label, email, probe.outcome, probe.message);
            result.evidence = Some(probe.evidence);
            result.detail = Some(probe.message);

            match probe.outcome {
                VerificationOutcome::Valid => {
                    result.status = ContactStatus::Verified;
                    result.found_email = Some(email.clone());
                    result.patterns_tried = index + 1;
                    result.failure = None;
                    tracing::info!(target: "find_email_task", "[{}] ✓ Verified {}", task_label, email);
                    return result;
                }
                VerificationOutcome::CatchAll => {
                    // Every address would be accepted; report the most likely one.
                    result.status = ContactStatus::CatchAll;
                    result.found_email = Some(patterns[0].clone());
                    result.patterns_tried = index + 1;
                    result.failure = Some(ErrorKind::CatchAllIndeterminate);
                    tracing::info!(target: "find_email_task",
                        "[{}] Catch-all domain; reporting {}", task_label, patterns[0]);
                    return result;
                }
                VerificationOutcome::Invalid | VerificationOutcome::Unknown => {
                    if probe.failure.is_some() {
                        result.failure = probe.failure;
                    }
                }
            }
        }

        result.status = ContactStatus::NotFound;
        result.patterns_tried = attempted;
        tracing::info!(target: "find_email_task",
            "[{}] No deliverable address among {} probed", task_label, attempted);
        result
    }
}

fn missing_fields(contact: &Contact) -> String {
    let missing: Vec<&str> = [
        ("first name", &contact.first_name),
        ("last name", &contact.last_name),
        ("company", &contact.company),
    ]
    .into_iter()
    .filter(|(_, value)| Contact::field(value).is_empty())
    .map(|(name, _)| name)
    .collect();
    format!("Missing {}", missing.join(", "))
}
