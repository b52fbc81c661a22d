//! Resolves a company name to its most likely email domain.

use crate::core::cache::DomainCache;
use crate::core::models::{DomainCandidate, DomainProvenance};
use crate::utils::dns::{domain_exists, DnsLookup};
use crate::utils::domain::{guess_domain, known_domain_for, normalize_company_name, pick_company_host};
use crate::utils::search::WebSearch;

use std::sync::Arc;

/// Table lookup, string guess, DNS check and web search, in that order.
#[derive(Clone)]
pub struct DomainResolver {
    dns: Arc<dyn DnsLookup>,
    search: Option<Arc<dyn WebSearch>>,
    max_search_results: usize,
}

impl DomainResolver {
    pub fn new(
        dns: Arc<dyn DnsLookup>,
        search: Option<Arc<dyn WebSearch>>,
        max_search_results: usize,
    ) -> Self {
        Self {
            dns,
            search,
            max_search_results,
        }
    }

    /// Returns the best domain for `company`, or `None` when nothing plausible exists.
    ///
    /// A verified domain has an MX or A record. When neither the first guess nor
    /// the search result verifies, the first guess is returned unverified.
    /// Results are cached under the normalized company name, so a second call for
    /// the same company makes no network requests.
    pub async fn resolve(&self, company: &str, cache: &DomainCache) -> Option<DomainCandidate> {
        let key = normalize_company_name(company);
        if key.is_empty() {
            tracing::debug!(target: "domain_task", "Company '{}' normalizes to nothing", company);
            return None;
        }
        if let Some(candidate) = cache.get(&key) {
            tracing::trace!(target: "domain_task", "Domain cache hit for '{}': {}", key, candidate.domain);
            return Some(candidate);
        }

        let first_guess = match known_domain_for(&key) {
            Some(domain) => Some((domain.to_string(), DomainProvenance::KnownTable)),
            None => guess_domain(&key).map(|domain| (domain, DomainProvenance::GuessedTransform)),
        };

        if let Some((domain, provenance)) = &first_guess {
            tracing::debug!(target: "domain_task", "Trying {} for '{}' ({:?})", domain, company, provenance);
            if self.is_verified(domain).await {
                tracing::info!(target: "domain_task", "Resolved '{}' to {}", company, domain);
                return Some(self.store(cache, key, domain.clone(), *provenance, true));
            }
        }

        if let Some(domain) = self.search_for_domain(company, &key).await {
            let already_checked = first_guess.as_ref().is_some_and(|(guess, _)| guess == &domain);
            if !already_checked && self.is_verified(&domain).await {
                tracing::info!(target: "domain_task", "Resolved '{}' to {} via web search", company, domain);
                return Some(self.store(cache, key, domain, DomainProvenance::SearchDerived, true));
            }
        }

        let (domain, provenance) = first_guess?;
        tracing::warn!(target: "domain_task", "Could not verify a domain for '{}'; using unverified {}", company, domain);
        Some(self.store(cache, key, domain, provenance, false))
    }

    fn store(
        &self,
        cache: &DomainCache,
        key: String,
        domain: String,
        provenance: DomainProvenance,
        verified: bool,
    ) -> DomainCandidate {
        cache.insert_if_absent(
            key,
            DomainCandidate {
                domain,
                provenance,
                verified,
            },
        )
    }

    async fn is_verified(&self, domain: &str) -> bool {
        match domain_exists(self.dns.as_ref(), domain).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!(target: "domain_task", "DNS check for {} failed: {}", domain, e);
                false
            }
        }
    }

    async fn search_for_domain(&self, company: &str, normalized: &str) -> Option<String> {
        let search = self.search.as_ref()?;
        let query = format!("{} official website", company.trim());
        match search.search(&query).await {
            Ok(links) => {
                let host = pick_company_host(&links, normalized, self.max_search_results);
                tracing::debug!(target: "domain_task", "Search for '{}' suggested {:?}", company, host);
                host
            }
            Err(e) => {
                tracing::warn!(target: "domain_task", "Web search for '{}' failed: {}", company, e);
                None
            }
        }
    }
}
