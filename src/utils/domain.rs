//! Utility functions for handling company names, domain names and URLs.

use crate::core::error::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Well-known companies whose mail domain differs from, or is faster than, a guess.
pub(crate) const KNOWN_DOMAINS: &[(&str, &str)] = &[
    ("google", "google.com"),
    ("microsoft", "microsoft.com"),
    ("apple", "apple.com"),
    ("amazon", "amazon.com"),
    ("meta", "meta.com"),
    ("facebook", "meta.com"),
    ("netflix", "netflix.com"),
    ("salesforce", "salesforce.com"),
    ("oracle", "oracle.com"),
    ("ibm", "ibm.com"),
    ("intel", "intel.com"),
    ("cisco", "cisco.com"),
    ("adobe", "adobe.com"),
    ("spotify", "spotify.com"),
    ("uber", "uber.com"),
    ("airbnb", "airbnb.com"),
    ("linkedin", "linkedin.com"),
    ("twitter", "x.com"),
    ("stripe", "stripe.com"),
    ("shopify", "shopify.com"),
    ("slack", "slack.com"),
    ("zoom", "zoom.us"),
    ("dropbox", "dropbox.com"),
    ("hubspot", "hubspot.com"),
    ("mailchimp", "mailchimp.com"),
    ("twilio", "twilio.com"),
    ("datadog", "datadoghq.com"),
    ("snowflake", "snowflake.com"),
    ("palantir", "palantir.com"),
];

/// Hosts that show up in search results but never belong to the company searched for.
const NON_COMPANY_HOSTS: &[&str] = &[
    "duckduckgo",
    "google",
    "bing",
    "yahoo",
    "wikipedia",
    "linkedin.com",
    "facebook.com",
    "twitter.com",
    "youtube.com",
    "instagram.com",
    "glassdoor",
    "indeed",
    "crunchbase",
    "bloomberg",
    "zoominfo",
];

static LEGAL_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s+(inc\.?|llc\.?|ltd\.?|corp\.?|corporation|company|co\.?|group|holdings?|technologies|technology|solutions|services|international|worldwide|global)$",
    )
    .expect("legal suffix regex must compile")
});

static TRAILING_CLAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s),.*$").expect("trailing clause regex must compile"));

/// Normalizes a company name for table matching and cache keys.
///
/// Case-folds, then strips trailing comma clauses and legal-entity suffixes
/// until nothing changes, so "Acme Holdings Group, Inc." becomes "acme".
/// Idempotent. Empty input yields `""`.
pub fn normalize_company_name(company: &str) -> String {
    let mut current = company.trim().to_lowercase();
    loop {
        let without_clause = TRAILING_CLAUSE_RE.replace(&current, "");
        let without_suffix = LEGAL_SUFFIX_RE.replace(&without_clause, "");
        let next = without_suffix.trim().to_string();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Case-insensitive substring match against the known table, in either direction.
pub(crate) fn known_domain_for(normalized: &str) -> Option<&'static str> {
    if normalized.is_empty() {
        return None;
    }
    KNOWN_DOMAINS
        .iter()
        .find(|(key, _)| normalized.contains(key) || key.contains(normalized))
        .map(|(_, domain)| *domain)
}

/// `<alphanumerics of the normalized name>.com`, or `None` if nothing is left.
pub(crate) fn guess_domain(normalized: &str) -> Option<String> {
    let simple: String = normalized
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();
    if simple.is_empty() {
        None
    } else {
        Some(format!("{}.com", simple))
    }
}

/// Picks the first result host that looks like it belongs to the company.
///
/// Only the first `max_results` links are considered. A host matches when any
/// word of the normalized name longer than two characters occurs in it.
pub(crate) fn pick_company_host(
    links: &[String],
    normalized_company: &str,
    max_results: usize,
) -> Option<String> {
    let tokens: Vec<&str> = normalized_company
        .split_whitespace()
        .filter(|word| word.len() > 2)
        .collect();
    if tokens.is_empty() {
        return None;
    }

    for link in links.iter().take(max_results) {
        let host = match get_domain_from_url(link) {
            Ok(host) => host,
            Err(e) => {
                tracing::trace!(target: "domain_task", "Skipping result link {}: {}", link, e);
                continue;
            }
        };
        if NON_COMPANY_HOSTS.iter().any(|skip| host.contains(skip)) {
            continue;
        }
        if tokens.iter().any(|token| host.contains(token)) {
            return Some(host);
        }
    }
    None
}

/// Extracts the base domain name (e.g., "example.com") from a given URL or domain string.
///
/// Handles common variations:
/// - Adds `https://` scheme if missing.
/// - Removes common `www.` prefix.
/// - Converts to lowercase.
///
/// Returns `Err(AppError::DomainExtraction)` if the input is empty or a host cannot be parsed.
pub(crate) fn get_domain_from_url(website_url_or_domain: &str) -> Result<String> {
    let trimmed_input = website_url_or_domain.trim();
    if trimmed_input.is_empty() {
        return Err(AppError::DomainExtraction(
            "Input string is empty".to_string(),
        ));
    }

    let url_str_with_scheme = if !trimmed_input.contains("://") {
        format!("https://{}", trimmed_input)
    } else {
        trimmed_input.to_string()
    };

    let url = Url::parse(&url_str_with_scheme)?;
    let host = url.host_str().ok_or_else(|| {
        AppError::DomainExtraction(format!("Could not extract host from parsed URL: {}", url))
    })?;

    let domain = host.strip_prefix("www.").unwrap_or(host).to_lowercase();
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(AppError::DomainExtraction(format!(
            "Extracted domain appears invalid: {}",
            domain
        )));
    }
    Ok(domain)
}
