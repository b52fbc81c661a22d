//! Defines the primary data structures used throughout the application.

use crate::core::error::ErrorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Represents the input contact information.
///
/// Field aliases accept the column names of a LinkedIn connections export,
/// so rows converted from that CSV deserialize without renaming.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Contact {
    #[serde(default, alias = "First Name", alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "Last Name", alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default, alias = "Company", alias = "company_name", alias = "companyName")]
    pub company: Option<String>,
    #[serde(default, alias = "Position", skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, alias = "URL", alias = "linkedinUrl", skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(flatten)]
    pub other_fields: HashMap<String, serde_json::Value>,
}

impl Contact {
    pub fn new(first_name: &str, last_name: &str, company: &str) -> Self {
        Self {
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            company: Some(company.to_string()),
            ..Default::default()
        }
    }

    /// Returns the trimmed value of an optional field, or `""`.
    pub(crate) fn field(value: &Option<String>) -> &str {
        value.as_deref().map(str::trim).unwrap_or("")
    }

    /// The three fields the pipeline needs, trimmed. `None` if any is blank.
    pub(crate) fn required_fields(&self) -> Option<(&str, &str, &str)> {
        let first = Self::field(&self.first_name);
        let last = Self::field(&self.last_name);
        let company = Self::field(&self.company);
        if first.is_empty() || last.is_empty() || company.is_empty() {
            None
        } else {
            Some((first, last, company))
        }
    }
}

/// Where a resolved company domain came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainProvenance {
    KnownTable,
    GuessedTransform,
    SearchDerived,
}

/// A best-guess domain for a company, with its provenance and DNS status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCandidate {
    pub domain: String,
    pub provenance: DomainProvenance,
    /// True once an MX or A record has been seen for `domain`.
    pub verified: bool,
}

/// Classification of a single candidate address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Valid,
    Invalid,
    CatchAll,
    /// The probe reached no conclusion. Not the same as `Invalid`.
    Unknown,
}

impl VerificationOutcome {
    pub fn is_conclusive(self) -> bool {
        !matches!(self, VerificationOutcome::Unknown)
    }
}

/// How an outcome was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    /// Rejected by the local syntax check, no network access.
    Syntax,
    /// Decided by an SMTP dialogue with a mail exchanger.
    Smtp,
    /// Fallback based only on the presence of MX/A records. Weaker than `Smtp`.
    MxHeuristic,
}

/// Final status of one contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    MissingData,
    NoDomain,
    NoPatterns,
    Verified,
    CatchAll,
    Unverified,
    NotFound,
}

impl ContactStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContactStatus::MissingData => "missing_data",
            ContactStatus::NoDomain => "no_domain",
            ContactStatus::NoPatterns => "no_patterns",
            ContactStatus::Verified => "verified",
            ContactStatus::CatchAll => "catch_all",
            ContactStatus::Unverified => "unverified",
            ContactStatus::NotFound => "not_found",
        }
    }

    /// Whether the contact ends up with an address to use.
    pub fn has_email(self) -> bool {
        matches!(
            self,
            ContactStatus::Verified | ContactStatus::CatchAll | ContactStatus::Unverified
        )
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one input contact. Built once by the finder and never changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactResult {
    /// Position of the contact in the input, used as the upsert key by sinks.
    pub row: usize,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub domain: Option<String>,
    #[serde(default)]
    pub domain_verified: bool,
    pub found_email: Option<String>,
    pub status: ContactStatus,
    pub patterns_tried: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ContactResult {
    pub(crate) fn new(row: usize, contact: &Contact, status: ContactStatus) -> Self {
        Self {
            row,
            first_name: Contact::field(&contact.first_name).to_string(),
            last_name: Contact::field(&contact.last_name).to_string(),
            company: Contact::field(&contact.company).to_string(),
            domain: None,
            domain_verified: false,
            found_email: None,
            status,
            patterns_tried: 0,
            evidence: None,
            failure: None,
            detail: None,
        }
    }
}

/// Running counters, updated once per completed contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total: usize,
    pub found: usize,
    pub verified: usize,
    pub catch_all: usize,
    pub unverified: usize,
    pub no_domain: usize,
    pub no_match: usize,
    pub missing_data: usize,
    pub no_patterns: usize,
}

impl RunStats {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, result: &ContactResult) {
        match result.status {
            ContactStatus::Verified => self.verified += 1,
            ContactStatus::CatchAll => self.catch_all += 1,
            ContactStatus::Unverified => self.unverified += 1,
            ContactStatus::NoDomain => self.no_domain += 1,
            ContactStatus::NotFound => self.no_match += 1,
            ContactStatus::MissingData => self.missing_data += 1,
            ContactStatus::NoPatterns => self.no_patterns += 1,
        }
        if result.status.has_email() {
            self.found += 1;
        }
    }

    /// Number of contacts that reached a final status.
    pub fn completed(&self) -> usize {
        self.found + self.no_domain + self.no_match + self.missing_data + self.no_patterns
    }

    /// Share of all input contacts with an address, in percent.
    pub fn success_rate(&self) -> f64 {
        self.found as f64 / self.total.max(1) as f64 * 100.0
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub stats: RunStats,
    /// In completion order, which carries no meaning. Sort by `row` if needed.
    pub results: Vec<ContactResult>,
    /// Contacts whose work was interrupted by cancellation.
    pub not_completed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
