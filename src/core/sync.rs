//! Hand-off of found addresses to a contact-management system.
//!
//! Only the seam lives here. How records are created or updated downstream is
//! up to the implementation.

use crate::core::error::Result;
use crate::core::models::{Contact, ContactResult};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One contact with a found address, shaped for an upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncContact {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
}

/// Counts reported back by a sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    /// One entry per failed record, `"<email>: <reason>"`.
    pub errors: Vec<String>,
}

impl SyncReport {
    /// At most `limit` errors, plus a trailing "... and N more" line when some were left out.
    pub fn error_sample(&self, limit: usize) -> Vec<String> {
        let mut sample: Vec<String> = self.errors.iter().take(limit).cloned().collect();
        if self.errors.len() > limit {
            sample.push(format!("... and {} more", self.errors.len() - limit));
        }
        sample
    }
}

#[async_trait]
pub trait ContactSync: Send + Sync {
    async fn upsert_contacts(&self, contacts: Vec<SyncContact>) -> Result<SyncReport>;
}

/// Builds sync records for every result that has an address.
///
/// Results are matched to contacts by `row`; results whose row is out of range
/// are skipped.
pub fn build_sync_contacts(contacts: &[Contact], results: &[ContactResult]) -> Vec<SyncContact> {
    let optional = |value: &Option<String>| {
        Some(Contact::field(value).to_string()).filter(|v| !v.is_empty())
    };
    results
        .iter()
        .filter_map(|result| {
            let email = result.found_email.clone()?;
            let contact = contacts.get(result.row)?;
            Some(SyncContact {
                email,
                first_name: result.first_name.clone(),
                last_name: result.last_name.clone(),
                company: optional(&contact.company),
                position: optional(&contact.position),
                linkedin_url: optional(&contact.linkedin_url),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ContactStatus;

    #[test]
    fn test_build_sync_contacts_only_found() {
        let mut ada = Contact::new("Ada", "Lovelace", "Analytical Engines");
        ada.position = Some("Engineer".to_string());
        let grace = Contact::new("Grace", "Hopper", "Navy");
        let contacts = vec![ada, grace];

        let mut found = ContactResult::new(0, &contacts[0], ContactStatus::Verified);
        found.found_email = Some("ada.lovelace@analyticalengines.com".to_string());
        let missing = ContactResult::new(1, &contacts[1], ContactStatus::NotFound);

        let records = build_sync_contacts(&contacts, &[missing, found]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].email, "ada.lovelace@analyticalengines.com");
        assert_eq!(records[0].company.as_deref(), Some("Analytical Engines"));
        assert_eq!(records[0].position.as_deref(), Some("Engineer"));
        assert_eq!(records[0].linkedin_url, None);

        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert!(json.get("linkedinUrl").is_none());
    }

    #[test]
    fn test_error_sample() {
        let report = SyncReport {
            total: 5,
            created: 1,
            updated: 0,
            failed: 4,
            errors: (1..=4).map(|i| format!("e{}@x.com: rejected", i)).collect(),
        };
        assert_eq!(
            report.error_sample(2),
            vec!["e1@x.com: rejected", "e2@x.com: rejected", "... and 2 more"]
        );
        assert_eq!(report.error_sample(10).len(), 4);
    }

    /// Creates unseen addresses, updates known ones, rejects one domain.
    struct RecordingSync {
        known: Vec<String>,
    }

    #[async_trait]
    impl ContactSync for RecordingSync {
        async fn upsert_contacts(&self, contacts: Vec<SyncContact>) -> Result<SyncReport> {
            let mut report = SyncReport {
                total: contacts.len(),
                ..Default::default()
            };
            for contact in contacts {
                if contact.email.ends_with("@blocked.com") {
                    report.failed += 1;
                    report.errors.push(format!("{}: blocked domain", contact.email));
                } else if self.known.contains(&contact.email) {
                    report.updated += 1;
                } else {
                    report.created += 1;
                }
            }
            Ok(report)
        }
    }

    #[tokio::test]
    async fn test_sync_counts() {
        let sync = RecordingSync {
            known: vec!["b@acme.com".to_string()],
        };
        let contacts = ["a@acme.com", "b@acme.com", "c@blocked.com"]
            .iter()
            .map(|email| SyncContact {
                email: email.to_string(),
                first_name: "A".to_string(),
                last_name: "B".to_string(),
                company: None,
                position: None,
                linkedin_url: None,
            })
            .collect();
        let report = sync.upsert_contacts(contacts).await.unwrap();
        assert_eq!((report.total, report.created, report.updated, report.failed), (3, 1, 1, 1));
        assert_eq!(report.error_sample(5), vec!["c@blocked.com: blocked domain"]);
    }
}
