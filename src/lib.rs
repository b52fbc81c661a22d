//! # Email Finder Core Library
//!
//! Finds a person's likely work email address from their name and employer,
//! then checks it against the employer's mail servers without sending mail.
//!
//! The pipeline per contact is: company name → domain (known table, guess, DNS,
//! web search) → ordered candidate addresses → SMTP RCPT TO probe per candidate,
//! stopping at the first conclusive answer. [`process_contacts`] runs that
//! pipeline for many contacts on a bounded pool of workers.
//!
//! It is designed to be used either directly as a library or via the
//! `email-finder` command-line tool.

mod core;
mod utils;

pub use crate::core::cache::{DomainCache, MxCache, RunCaches};
pub use crate::core::config::{Config, ConfigBuilder, ConfigFile};
pub use crate::core::error::{AppError, ErrorKind, Result};
pub use crate::core::finder::EmailFinder;
pub use crate::core::models::{
    Contact, ContactResult, ContactStatus, DomainCandidate, DomainProvenance, Evidence, RunReport,
    RunStats, VerificationOutcome,
};
pub use crate::core::resolver::DomainResolver;
pub use crate::core::sink::{MemorySink, ResultSink};
pub use crate::core::sync::{build_sync_contacts, ContactSync, SyncContact, SyncReport};
pub use crate::utils::dns::{DnsLookup, MxRecord, TrustDnsLookup};
pub use crate::utils::domain::normalize_company_name;
pub use crate::utils::patterns::{
    generate_email_patterns, generate_email_patterns_extended, normalize_name, NameParts,
};
pub use crate::utils::search::{DuckDuckGoSearch, WebSearch};
pub use crate::utils::smtp::{MailServerProbe, MailboxProbe, ProbeResult};

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Builds an `EmailFinder` with the production DNS, search and SMTP collaborators.
pub fn initialize_finder(config: Config) -> Result<EmailFinder> {
    EmailFinder::from_config(config)
}

/// Performs an early check for outbound SMTP connectivity.
pub async fn check_smtp_connectivity(config: &Config) -> Result<()> {
    utils::smtp::test_smtp_connectivity(config).await
}

/// Runs the finder over every contact with `max_concurrency` workers.
///
/// A feeder task queues `(row, contact)` jobs on a bounded channel; workers pull
/// jobs until the queue is drained. This task aggregates results in completion
/// order, updates the counters, calls `sink.record` for each result and
/// `sink.persist(.., false)` every `checkpoint_interval` completions, then
/// `sink.persist(.., true)` once at the end. Sink errors are logged only.
///
/// Cancelling `cancel` stops workers from taking new jobs and drops in-flight
/// probes (closing their sockets). Contacts without a result are counted in
/// `RunReport::not_completed`.
///
/// The only error is a zero concurrency bound, reported before any work starts.
pub async fn process_contacts<S>(
    finder: Arc<EmailFinder>,
    contacts: Vec<Contact>,
    sink: &mut S,
    cancel: CancellationToken,
) -> Result<RunReport>
where
    S: ResultSink + ?Sized,
{
    let worker_count = finder.config().max_concurrency;
    if worker_count == 0 {
        return Err(AppError::Config(
            "Max concurrency must be at least 1.".to_string(),
        ));
    }
    let started_at = Utc::now();
    let total = contacts.len();
    let checkpoint_interval = finder.config().checkpoint_interval.max(1);
    let caches = Arc::new(RunCaches::new());

    tracing::info!(target: "process_contacts",
        "Processing {} contacts with {} workers (checkpoint every {})",
        total, worker_count, checkpoint_interval);

    let (job_tx, job_rx) = mpsc::channel::<(usize, Contact)>(worker_count * 2);
    let job_rx = Arc::new(Mutex::new(job_rx));
    let (result_tx, mut result_rx) = mpsc::channel::<ContactResult>(worker_count * 2);

    let mut tasks = JoinSet::new();

    let feeder_cancel = cancel.clone();
    tasks.spawn(async move {
        for job in contacts.into_iter().enumerate() {
            tokio::select! {
                biased;
                _ = feeder_cancel.cancelled() => break,
                sent = job_tx.send(job) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
    });

    for worker_id in 0..worker_count {
        let finder = Arc::clone(&finder);
        let caches = Arc::clone(&caches);
        let jobs = Arc::clone(&job_rx);
        let results = result_tx.clone();
        let cancel = cancel.clone();

        tasks.spawn(async move {
            loop {
                let job = {
                    let mut jobs = jobs.lock().await;
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        job = jobs.recv() => job,
                    }
                };
                let Some((row, contact)) = job else {
                    break;
                };

                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(target: "process_contacts", "Worker {} dropped row {} on cancellation", worker_id, row);
                        break;
                    }
                    result = finder.find_email_for_contact(row, &contact, &caches) => result,
                };
                if results.send(result).await.is_err() {
                    break;
                }
            }
            tracing::trace!(target: "process_contacts", "Worker {} finished", worker_id);
        });
    }
    drop(result_tx);

    let mut stats = RunStats::new(total);
    let mut results: Vec<ContactResult> = Vec::with_capacity(total);
    while let Some(result) = result_rx.recv().await {
        stats.record(&result);
        sink.record(&result);
        tracing::debug!(target: "process_contacts",
            "Row {} finished: {} ({}/{})", result.row, result.status, results.len() + 1, total);
        results.push(result);

        if results.len() % checkpoint_interval == 0 && results.len() < total {
            tracing::info!(target: "process_contacts", "Checkpoint: {}/{} contacts done", results.len(), total);
            if let Err(e) = sink.persist(&results, false) {
                tracing::warn!(target: "process_contacts", "Checkpoint write failed: {}", e);
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!(target: "process_contacts", "A processing task failed to join: {}", e);
        }
    }

    if let Err(e) = sink.persist(&results, true) {
        tracing::error!(target: "process_contacts", "Final result write failed: {}", e);
    }

    let not_completed = total - results.len();
    if not_completed > 0 {
        tracing::warn!(target: "process_contacts", "Run cancelled; {} contacts not completed", not_completed);
    }

    Ok(RunReport {
        stats,
        results,
        not_completed,
        started_at,
        finished_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::finder::tests::{acme_dns, finder_with, test_config, FakeProbe};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Tracks how many probes run at the same time.
    #[derive(Default)]
    struct GaugeProbe {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl MailboxProbe for GaugeProbe {
        async fn probe(&self, email: &str, _mx_cache: &MxCache) -> ProbeResult {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            ProbeResult::conclusive(
                email,
                VerificationOutcome::Valid,
                "250 Ok".to_string(),
                "mx.acme.com",
            )
        }
    }

    fn contacts(count: usize) -> Vec<Contact> {
        (0..count)
            .map(|i| Contact::new(&format!("Person{}", char::from(b'a' + i as u8)), "Smith", "Acme"))
            .collect()
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let mut config = test_config();
        config.max_concurrency = 3;
        let probe = Arc::new(GaugeProbe::default());
        let finder = Arc::new(EmailFinder::new(
            Arc::new(config),
            DomainResolver::new(acme_dns(), None, 10),
            probe.clone(),
        ));

        let mut sink = MemorySink::new();
        let report = process_contacts(finder, contacts(10), &mut sink, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.results.len(), 10);
        assert_eq!(report.not_completed, 0);
        assert_eq!(report.stats.verified, 10);
        let peak = probe.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 3, "peak concurrency was {}", peak);

        let mut rows: Vec<usize> = report.results.iter().map(|r| r.row).collect();
        rows.sort_unstable();
        assert_eq!(rows, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_missing_data_rows_make_no_lookups() {
        let dns = acme_dns();
        let probe = Arc::new(FakeProbe::answering(VerificationOutcome::Valid));
        let finder = Arc::new(finder_with(test_config(), dns.clone(), probe.clone()));
        let input = vec![
            Contact::new("", "Smith", "Acme"),
            Contact::new("John", "", "Acme"),
            Contact::default(),
        ];

        let mut sink = MemorySink::new();
        let report = process_contacts(finder, input, &mut sink, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.stats.missing_data, 3);
        assert_eq!(report.stats.found, 0);
        assert_eq!(dns.call_count(), 0);
        assert!(probe.probed().is_empty());
    }

    #[tokio::test]
    async fn test_checkpoints_and_final_persist() {
        let mut config = test_config();
        config.verify = false;
        config.checkpoint_interval = 2;
        let probe = Arc::new(FakeProbe::answering(VerificationOutcome::Valid));
        let finder = Arc::new(finder_with(config, acme_dns(), probe));

        let mut sink = MemorySink::new();
        let report = process_contacts(finder, contacts(5), &mut sink, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.stats.unverified, 5);
        assert_eq!(report.stats.completed(), 5);
        assert_eq!(sink.checkpoints(), 2);
        assert!(sink.is_complete());
        assert_eq!(sink.results().len(), 5);
        assert_eq!(sink.results()[0].row, 0);
    }

    #[tokio::test]
    async fn test_cancellation_reports_not_completed() {
        let mut config = test_config();
        config.max_concurrency = 2;
        let probe = Arc::new(
            FakeProbe::answering(VerificationOutcome::Valid).with_delay(Duration::from_secs(30)),
        );
        let finder = Arc::new(finder_with(config, acme_dns(), probe));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let mut sink = MemorySink::new();
        let report = tokio::time::timeout(
            Duration::from_secs(5),
            process_contacts(finder, contacts(4), &mut sink, cancel),
        )
        .await
        .expect("cancelled run should finish promptly")
        .unwrap();

        assert!(report.results.is_empty());
        assert_eq!(report.not_completed, 4);
        assert!(sink.is_complete());
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_rejected_before_work() {
        let mut config = test_config();
        config.max_concurrency = 0;
        let dns = acme_dns();
        let probe = Arc::new(FakeProbe::answering(VerificationOutcome::Valid));
        let finder = Arc::new(finder_with(config, dns.clone(), probe.clone()));

        let mut sink = MemorySink::new();
        let err = process_contacts(finder, contacts(2), &mut sink, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(!sink.is_complete());
        assert_eq!(dns.call_count(), 0);
        assert!(probe.probed().is_empty());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let probe = Arc::new(FakeProbe::answering(VerificationOutcome::Valid));
        let finder = Arc::new(finder_with(test_config(), acme_dns(), probe));
        let mut sink = MemorySink::new();
        let report = process_contacts(finder, Vec::new(), &mut sink, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.stats.total, 0);
        assert!(report.results.is_empty());
        assert!(sink.is_complete());
    }
}
