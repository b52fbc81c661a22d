//! Provides the MailServerProbe for classifying email addresses via SMTP.

use super::result::ProbeResult;
use super::session::{parse_address, SmtpReply, SmtpSession};
use crate::core::cache::MxCache;
use crate::core::config::Config;
use crate::core::error::{AppError, ErrorKind, Result};
use crate::core::models::VerificationOutcome;
use crate::utils::dns::{sorted_exchangers, DnsLookup};

use async_trait::async_trait;
use lettre::Address;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Classifies one candidate address.
#[async_trait]
pub trait MailboxProbe: Send + Sync {
    async fn probe(&self, email: &str, mx_cache: &MxCache) -> ProbeResult;
}

/// Steps of the verification dialogue after the session is open.
///
/// Connect, greeting and EHLO happen in `SmtpSession::open`; a failure there ends
/// the attempt on that exchanger as Unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DialogueStage {
    MailFrom,
    RcptTo,
    CatchAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Next(DialogueStage),
    Finish(VerificationOutcome, Option<ErrorKind>),
}

impl DialogueStage {
    /// Decides where a reply at this stage leads.
    pub(crate) fn on_reply(self, reply: &SmtpReply, catch_all_check: bool) -> Transition {
        use DialogueStage::*;
        use Transition::{Finish, Next};

        let transient = Finish(
            VerificationOutcome::Unknown,
            Some(ErrorKind::TransientProbeFailure),
        );
        match self {
            MailFrom if reply.code == 250 => Next(RcptTo),
            MailFrom => transient,
            RcptTo => match reply.code {
                250 | 251 if catch_all_check => Next(CatchAll),
                250 | 251 => Finish(VerificationOutcome::Valid, None),
                550..=554 => Finish(
                    VerificationOutcome::Invalid,
                    Some(ErrorKind::PermanentProbeRejection),
                ),
                _ => transient,
            },
            CatchAll => match reply.code {
                250 | 251 => Finish(
                    VerificationOutcome::CatchAll,
                    Some(ErrorKind::CatchAllIndeterminate),
                ),
                _ => Finish(VerificationOutcome::Valid, None),
            },
        }
    }

    /// Decides what an I/O or protocol failure at this stage means.
    pub(crate) fn on_error(self, err: &AppError) -> Transition {
        match self {
            // The target was already accepted; only the catch-all signal is lost.
            DialogueStage::CatchAll => Transition::Finish(VerificationOutcome::Valid, None),
            _ => Transition::Finish(
                VerificationOutcome::Unknown,
                Some(err.kind().unwrap_or(ErrorKind::TransientProbeFailure)),
            ),
        }
    }
}

/// A local part that no real mailbox should have.
fn catch_all_address(domain: &str) -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect();
    format!("nonexistent-{}@{}", token.to_lowercase(), domain)
}

/// Probes mailboxes by talking SMTP to the domain's mail exchangers.
#[derive(Clone)]
pub struct MailServerProbe {
    config: Arc<Config>,
    dns: Arc<dyn DnsLookup>,
    /// `None` sends the null reverse-path `MAIL FROM:<>`.
    sender: Option<Address>,
}

impl MailServerProbe {
    pub fn new(config: Arc<Config>, dns: Arc<dyn DnsLookup>) -> Self {
        let sender = match parse_address(&config.smtp_sender_email) {
            Ok(sender) => Some(sender),
            Err(e) => {
                tracing::warn!(target: "smtp_task", "Unusable sender address, using null sender: {}", e);
                None
            }
        };
        Self {
            config,
            dns,
            sender,
        }
    }

    /// Exchanger hostnames for `domain`, best first. Cached, including "none".
    async fn resolve_mx(&self, domain: &str, mx_cache: &MxCache) -> Result<Vec<String>> {
        if let Some(hosts) = mx_cache.get(domain) {
            tracing::trace!(target: "smtp_task", "MX cache hit for {}: {:?}", domain, hosts);
            return Ok(hosts);
        }
        let records = self.dns.mx_records(domain).await?;
        let hosts = sorted_exchangers(records);
        tracing::debug!(target: "smtp_task", "Resolved MX for {}: {:?}", domain, hosts);
        Ok(mx_cache.insert_if_absent(domain, hosts))
    }

    /// Runs one full dialogue against one exchanger. The session is always closed.
    async fn check_host(&self, host: &str, email: &str, recipient: &Address) -> ProbeResult {
        let mut session = match SmtpSession::open(
            host,
            self.config.smtp_port,
            &self.config.helo_name,
            self.config.smtp_timeout,
        )
        .await
        {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(target: "smtp_task", "Could not open a session with {}: {}", host, e);
                return ProbeResult::inconclusive(
                    email,
                    format!("Session with {} failed: {}", host, e),
                    e.kind().unwrap_or(ErrorKind::NetworkUnavailable),
                    host,
                );
            }
        };

        let result = self.converse(&mut session, email, recipient).await;
        session.close().await;
        result
    }

    async fn converse(
        &self,
        session: &mut SmtpSession,
        email: &str,
        recipient: &Address,
    ) -> ProbeResult {
        let host = session.host().to_string();
        let mut stage = DialogueStage::MailFrom;

        loop {
            let reply = match stage {
                DialogueStage::MailFrom => session.mail_from(self.sender.as_ref()).await,
                DialogueStage::RcptTo => session.rcpt_to(recipient).await,
                DialogueStage::CatchAll => {
                    match parse_address(&catch_all_address(recipient.domain())) {
                        Ok(nonexistent) => session.rcpt_to(&nonexistent).await,
                        Err(e) => Err(e),
                    }
                }
            };

            let (transition, detail) = match reply {
                Ok(reply) => (
                    stage.on_reply(&reply, self.config.catch_all_check),
                    reply.summary(),
                ),
                Err(e) => {
                    tracing::debug!(target: "smtp_task", "{} failed at {:?}: {}", host, stage, e);
                    (stage.on_error(&e), e.to_string())
                }
            };

            match transition {
                Transition::Next(next) => stage = next,
                Transition::Finish(outcome, failure) => {
                    return finish(email, &host, stage, outcome, failure, detail);
                }
            }
        }
    }

    /// Weak fallback used when no exchanger gave an answer.
    async fn mx_heuristic(&self, email: &str, domain: &str, mx_error: Option<AppError>) -> ProbeResult {
        use VerificationOutcome::*;

        match (self.dns.has_address(domain).await, mx_error) {
            (Ok(true), _) => ProbeResult::heuristic(
                email,
                Valid,
                format!("No usable MX for {}; domain resolves to an address", domain),
                None,
            ),
            (Ok(false), None) => ProbeResult::heuristic(
                email,
                Invalid,
                format!("No MX or A records for {}; domain cannot receive mail", domain),
                None,
            ),
            (Ok(false), Some(e)) => ProbeResult::heuristic(
                email,
                Unknown,
                format!("MX lookup for {} failed ({}) and no A record found", domain, e),
                Some(e.kind().unwrap_or(ErrorKind::NetworkUnavailable)),
            ),
            (Err(e), _) => ProbeResult::heuristic(
                email,
                Unknown,
                format!("DNS lookup for {} failed: {}", domain, e),
                Some(e.kind().unwrap_or(ErrorKind::NetworkUnavailable)),
            ),
        }
    }
}

fn finish(
    email: &str,
    host: &str,
    stage: DialogueStage,
    outcome: VerificationOutcome,
    failure: Option<ErrorKind>,
    detail: String,
) -> ProbeResult {
    let message = match (outcome, stage) {
        (VerificationOutcome::Valid, DialogueStage::CatchAll) => format!(
            "Mailbox accepted by {}; nonexistent address refused ({})",
            host, detail
        ),
        (VerificationOutcome::Valid, _) => format!("Mailbox accepted by {} ({})", host, detail),
        (VerificationOutcome::CatchAll, _) => {
            format!("{} accepts any address, catch-all domain ({})", host, detail)
        }
        (VerificationOutcome::Invalid, _) => format!("Mailbox rejected by {} ({})", host, detail),
        (VerificationOutcome::Unknown, _) => {
            format!("Inconclusive at {:?} on {} ({})", stage, host, detail)
        }
    };

    match outcome {
        VerificationOutcome::Unknown => ProbeResult::inconclusive(
            email,
            message,
            failure.unwrap_or(ErrorKind::TransientProbeFailure),
            host,
        ),
        _ => ProbeResult::conclusive(email, outcome, message, host),
    }
}

#[async_trait]
impl MailboxProbe for MailServerProbe {
    async fn probe(&self, email: &str, mx_cache: &MxCache) -> ProbeResult {
        if !self.config.is_valid_syntax(email) {
            tracing::debug!(target: "smtp_task", "Skipping <{}>: invalid syntax", email);
            return ProbeResult::syntax_invalid(email);
        }
        let recipient = match parse_address(email) {
            Ok(recipient) => recipient,
            Err(e) => {
                tracing::debug!(target: "smtp_task", "Skipping <{}>: {}", email, e);
                return ProbeResult::syntax_invalid(email);
            }
        };
        let domain = recipient.domain().to_lowercase();

        let hosts = match self.resolve_mx(&domain, mx_cache).await {
            Ok(hosts) if !hosts.is_empty() => hosts,
            Ok(_) => {
                tracing::debug!(target: "smtp_task", "No MX records for {}", domain);
                return self.mx_heuristic(email, &domain, None).await;
            }
            Err(e) => {
                tracing::warn!(target: "smtp_task", "MX lookup for {} failed: {}", domain, e);
                return self.mx_heuristic(email, &domain, Some(e)).await;
            }
        };

        let mut last_attempt: Option<ProbeResult> = None;
        for host in hosts.iter().take(self.config.max_mx_hosts) {
            let result = self.check_host(host, email, &recipient).await;
            if result.outcome.is_conclusive() {
                tracing::info!(target: "smtp_task",
                    "<{}> via {}: {:?} ({})", email, host, result.outcome, result.message);
                return result;
            }
            tracing::debug!(target: "smtp_task", "<{}> inconclusive via {}: {}", email, host, result.message);
            last_attempt = Some(result);
        }

        // Exchangers exist but none answered; report that with weaker evidence.
        let (detail, failure) = match last_attempt {
            Some(attempt) => (attempt.message, attempt.failure),
            None => ("no exchanger attempted".to_string(), None),
        };
        tracing::info!(target: "smtp_task", "<{}>: SMTP inconclusive, falling back to MX presence", email);
        ProbeResult::heuristic(
            email,
            VerificationOutcome::Valid,
            format!("SMTP inconclusive ({}); {} has mail exchangers", detail, domain),
            failure,
        )
    }
}

/// Performs an early check that outbound SMTP connections are possible at all.
pub async fn test_smtp_connectivity(config: &Config) -> Result<()> {
    const TEST_SERVER: &str = "gmail-smtp-in.l.google.com";
    tracing::info!(
        "Testing outbound SMTP (port {}) connectivity to {}...",
        config.smtp_port,
        TEST_SERVER
    );

    let step_timeout = Duration::from_secs(5).min(config.smtp_timeout);
    let session = SmtpSession::open(TEST_SERVER, config.smtp_port, &config.helo_name, step_timeout)
        .await
        .map_err(|e| {
            tracing::error!(
                "SMTP connectivity test failed: {}. Outbound port {} is likely blocked by ISP, firewall, or network provider.",
                e,
                config.smtp_port
            );
            e
        })?;
    session.close().await;
    tracing::info!("SMTP connectivity test successful (connected to {}).", TEST_SERVER);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Evidence;
    use crate::utils::dns::tests::FakeDns;
    use crate::utils::smtp::session::MAX_SESSION_READ;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// One scripted connection: a greeting, then (expected command prefix, reply) pairs.
    struct ScriptedSession {
        greeting: &'static str,
        steps: Vec<(&'static str, &'static str)>,
    }

    fn accepting_session(rcpt_reply: &'static str, catch_all_reply: &'static str) -> ScriptedSession {
        ScriptedSession {
            greeting: "220 mx.acme.test ESMTP\r\n",
            steps: vec![
                ("EHLO verify.local", "250 mx.acme.test\r\n"),
                ("MAIL FROM:<verify@verify.local>", "250 2.1.0 Ok\r\n"),
                ("RCPT TO:<", rcpt_reply),
                ("RCPT TO:<nonexistent-", catch_all_reply),
            ],
        }
    }

    /// Serves the sessions one connection at a time, then answers QUIT.
    async fn spawn_smtp_server(sessions: Vec<ScriptedSession>) -> (u16, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            for session in sessions {
                let (socket, _) = listener.accept().await.unwrap();
                let (read_half, mut write_half) = socket.into_split();
                let mut reader = BufReader::new(read_half);
                let _ = write_half.write_all(session.greeting.as_bytes()).await;

                for (expected, response) in session.steps {
                    let mut line = String::new();
                    if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                        break;
                    }
                    if line.starts_with("QUIT") {
                        let _ = write_half.write_all(b"221 Bye\r\n").await;
                        break;
                    }
                    assert!(
                        line.starts_with(expected),
                        "expected command starting with '{expected}', got '{line}'"
                    );
                    write_half.write_all(response.as_bytes()).await.unwrap();
                }

                let mut line = String::new();
                if reader.read_line(&mut line).await.unwrap_or(0) > 0 && line.starts_with("QUIT") {
                    let _ = write_half.write_all(b"221 Bye\r\n").await;
                }
            }
        });
        (port, handle)
    }

    fn probe_config(port: u16, step_timeout: Duration) -> Config {
        let mut config = Config::default();
        config.smtp_port = port;
        config.smtp_timeout = step_timeout;
        config
    }

    fn loopback_dns() -> Arc<FakeDns> {
        Arc::new(FakeDns::default().with_mx("acme.test", &[(10, "127.0.0.1.")]))
    }

    async fn probe_once(config: Config, dns: Arc<FakeDns>, email: &str) -> ProbeResult {
        let probe = MailServerProbe::new(Arc::new(config), dns);
        probe.probe(email, &MxCache::new()).await
    }

    #[tokio::test]
    async fn test_catch_all_domain() {
        let (port, server) =
            spawn_smtp_server(vec![accepting_session("250 2.1.5 Ok\r\n", "250 2.1.5 Ok\r\n")]).await;
        let result = probe_once(
            probe_config(port, Duration::from_secs(2)),
            loopback_dns(),
            "john.smith@acme.test",
        )
        .await;
        assert_eq!(result.outcome, VerificationOutcome::CatchAll);
        assert_eq!(result.evidence, Evidence::Smtp);
        assert_eq!(result.failure, Some(ErrorKind::CatchAllIndeterminate));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_valid_mailbox() {
        let (port, server) = spawn_smtp_server(vec![accepting_session(
            "250 2.1.5 Ok\r\n",
            "550 5.1.1 No such user\r\n",
        )])
        .await;
        let result = probe_once(
            probe_config(port, Duration::from_secs(2)),
            loopback_dns(),
            "john.smith@acme.test",
        )
        .await;
        assert_eq!(result.outcome, VerificationOutcome::Valid);
        assert_eq!(result.evidence, Evidence::Smtp);
        assert_eq!(result.mail_server.as_deref(), Some("127.0.0.1"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_mailbox() {
        let session = ScriptedSession {
            greeting: "220 mx.acme.test ESMTP\r\n",
            steps: vec![
                ("EHLO", "250 mx.acme.test\r\n"),
                ("MAIL FROM", "250 Ok\r\n"),
                ("RCPT TO:<john.smith@acme.test>", "550 5.1.1 User unknown\r\n"),
            ],
        };
        let (port, server) = spawn_smtp_server(vec![session]).await;
        let result = probe_once(
            probe_config(port, Duration::from_secs(2)),
            loopback_dns(),
            "john.smith@acme.test",
        )
        .await;
        assert_eq!(result.outcome, VerificationOutcome::Invalid);
        assert_eq!(result.failure, Some(ErrorKind::PermanentProbeRejection));
        assert!(result.message.contains("550"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_multiline_greeting_and_disabled_catch_all_check() {
        let session = ScriptedSession {
            greeting: "220-mx.acme.test ESMTP\r\n220 no UCE\r\n",
            steps: vec![
                ("EHLO", "250 mx.acme.test\r\n"),
                ("MAIL FROM", "250 Ok\r\n"),
                ("RCPT TO:<john.smith@acme.test>", "251 User not local; will forward\r\n"),
            ],
        };
        let (port, server) = spawn_smtp_server(vec![session]).await;
        let mut config = probe_config(port, Duration::from_secs(2));
        config.catch_all_check = false;
        let result = probe_once(config, loopback_dns(), "john.smith@acme.test").await;
        assert_eq!(result.outcome, VerificationOutcome::Valid);
        assert_eq!(result.evidence, Evidence::Smtp);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_refused_connection_falls_back_to_mx_heuristic() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = probe_once(
            probe_config(port, Duration::from_secs(2)),
            loopback_dns(),
            "john.smith@acme.test",
        )
        .await;
        assert_eq!(result.outcome, VerificationOutcome::Valid);
        assert_eq!(result.evidence, Evidence::MxHeuristic);
        assert_eq!(result.failure, Some(ErrorKind::NetworkUnavailable));
    }

    #[tokio::test]
    async fn test_silent_server_times_out_then_falls_back() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(800)).await;
            drop(socket);
        });

        let result = probe_once(
            probe_config(port, Duration::from_millis(150)),
            loopback_dns(),
            "john.smith@acme.test",
        )
        .await;
        assert_eq!(result.outcome, VerificationOutcome::Valid);
        assert_eq!(result.evidence, Evidence::MxHeuristic);
        assert_eq!(result.failure, Some(ErrorKind::TransientProbeFailure));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_transient_reply_moves_to_next_exchanger() {
        let busy = ScriptedSession {
            greeting: "421 4.7.0 Try again later\r\n",
            steps: vec![],
        };
        let (port, server) = spawn_smtp_server(vec![
            busy,
            accepting_session("250 Ok\r\n", "550 No such user\r\n"),
        ])
        .await;
        let dns = Arc::new(
            FakeDns::default().with_mx("acme.test", &[(20, "localhost"), (10, "127.0.0.1")]),
        );
        let result = probe_once(
            probe_config(port, Duration::from_secs(2)),
            dns,
            "john.smith@acme.test",
        )
        .await;
        assert_eq!(result.outcome, VerificationOutcome::Valid);
        assert_eq!(result.mail_server.as_deref(), Some("localhost"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_domain_without_mail_records_is_invalid() {
        let dns = Arc::new(FakeDns::default());
        let result = probe_once(Config::default(), dns, "john.smith@nowhere.test").await;
        assert_eq!(result.outcome, VerificationOutcome::Invalid);
        assert_eq!(result.evidence, Evidence::MxHeuristic);
    }

    #[tokio::test]
    async fn test_dns_failure_is_unknown() {
        let dns = Arc::new(FakeDns::default().failing("flaky.test"));
        let result = probe_once(Config::default(), dns, "john.smith@flaky.test").await;
        assert_eq!(result.outcome, VerificationOutcome::Unknown);
        assert_eq!(result.evidence, Evidence::MxHeuristic);
        assert_eq!(result.failure, Some(ErrorKind::NetworkUnavailable));
    }

    #[tokio::test]
    async fn test_invalid_syntax_skips_network() {
        let dns = Arc::new(FakeDns::default());
        let probe = MailServerProbe::new(Arc::new(Config::default()), dns.clone());
        let result = probe.probe("not an email@acme.test", &MxCache::new()).await;
        assert_eq!(result.outcome, VerificationOutcome::Invalid);
        assert_eq!(result.evidence, Evidence::Syntax);
        assert_eq!(dns.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mx_answers_are_cached_including_empty() {
        let dns = Arc::new(FakeDns::default().with_address("web-only.test"));
        let probe = MailServerProbe::new(Arc::new(Config::default()), dns.clone());
        let cache = MxCache::new();

        let first = probe.probe("a.b@web-only.test", &cache).await;
        assert_eq!(first.outcome, VerificationOutcome::Valid);
        assert_eq!(first.evidence, Evidence::MxHeuristic);
        assert_eq!(cache.get("web-only.test"), Some(Vec::new()));
        let calls_after_first = dns.call_count();

        probe.probe("ab@web-only.test", &cache).await;
        // Only the A lookup repeats; the MX answer comes from the cache.
        assert_eq!(dns.call_count(), calls_after_first + 1);
    }

    #[tokio::test]
    async fn test_only_top_exchangers_are_contacted() {
        let listener = TcpListener::bind("0.0.0.0:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);
        let server = tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = socket.write_all(b"421 4.3.2 Busy\r\n").await;
            }
        });

        let dns = Arc::new(FakeDns::default().with_mx(
            "acme.test",
            &[(10, "127.0.0.1"), (20, "127.0.0.2"), (30, "127.0.0.3")],
        ));
        let mut config = probe_config(port, Duration::from_secs(2));
        config.max_mx_hosts = 2;
        let result = probe_once(config, dns, "john.smith@acme.test").await;

        assert_eq!(result.outcome, VerificationOutcome::Valid);
        assert_eq!(result.evidence, Evidence::MxHeuristic);
        assert_eq!(result.failure, Some(ErrorKind::TransientProbeFailure));
        assert_eq!(accepted.load(Ordering::SeqCst), 2);
        server.abort();
    }

    #[tokio::test]
    async fn test_flooding_server_is_cut_off_and_next_exchanger_used() {
        // A greeting line that never ends.
        let flood = ScriptedSession {
            greeting: Box::leak("A".repeat(4 * MAX_SESSION_READ).into_boxed_str()),
            steps: vec![],
        };
        let (port, server) = spawn_smtp_server(vec![
            flood,
            accepting_session("250 Ok\r\n", "550 No such user\r\n"),
        ])
        .await;
        let dns = Arc::new(
            FakeDns::default().with_mx("acme.test", &[(10, "127.0.0.1"), (20, "localhost")]),
        );
        let result = tokio::time::timeout(
            Duration::from_secs(3),
            probe_once(probe_config(port, Duration::from_secs(5)), dns, "john.smith@acme.test"),
        )
        .await
        .expect("oversized reply must not hold the probe for the step timeout");
        assert_eq!(result.outcome, VerificationOutcome::Valid);
        assert_eq!(result.evidence, Evidence::Smtp);
        assert_eq!(result.mail_server.as_deref(), Some("localhost"));
        server.await.unwrap();
    }

    #[test]
    fn test_transitions() {
        let reply = |code| SmtpReply {
            code,
            text: String::new(),
        };
        assert_eq!(
            DialogueStage::MailFrom.on_reply(&reply(553), true),
            Transition::Finish(VerificationOutcome::Unknown, Some(ErrorKind::TransientProbeFailure))
        );
        assert_eq!(
            DialogueStage::MailFrom.on_reply(&reply(250), true),
            Transition::Next(DialogueStage::RcptTo)
        );
        assert_eq!(
            DialogueStage::RcptTo.on_reply(&reply(452), true),
            Transition::Finish(VerificationOutcome::Unknown, Some(ErrorKind::TransientProbeFailure))
        );
        assert_eq!(
            DialogueStage::RcptTo.on_reply(&reply(553), true),
            Transition::Finish(VerificationOutcome::Invalid, Some(ErrorKind::PermanentProbeRejection))
        );
        assert_eq!(
            DialogueStage::RcptTo.on_reply(&reply(555), true),
            Transition::Finish(VerificationOutcome::Unknown, Some(ErrorKind::TransientProbeFailure))
        );
        assert_eq!(
            DialogueStage::CatchAll.on_error(&AppError::SmtpTimeout("read".into())),
            Transition::Finish(VerificationOutcome::Valid, None)
        );
        assert_eq!(
            DialogueStage::RcptTo.on_error(&AppError::SmtpConnect("reset".into())),
            Transition::Finish(VerificationOutcome::Unknown, Some(ErrorKind::NetworkUnavailable))
        );
    }
}
