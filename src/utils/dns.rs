//! DNS lookups used by domain resolution and mail server probing.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::TokioAsyncResolver;

/// A single MX answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}

/// The DNS queries the pipeline needs.
///
/// A definitive "no such records" answer (NOERROR/NODATA or NXDOMAIN) is `Ok` with
/// an empty or negative value. Timeouts and resolver failures are `Err`.
#[async_trait]
pub trait DnsLookup: Send + Sync {
    async fn mx_records(&self, domain: &str) -> Result<Vec<MxRecord>>;

    /// Whether the name has at least one A/AAAA record.
    async fn has_address(&self, domain: &str) -> Result<bool>;
}

/// Orders exchangers by preference then hostname, trims trailing dots and drops repeats.
pub fn sorted_exchangers(mut records: Vec<MxRecord>) -> Vec<String> {
    for record in records.iter_mut() {
        record.exchange = record.exchange.trim_end_matches('.').to_lowercase();
    }
    records.retain(|r| !r.exchange.is_empty());
    records.sort_by(|a, b| {
        a.preference
            .cmp(&b.preference)
            .then_with(|| a.exchange.cmp(&b.exchange))
    });

    let mut hosts: Vec<String> = Vec::with_capacity(records.len());
    for record in records {
        if !hosts.contains(&record.exchange) {
            hosts.push(record.exchange);
        }
    }
    hosts
}

/// Checks that a domain can be found in DNS: MX first, then A.
///
/// `Ok(false)` only when both queries answered definitively. If either failed
/// and neither found anything, the failure is returned.
pub async fn domain_exists(dns: &dyn DnsLookup, domain: &str) -> Result<bool> {
    let mx_result = dns.mx_records(domain).await;
    if let Ok(records) = &mx_result {
        if !records.is_empty() {
            tracing::debug!(target: "domain_task", "Domain {} has {} MX records", domain, records.len());
            return Ok(true);
        }
    }

    let a_result = dns.has_address(domain).await;
    match (mx_result, a_result) {
        (_, Ok(true)) => {
            tracing::debug!(target: "domain_task", "Domain {} has no MX but resolves to an address", domain);
            Ok(true)
        }
        (Ok(_), Ok(false)) => Ok(false),
        (Err(e), _) | (_, Err(e)) => Err(e),
    }
}

/// Creates the async DNS resolver from the configured name servers.
/// Falls back to the system configuration when the list is empty.
pub fn create_resolver(config: &Config) -> Result<TokioAsyncResolver> {
    let mut opts = ResolverOpts::default();
    opts.timeout = config.dns_timeout;
    opts.attempts = 2;

    if config.dns_servers.is_empty() {
        tracing::debug!("Using system DNS configuration");
        let (system_config, mut system_opts) =
            trust_dns_resolver::system_conf::read_system_conf().map_err(|e| {
                AppError::Initialization(format!("Failed to read system DNS config: {}", e))
            })?;
        system_opts.timeout = config.dns_timeout;
        return Ok(TokioAsyncResolver::tokio(system_config, system_opts));
    }

    let mut ips: Vec<IpAddr> = Vec::with_capacity(config.dns_servers.len());
    for server in &config.dns_servers {
        match server.parse::<IpAddr>() {
            Ok(ip) => ips.push(ip),
            Err(e) => {
                return Err(AppError::Initialization(format!(
                    "Invalid DNS server address '{}': {}",
                    server, e
                )))
            }
        }
    }
    tracing::debug!("Using DNS servers: {:?}", ips);

    let group = NameServerConfigGroup::from_ips_clear(&ips, 53, true);
    let resolver_config = ResolverConfig::from_parts(None, vec![], group);
    Ok(TokioAsyncResolver::tokio(resolver_config, opts))
}

/// `DnsLookup` backed by `trust-dns-resolver`, with an outer timeout per query.
pub struct TrustDnsLookup {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl TrustDnsLookup {
    pub fn new(resolver: TokioAsyncResolver, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(create_resolver(config)?, config.dns_timeout))
    }
}

/// `true` when the error is a definitive negative answer rather than a failure.
fn is_negative_answer(domain: &str, err: &ResolveError) -> bool {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => {
            tracing::debug!(target: "domain_task", "No records for {} ({})", domain, response_code);
            true
        }
        _ => false,
    }
}

fn lookup_error(domain: &str, err: ResolveError) -> AppError {
    match err.kind() {
        ResolveErrorKind::Timeout => AppError::DnsTimeout(domain.to_string()),
        _ => AppError::Dns(err),
    }
}

#[async_trait]
impl DnsLookup for TrustDnsLookup {
    async fn mx_records(&self, domain: &str) -> Result<Vec<MxRecord>> {
        let lookup = tokio::time::timeout(self.timeout, self.resolver.mx_lookup(domain))
            .await
            .map_err(|_| AppError::DnsTimeout(domain.to_string()))?;
        match lookup {
            Ok(mx) => Ok(mx
                .iter()
                .map(|r| MxRecord::new(r.preference(), r.exchange().to_utf8()))
                .collect()),
            Err(e) if is_negative_answer(domain, &e) => Ok(Vec::new()),
            Err(e) => Err(lookup_error(domain, e)),
        }
    }

    async fn has_address(&self, domain: &str) -> Result<bool> {
        let lookup = tokio::time::timeout(self.timeout, self.resolver.lookup_ip(domain))
            .await
            .map_err(|_| AppError::DnsTimeout(domain.to_string()))?;
        match lookup {
            Ok(ips) => Ok(ips.iter().next().is_some()),
            Err(e) if is_negative_answer(domain, &e) => Ok(false),
            Err(e) => Err(lookup_error(domain, e)),
        }
    }
}
