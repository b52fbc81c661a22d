//! Defines the custom error types for the email-finder application.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;
use trust_dns_resolver::error::ResolveError;
use url::ParseError as UrlParseError;

/// The primary error type for the discovery and verification pipeline.
#[derive(Error, Debug)]
pub enum AppError {
    /// Error occurring during configuration loading or validation.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error initializing necessary components (e.g., clients, resolvers).
    #[error("Initialization Error: {0}")]
    Initialization(String),

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization or deserialization.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error parsing a URL.
    #[error("URL Parsing Error: {0}")]
    UrlParse(#[from] UrlParseError),

    /// Error making HTTP requests via reqwest.
    #[error("HTTP Request Error: {0}")]
    Request(#[from] reqwest::Error),

    /// Error during DNS resolution.
    #[error("DNS Resolution Error: {0}")]
    Dns(#[from] ResolveError),

    /// DNS operation timed out.
    #[error("DNS Timeout for domain: {0}")]
    DnsTimeout(String),

    /// TCP connection to a mail exchanger could not be established.
    #[error("SMTP Connect Error: {0}")]
    SmtpConnect(String),

    /// A single SMTP step (connect, read or write) exceeded its timeout.
    #[error("SMTP Timeout: {0}")]
    SmtpTimeout(String),

    /// The server sent something that is not a well-formed SMTP reply.
    #[error("SMTP Protocol Error: {0}")]
    SmtpProtocol(String),

    /// The server refused the session with a 4xx greeting or EHLO reply.
    #[error("SMTP Temporary Failure: {0}")]
    SmtpTemporaryFailure(String),

    /// The server refused the session with a 5xx greeting or EHLO reply.
    #[error("SMTP Permanent Failure: {0}")]
    SmtpPermanentFailure(String),

    /// An address lettre cannot send in a MAIL or RCPT command.
    #[error("Invalid Email Address: {0}")]
    InvalidAddress(String),

    /// Indicates insufficient input data to proceed (e.g., missing name/company).
    #[error("Insufficient Input Data: {0}")]
    InsufficientInput(String),

    /// Failed to extract a domain from the provided URL.
    #[error("Failed to extract domain from URL: {0}")]
    DomainExtraction(String),
}

/// Closed set of failure categories a contact can end up in.
///
/// None of these abort a run. The orchestrator folds them into the contact's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingContactData,
    DomainUnresolved,
    NoPatternsGenerated,
    SyntaxInvalidCandidate,
    /// Timeout or 4xx reply. Retried by moving to the next exchanger, never the same one.
    TransientProbeFailure,
    PermanentProbeRejection,
    CatchAllIndeterminate,
    /// DNS or connect failure.
    NetworkUnavailable,
}

impl AppError {
    /// Maps an error to its taxonomy kind. Errors outside the pipeline (config, JSON, ...) have none.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::InsufficientInput(_) => Some(ErrorKind::MissingContactData),
            AppError::DomainExtraction(_) => Some(ErrorKind::DomainUnresolved),
            AppError::InvalidAddress(_) => Some(ErrorKind::SyntaxInvalidCandidate),
            AppError::SmtpTimeout(_)
            | AppError::SmtpProtocol(_)
            | AppError::SmtpTemporaryFailure(_) => Some(ErrorKind::TransientProbeFailure),
            AppError::SmtpPermanentFailure(_) => Some(ErrorKind::PermanentProbeRejection),
            AppError::SmtpConnect(_)
            | AppError::DnsTimeout(_)
            | AppError::Dns(_)
            | AppError::Request(_) => Some(ErrorKind::NetworkUnavailable),
            AppError::Io(e) if e.kind() == io::ErrorKind::TimedOut => {
                Some(ErrorKind::TransientProbeFailure)
            }
            AppError::Io(_) => Some(ErrorKind::NetworkUnavailable),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
