// src/utils/smtp/result.rs
//! Defines the result type for mailbox probe operations.

use crate::core::error::ErrorKind;
use crate::core::models::{Evidence, VerificationOutcome};
use serde::Serialize;

/// Represents the outcome of probing one candidate email address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub email: String,
    pub outcome: VerificationOutcome,
    /// Human-readable diagnostic, usually including the server reply.
    pub message: String,
    pub evidence: Evidence,
    /// Why the outcome is not a plain success, if it isn't.
    pub failure: Option<ErrorKind>,
    /// The exchanger that produced the outcome, when one was reached.
    pub mail_server: Option<String>,
}

impl ProbeResult {
    /// The address failed the local syntax check; nothing was sent.
    pub fn syntax_invalid(email: &str) -> Self {
        Self {
            email: email.to_string(),
            outcome: VerificationOutcome::Invalid,
            message: "Invalid email syntax".to_string(),
            evidence: Evidence::Syntax,
            failure: Some(ErrorKind::SyntaxInvalidCandidate),
            mail_server: None,
        }
    }

    /// A conclusive answer from an SMTP dialogue.
    pub fn conclusive(
        email: &str,
        outcome: VerificationOutcome,
        message: String,
        mail_server: &str,
    ) -> Self {
        let failure = match outcome {
            VerificationOutcome::Invalid => Some(ErrorKind::PermanentProbeRejection),
            VerificationOutcome::CatchAll => Some(ErrorKind::CatchAllIndeterminate),
            VerificationOutcome::Valid | VerificationOutcome::Unknown => None,
        };
        Self {
            email: email.to_string(),
            outcome,
            message,
            evidence: Evidence::Smtp,
            failure,
            mail_server: Some(mail_server.to_string()),
        }
    }

    /// The dialogue with one exchanger ended without an answer.
    pub fn inconclusive(email: &str, message: String, failure: ErrorKind, mail_server: &str) -> Self {
        Self {
            email: email.to_string(),
            outcome: VerificationOutcome::Unknown,
            message,
            evidence: Evidence::Smtp,
            failure: Some(failure),
            mail_server: Some(mail_server.to_string()),
        }
    }

    /// Decided by MX/A presence only.
    pub fn heuristic(
        email: &str,
        outcome: VerificationOutcome,
        message: String,
        failure: Option<ErrorKind>,
    ) -> Self {
        Self {
            email: email.to_string(),
            outcome,
            message,
            evidence: Evidence::MxHeuristic,
            failure,
            mail_server: None,
        }
    }
}
