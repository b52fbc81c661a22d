//! SMTP-level mailbox verification.

mod client;
mod result;
mod session;

pub use client::{test_smtp_connectivity, MailServerProbe, MailboxProbe};
pub use result::ProbeResult;

