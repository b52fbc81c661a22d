//! One SMTP session with a mail exchanger, driven through lettre's async connection.
//! Every step runs under the configured step timeout.

use crate::core::error::{AppError, Result};

use lettre::transport::smtp::client::{AsyncSmtpConnection, AsyncTokioStream};
use lettre::transport::smtp::commands::{Mail, Rcpt};
use lettre::transport::smtp::extension::ClientId;
use lettre::transport::smtp::response::{Response, Severity};
use lettre::transport::smtp::Error as SmtpError;
use lettre::Address;
use std::fmt::Display;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::str::FromStr;
use std::task::{ready, Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Upper bound on bytes read from one server over a whole session.
///
/// A well-behaved dialogue (greeting, EHLO, MAIL, two RCPT, QUIT) stays far below this.
pub(crate) const MAX_SESSION_READ: usize = 8 * 1024;

/// Parses an address the way lettre will send it.
pub(crate) fn parse_address(email: &str) -> Result<Address> {
    Address::from_str(email).map_err(|e| AppError::InvalidAddress(format!("{}: {}", email, e)))
}

/// A server reply reduced to its code and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SmtpReply {
    pub code: u16,
    pub text: String,
}

impl SmtpReply {
    fn from_response(response: &Response) -> Self {
        Self {
            code: u16::from(response.code()),
            text: response.message().collect::<Vec<&str>>().join(" "),
        }
    }

    /// lettre reports 4xx/5xx replies as errors carrying the code.
    fn from_error(err: &SmtpError) -> Option<Self> {
        err.status().map(|code| Self {
            code: u16::from(code),
            text: err.to_string(),
        })
    }

    /// Code and text on one line, for logs and result messages.
    pub fn summary(&self) -> String {
        let text = self.text.trim();
        if text.is_empty() {
            self.code.to_string()
        } else {
            format!("{} {}", self.code, text)
        }
    }
}

/// Maps a failure while opening the session (greeting or EHLO) onto `AppError`.
fn open_error(host: &str, err: SmtpError) -> AppError {
    match err.status() {
        Some(code) if code.severity == Severity::TransientNegativeCompletion => {
            AppError::SmtpTemporaryFailure(format!("{} refused the session: {}", host, err))
        }
        Some(_) => AppError::SmtpPermanentFailure(format!("{} refused the session: {}", host, err)),
        None => AppError::SmtpProtocol(format!("{}: {}", host, err)),
    }
}

/// A TCP stream that fails reads once `remaining` bytes have been consumed.
#[derive(Debug)]
struct BoundedStream {
    inner: TcpStream,
    remaining: usize,
}

impl AsyncRead for BoundedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.remaining == 0 {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("server sent more than {} bytes", MAX_SESSION_READ),
            )));
        }
        let max = buf.remaining().min(this.remaining);
        let read = {
            let mut limited = ReadBuf::new(buf.initialize_unfilled_to(max));
            ready!(Pin::new(&mut this.inner).poll_read(cx, &mut limited))?;
            limited.filled().len()
        };
        buf.advance(read);
        this.remaining -= read;
        Poll::Ready(Ok(()))
    }
}

impl AsyncTokioStream for BoundedStream {
    fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.inner.peer_addr()
    }
}

impl AsyncWrite for BoundedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, data)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

/// An open plaintext session, past the greeting and EHLO.
///
/// Dropping the session closes the socket; `close` additionally says QUIT.
pub(crate) struct SmtpSession {
    connection: AsyncSmtpConnection,
    host: String,
    step_timeout: Duration,
}

impl SmtpSession {
    /// Connects, reads the greeting and sends `EHLO <helo_name>`.
    ///
    /// The TCP connect has its own step limit; greeting and EHLO share the next one.
    pub(crate) async fn open(
        host: &str,
        port: u16,
        helo_name: &str,
        step_timeout: Duration,
    ) -> Result<Self> {
        tracing::debug!(target: "smtp_task", "Connecting to {}:{}", host, port);
        let stream = timeout(step_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| AppError::SmtpTimeout(format!("connect to {}:{}", host, port)))?
            .map_err(|e| AppError::SmtpConnect(format!("{}:{}: {}", host, port, e)))?;
        let stream = BoundedStream {
            inner: stream,
            remaining: MAX_SESSION_READ,
        };

        let client_id = ClientId::Domain(helo_name.to_string());
        let connection = timeout(
            step_timeout,
            AsyncSmtpConnection::connect_with_transport(Box::new(stream), &client_id),
        )
        .await
        .map_err(|_| AppError::SmtpTimeout(format!("greeting from {}", host)))?
        .map_err(|e| open_error(host, e))?;

        tracing::debug!(target: "smtp_task", "Session open with {}", host);
        Ok(Self {
            connection,
            host: host.to_string(),
            step_timeout,
        })
    }

    pub(crate) fn host(&self) -> &str {
        &self.host
    }

    pub(crate) async fn mail_from(&mut self, sender: Option<&Address>) -> Result<SmtpReply> {
        self.command(Mail::new(sender.cloned(), vec![])).await
    }

    pub(crate) async fn rcpt_to(&mut self, recipient: &Address) -> Result<SmtpReply> {
        self.command(Rcpt::new(recipient.clone(), vec![])).await
    }

    /// Sends a command and waits for its reply. Negative replies are returned as
    /// replies; only I/O, parse and timeout failures become errors.
    async fn command<C: Display + Send>(&mut self, command: C) -> Result<SmtpReply> {
        tracing::trace!(target: "smtp_task", "{} <- {}", self.host, command.to_string().trim_end());
        let reply = match timeout(self.step_timeout, self.connection.command(command)).await {
            Err(_) => return Err(AppError::SmtpTimeout(format!("reply from {}", self.host))),
            Ok(Ok(response)) => SmtpReply::from_response(&response),
            Ok(Err(e)) => SmtpReply::from_error(&e)
                .ok_or_else(|| AppError::SmtpProtocol(format!("{}: {}", self.host, e)))?,
        };
        tracing::trace!(target: "smtp_task", "{} -> {}", self.host, reply.summary());
        Ok(reply)
    }

    /// Best-effort QUIT, bounded by one step timeout. The socket closes on drop.
    pub(crate) async fn close(mut self) {
        match timeout(self.step_timeout, self.connection.quit()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                tracing::debug!(target: "smtp_task", "QUIT to {} failed: {}", self.host, e)
            }
            Err(_) => {
                tracing::debug!(target: "smtp_task", "QUIT to {} timed out; dropping connection", self.host)
            }
        }
    }
}
