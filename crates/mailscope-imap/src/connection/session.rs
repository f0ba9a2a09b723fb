//! High-level mailbox session.
//!
//! A [`MailboxSession`] owns one authenticated, folder-selected IMAP
//! connection for the duration of one scan run. The folder is always
//! opened with EXAMINE, so the server treats the whole session as
//! read-only; fetches use `BODY.PEEK` and never touch message flags.
//!
//! There is no reconnect logic on purpose: a dropped connection is
//! surfaced to the caller, who may start a fresh run.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::{debug, info, warn};

use super::framed::{FramedStream, ResponseAccumulator};
use super::stream::connect_tls;
use crate::command::{Command, TagGenerator};
use crate::response::{Response, Status};
use crate::{DEFAULT_FOLDER, DEFAULT_PORT, Error, Result};

/// Connection parameters for one run.
///
/// Built once from CLI input or interactive prompts and immutable
/// afterwards.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// Account email address, used as the login name.
    pub email: String,
    /// IMAP server hostname.
    pub host: String,
    /// IMAP server port (993 unless overridden).
    pub port: u16,
    /// Account password or app-specific password.
    pub password: String,
    /// Folder to scan.
    pub folder: String,
}

impl ConnectParams {
    /// Creates parameters for the default folder (INBOX) on the
    /// default port.
    #[must_use]
    pub fn new(email: impl Into<String>, host: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            host: host.into(),
            port: DEFAULT_PORT,
            password: password.into(),
            folder: DEFAULT_FOLDER.to_string(),
        }
    }

    /// Overrides the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the folder.
    #[must_use]
    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }
}

/// An authenticated, read-only IMAP session on one folder.
///
/// Generic over the stream so tests can drive it with scripted mock
/// streams; production code uses [`MailboxSession::connect`] which
/// fixes `S` to a TLS stream.
pub struct MailboxSession<S = TlsStream<TcpStream>> {
    framed: FramedStream<S>,
    tags: TagGenerator,
    folder: String,
    exists: u32,
    closed: bool,
}

impl MailboxSession {
    /// Opens a TLS connection, authenticates, and examines the folder.
    ///
    /// # Errors
    ///
    /// [`Error::Auth`] when the server rejects the credentials;
    /// transport variants ([`Error::Io`], [`Error::Tls`],
    /// [`Error::Timeout`], ...) for network failures. The two classes
    /// are distinct so callers can show matching remediation hints.
    pub async fn connect(params: &ConnectParams) -> Result<Self> {
        info!(host = %params.host, port = params.port, "connecting");
        let stream = connect_tls(&params.host, params.port).await?;
        Self::from_stream(stream, params).await
    }
}

impl<S> MailboxSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Runs the greeting/LOGIN/EXAMINE handshake over an already
    /// connected stream.
    ///
    /// # Errors
    ///
    /// Same contract as [`MailboxSession::connect`].
    pub async fn from_stream(stream: S, params: &ConnectParams) -> Result<MailboxSession<S>> {
        let mut framed = FramedStream::new(stream);

        // Greeting. BYE here means the server refused us outright.
        let greeting = framed.read_response().await?;
        match Response::parse(&greeting)? {
            Response::UntaggedStatus {
                status: Status::Ok | Status::PreAuth,
                ..
            } => {}
            Response::UntaggedStatus {
                status: Status::Bye,
                text,
            } => return Err(Error::Bye(text)),
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        }

        let mut session = MailboxSession {
            framed,
            tags: TagGenerator::new(),
            folder: params.folder.clone(),
            exists: 0,
            closed: false,
        };

        session.login(&params.email, &params.password).await?;
        session.examine().await?;

        info!(
            folder = %session.folder,
            messages = session.exists,
            "session established"
        );
        Ok(session)
    }

    /// Total messages in the examined folder, from the EXAMINE
    /// snapshot. No bodies are fetched to produce this.
    #[must_use]
    pub const fn message_count(&self) -> u32 {
        self.exists
    }

    /// The folder this session has open.
    #[must_use]
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Fetches raw header blobs for an inclusive sequence range.
    ///
    /// Returns `(sequence number, raw header bytes)` pairs in server
    /// order. Only the From/Subject/Date header fields are requested;
    /// bodies are never transferred.
    ///
    /// # Errors
    ///
    /// Transport errors, or [`Error::No`]/[`Error::Bad`] when the
    /// server rejects the fetch.
    pub async fn fetch_headers(&mut self, first: u32, last: u32) -> Result<Vec<(u32, Vec<u8>)>> {
        let first = first.max(1);
        if first > last {
            return Ok(Vec::new());
        }

        let responses = self.exchange(&Command::FetchHeaders { first, last }).await?;

        let mut headers = Vec::new();
        for raw in &responses {
            match Response::parse(raw) {
                Ok(Response::Fetch { seq, header }) => headers.push((seq, header)),
                Ok(Response::Exists(n)) => self.exists = n,
                Ok(_) => {}
                // A single unparsable untagged line does not fail the
                // batch; the tagged status already did not.
                Err(e) => debug!(error = %e, "skipping unparsable response line"),
            }
        }
        Ok(headers)
    }

    /// Sends a NOOP, verifying the session is still alive.
    ///
    /// # Errors
    ///
    /// Transport errors when the connection has gone away.
    pub async fn noop(&mut self) -> Result<()> {
        self.exchange(&Command::Noop).await.map(|_| ())
    }

    /// Logs out and marks the session closed.
    ///
    /// Idempotent and infallible: errors during logout are logged and
    /// swallowed, because this runs on every exit path including ones
    /// where the connection is already broken.
    pub async fn logout(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let tag = self.tags.next();
        let cmd = Command::Logout.serialize(&tag);
        if let Err(e) = self.framed.write_command(&cmd).await {
            debug!(error = %e, "logout write failed");
            return;
        }
        if let Err(e) = ResponseAccumulator::new(&tag)
            .read_until_tagged(&mut self.framed)
            .await
        {
            debug!(error = %e, "logout response not read");
        }
        info!("session closed");
    }

    /// Returns true once [`MailboxSession::logout`] has run.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let tag = self.tags.next();
        debug!(%tag, "LOGIN");
        let cmd = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        }
        .serialize(&tag);
        self.framed.write_command(&cmd).await?;

        let responses = ResponseAccumulator::new(&tag)
            .read_until_tagged(&mut self.framed)
            .await?;

        match find_tagged(&responses, &tag)? {
            (Status::Ok | Status::PreAuth, _) => Ok(()),
            // NO and BAD on LOGIN are both credential-class failures
            // from the user's point of view.
            (Status::No | Status::Bad, text) => Err(Error::Auth(text)),
            (Status::Bye, text) => Err(Error::Bye(text)),
        }
    }

    async fn examine(&mut self) -> Result<()> {
        let folder = self.folder.clone();
        let responses = self.exchange(&Command::Examine { folder }).await?;

        for raw in &responses {
            if let Ok(Response::Exists(n)) = Response::parse(raw) {
                self.exists = n;
            }
        }
        Ok(())
    }

    /// Sends a command and collects its responses, mapping a failed
    /// tagged status to an error.
    async fn exchange(&mut self, command: &Command) -> Result<Vec<Vec<u8>>> {
        if self.closed {
            return Err(Error::Protocol("session already closed".to_string()));
        }

        let tag = self.tags.next();
        debug!(%tag, ?command, "sending");
        self.framed.write_command(&command.serialize(&tag)).await?;

        let responses = ResponseAccumulator::new(&tag)
            .read_until_tagged(&mut self.framed)
            .await?;

        match find_tagged(&responses, &tag)? {
            (Status::Ok | Status::PreAuth, _) => Ok(responses),
            (Status::No, text) => Err(Error::No(text)),
            (Status::Bad, text) => Err(Error::Bad(text)),
            (Status::Bye, text) => Err(Error::Bye(text)),
        }
    }
}

impl<S> std::fmt::Debug for MailboxSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxSession")
            .field("folder", &self.folder)
            .field("exists", &self.exists)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

/// Finds the tagged completion for `tag` among collected responses.
fn find_tagged(responses: &[Vec<u8>], tag: &str) -> Result<(Status, String)> {
    for raw in responses.iter().rev() {
        if let Ok(Response::Tagged {
            tag: resp_tag,
            status,
            text,
        }) = Response::parse(raw)
            && resp_tag == tag
        {
            if status == Status::No || status == Status::Bad {
                warn!(%tag, %text, "command rejected");
            }
            return Ok((status, text));
        }
    }
    Err(Error::Protocol("missing tagged response".to_string()))
}
