//! # mailscope-imap
//!
//! A deliberately small IMAP client for read-only mailbox scanning.
//!
//! The crate speaks just enough IMAP to authenticate, open a folder
//! read-only, count messages, and fetch header blocks in bounded
//! batches. Nothing here can modify a mailbox: the only commands ever
//! serialized are LOGIN, EXAMINE, FETCH with `BODY.PEEK`, NOOP, and
//! LOGOUT.
//!
//! ## Quick start
//!
//! ```ignore
//! use mailscope_imap::{ConnectParams, MailboxSession, provider};
//!
//! let resolved = provider::resolve("user@gmail.com");
//! let params = ConnectParams::new("user@gmail.com", resolved.host, password).port(resolved.port);
//!
//! let mut session = MailboxSession::connect(&params).await?;
//! println!("{} messages", session.message_count());
//!
//! let headers = session.fetch_headers(1, 50).await?;
//! session.logout().await;
//! ```
//!
//! ## Modules
//!
//! - [`provider`]: email-domain to IMAP server resolution
//! - [`command`]: command serialization and tag generation
//! - [`response`]: reduced response parsing (status lines, EXISTS, FETCH)
//! - [`connection`]: TLS stream, framed I/O, and the [`MailboxSession`]

#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod provider;
pub mod response;

pub use connection::{ConnectParams, FramedStream, MailboxSession, ResponseAccumulator};
pub use error::{Error, Result};
pub use provider::{Provider, ResolvedServer};
pub use response::{Response, Status};

/// Default IMAP-over-TLS port.
pub const DEFAULT_PORT: u16 = 993;

/// Default folder scanned when none is given.
pub const DEFAULT_FOLDER: &str = "INBOX";
