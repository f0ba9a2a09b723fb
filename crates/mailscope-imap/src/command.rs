//! IMAP command serialization.
//!
//! Only the read-only subset of the protocol is representable: there is
//! deliberately no STORE, COPY, MOVE, or EXPUNGE here.

use std::sync::atomic::{AtomicU32, Ordering};

/// An IMAP command the scanner is allowed to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// LOGIN with username and password.
    Login {
        /// Account name (usually the email address).
        username: String,
        /// Account password or app-specific password.
        password: String,
    },
    /// EXAMINE, i.e. SELECT in read-only mode.
    Examine {
        /// Folder to open.
        folder: String,
    },
    /// FETCH of header fields only, via `BODY.PEEK` so nothing is
    /// marked as read.
    FetchHeaders {
        /// First sequence number (inclusive).
        first: u32,
        /// Last sequence number (inclusive).
        last: u32,
    },
    /// NOOP keep-alive.
    Noop,
    /// LOGOUT.
    Logout,
}

impl Command {
    /// Serializes the command with the given tag, CRLF-terminated.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }
            Self::Examine { folder } => {
                buf.extend_from_slice(b"EXAMINE ");
                write_astring(&mut buf, folder);
            }
            Self::FetchHeaders { first, last } => {
                buf.extend_from_slice(
                    format!(
                        "FETCH {first}:{last} (BODY.PEEK[HEADER.FIELDS (FROM SUBJECT DATE)])"
                    )
                    .as_bytes(),
                );
            }
            Self::Noop => buf.extend_from_slice(b"NOOP"),
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}

/// Writes an astring (atom or quoted string).
fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        buf.push(b'"');
        for b in s.bytes() {
            if b == b'"' || b == b'\\' {
                buf.push(b'\\');
            }
            buf.push(b);
        }
        buf.push(b'"');
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Returns true if the byte needs quoting.
const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b == 0x7F
}

/// Generates unique sequential command tags ("A0000", "A0001", ...).
#[derive(Debug, Default)]
pub struct TagGenerator {
    counter: AtomicU32,
}

impl TagGenerator {
    /// Creates a new generator starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: AtomicU32::new(0),
        }
    }

    /// Generates the next tag.
    #[must_use]
    pub fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("A{n:04}")
    }
}
