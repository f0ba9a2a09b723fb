//! # mailscope-mime
//!
//! Defensive decoding of email message headers.
//!
//! The scanner feeds this crate raw header blobs fetched over IMAP and
//! expects a usable [`MessageSummary`] back for every single one of
//! them: malformed encodings, missing fields, non-UTF8 bytes, and
//! unparsable dates all degrade to empty or `None` fields instead of
//! errors. A single broken message must never abort a scan.
//!
//! ```
//! use mailscope_mime::MessageSummary;
//!
//! let raw = b"From: Alice <alice@example.com>\r\n\
//!             Subject: =?utf-8?B?SMOpbGxv?=\r\n\
//!             Date: Mon, 6 Oct 2025 09:30:00 +0200\r\n\r\n";
//!
//! let summary = MessageSummary::parse(raw);
//! assert_eq!(summary.sender, "alice@example.com");
//! assert_eq!(summary.subject, "Héllo");
//! assert!(summary.date.is_some());
//! ```

#![forbid(unsafe_code)]

pub mod encoding;
mod error;
pub mod header;
mod summary;

pub use error::{Error, Result};
pub use header::Headers;
pub use summary::MessageSummary;
