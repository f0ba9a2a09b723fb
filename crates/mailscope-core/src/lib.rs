//! # mailscope-core
//!
//! The mailbox scan engine: a single streaming pass over the most
//! recent messages of a folder, folding parsed header records into one
//! of several aggregation modes. Nothing is ever persisted: the whole
//! analysis lives in one accumulator and is returned when the pass
//! ends.
//!
//! The engine talks to the mailbox through the [`MessageSource`] trait
//! so tests (and any future transport) can inject an in-memory fake;
//! production wires in `mailscope_imap::MailboxSession`.
//!
//! ```ignore
//! use mailscope_core::{ScanEngine, ScanMode};
//!
//! let engine = ScanEngine::new().sample_limit(1000).batch_size(100);
//! let outcome = engine
//!     .run(&mut session, ScanMode::Statistics, |p| { eprint!("\r{p}"); true })
//!     .await?;
//! ```

#![forbid(unsafe_code)]

mod aggregate;
mod engine;
mod error;
mod source;

pub use aggregate::{LIST_CAP, ScanMode, ScanReport, TOP_N, tokenize_subject};
pub use engine::{
    DEFAULT_BATCH_SIZE, DEFAULT_SAMPLE_LIMIT, Progress, ScanEngine, ScanOutcome, ScanPhase,
};
pub use error::{ScanError, ScanResult};
pub use source::MessageSource;

pub use mailscope_mime::MessageSummary;
