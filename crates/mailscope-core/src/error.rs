//! Error types for scan runs.

use thiserror::Error;

/// Errors that abort a scan before any batch was aggregated.
///
/// Per-message damage never appears here: malformed headers degrade
/// inside the parser, and a batch failure after at least one
/// successful batch returns a partial outcome instead of an error.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The mailbox transport failed (connection, authentication, or
    /// protocol).
    #[error(transparent)]
    Mailbox(#[from] mailscope_imap::Error),
}

/// Result type alias for scan operations.
pub type ScanResult<T> = std::result::Result<T, ScanError>;
