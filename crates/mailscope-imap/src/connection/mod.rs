//! IMAP connection management.
//!
//! - TLS stream setup (implicit TLS only; the scanner never speaks
//!   plaintext IMAP)
//! - Framed I/O with literal handling
//! - The high-level [`MailboxSession`] handle

mod framed;
mod session;
mod stream;

pub use framed::{FramedStream, ResponseAccumulator};
pub use session::{ConnectParams, MailboxSession};
pub use stream::{connect_tls, create_tls_connector};
