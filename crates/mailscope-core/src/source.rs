//! The engine's view of a mailbox.

use mailscope_imap::{MailboxSession, Result};
use tokio::io::{AsyncRead, AsyncWrite};

/// Read access to an open mailbox, as the scan engine needs it.
///
/// The trait is exactly the read surface of
/// [`mailscope_imap::MailboxSession`]; tests implement it over
/// in-memory message lists so the engine never needs a live server.
pub trait MessageSource {
    /// Total messages in the folder.
    fn message_count(&self) -> u32;

    /// Fetches raw header blobs for an inclusive sequence range, in
    /// server (ascending) order.
    fn fetch_headers(
        &mut self,
        first: u32,
        last: u32,
    ) -> impl Future<Output = Result<Vec<(u32, Vec<u8>)>>>;
}

impl<S> MessageSource for MailboxSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn message_count(&self) -> u32 {
        Self::message_count(self)
    }

    async fn fetch_headers(&mut self, first: u32, last: u32) -> Result<Vec<(u32, Vec<u8>)>> {
        Self::fetch_headers(self, first, last).await
    }
}
