//! TLS stream setup.
//!
//! The scanner only supports implicit TLS on the IMAPS port. There is
//! no plaintext or STARTTLS path: a mailbox credential never travels
//! over an unencrypted socket.

#![allow(clippy::missing_errors_doc)]

use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::{Error, Result};

/// Default timeout for establishing the TCP + TLS connection.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates a TLS connector with the webpki root certificates.
pub fn create_tls_connector() -> TlsConnector {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

/// Connects to a server with TLS from the start.
///
/// A stalled connect is reported as [`Error::Timeout`] so the caller
/// can treat it as a connection failure.
pub async fn connect_tls(host: &str, port: u16) -> Result<TlsStream<TcpStream>> {
    let addr = format!("{host}:{port}");
    let server_name = ServerName::try_from(host.to_string())?;
    let connector = create_tls_connector();

    let handshake = async {
        let tcp = TcpStream::connect(&addr).await?;
        let tls = connector.connect(server_name, tcp).await?;
        Ok::<_, Error>(tls)
    };

    tokio::time::timeout(CONNECT_TIMEOUT, handshake)
        .await
        .map_err(|_| Error::Timeout(CONNECT_TIMEOUT))?
}
