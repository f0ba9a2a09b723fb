//! Email provider auto-detection.
//!
//! Maps the domain of an email address to the IMAP server that hosts
//! it, using a fixed table of well-known providers with a generic
//! `imap.<domain>` fallback. Resolution never fails: an unrecognized
//! domain produces a best-effort guess flagged as unverified so the
//! caller can warn instead of silently connecting to the wrong host.

use crate::DEFAULT_PORT;

/// Well-known mail providers with dedicated IMAP endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    /// Google Mail (imap.gmail.com).
    Gmail,
    /// Microsoft Outlook/Hotmail/Live.
    Outlook,
    /// Yahoo Mail.
    Yahoo,
    /// Apple iCloud Mail.
    ICloud,
    /// AOL Mail.
    Aol,
    /// Fastmail.
    Fastmail,
    /// Any other provider.
    #[default]
    Other,
}

impl Provider {
    /// Detects the provider from an email domain (case-insensitive).
    #[must_use]
    pub fn for_domain(domain: &str) -> Self {
        match domain.to_ascii_lowercase().as_str() {
            "gmail.com" | "googlemail.com" => Self::Gmail,
            "outlook.com" | "hotmail.com" | "live.com" => Self::Outlook,
            "yahoo.com" | "ymail.com" => Self::Yahoo,
            "icloud.com" | "me.com" | "mac.com" => Self::ICloud,
            "aol.com" => Self::Aol,
            "fastmail.com" => Self::Fastmail,
            _ => Self::Other,
        }
    }

    /// The provider's IMAP host, if it is one we know.
    #[must_use]
    pub const fn imap_host(self) -> Option<&'static str> {
        match self {
            Self::Gmail => Some("imap.gmail.com"),
            Self::Outlook => Some("imap-mail.outlook.com"),
            Self::Yahoo => Some("imap.mail.yahoo.com"),
            Self::ICloud => Some("imap.mail.me.com"),
            Self::Aol => Some("imap.aol.com"),
            Self::Fastmail => Some("imap.fastmail.com"),
            Self::Other => None,
        }
    }

    /// A short remediation hint for rejected credentials.
    ///
    /// Most large providers reject account passwords on IMAP once
    /// 2-factor authentication is enabled and require an app-specific
    /// password instead.
    #[must_use]
    pub const fn auth_hint(self) -> &'static str {
        match self {
            Self::Gmail => {
                "Gmail requires an app password for IMAP: create one at \
                 myaccount.google.com/apppasswords and make sure IMAP is \
                 enabled in the Gmail settings."
            }
            Self::Outlook => {
                "Outlook may require an app password (account.live.com, \
                 Security > App passwords) or have IMAP access disabled \
                 for the account."
            }
            Self::Yahoo => {
                "Yahoo requires an app password for IMAP clients: \
                 generate one under Account Security > App passwords."
            }
            Self::ICloud => {
                "iCloud requires an app-specific password: generate one \
                 at appleid.apple.com under Sign-In and Security."
            }
            Self::Aol | Self::Fastmail | Self::Other => {
                "Check the address and password; if the account uses \
                 2-factor authentication, an app-specific password is \
                 usually required for IMAP."
            }
        }
    }
}

/// Result of resolving an email address to a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedServer {
    /// IMAP hostname.
    pub host: String,
    /// IMAP port (always 993, implicit TLS).
    pub port: u16,
    /// False when the host is a generic `imap.<domain>` guess.
    pub verified: bool,
    /// The detected provider.
    pub provider: Provider,
}

/// Resolves an email address to a best-effort IMAP server.
///
/// The domain is the text after the last `@`; an address without one is
/// treated as a bare domain. Unrecognized domains fall back to
/// `imap.<domain>` on port 993 with `verified` set to false.
#[must_use]
pub fn resolve(email: &str) -> ResolvedServer {
    let domain = email.rsplit_once('@').map_or(email, |(_, d)| d).trim();
    let provider = Provider::for_domain(domain);

    match provider.imap_host() {
        Some(host) => ResolvedServer {
            host: host.to_string(),
            port: DEFAULT_PORT,
            verified: true,
            provider,
        },
        None => ResolvedServer {
            host: format!("imap.{}", domain.to_ascii_lowercase()),
            port: DEFAULT_PORT,
            verified: false,
            provider,
        },
    }
}
