//! The per-message record produced from one raw header blob.

use chrono::{DateTime, FixedOffset};

use crate::encoding::decode_encoded_words;
use crate::header::Headers;

/// Normalized metadata for one message: sender, subject, date.
///
/// Every field is best-effort. A message the server mangled still
/// yields a summary (with empty strings or a `None` date), so the
/// caller's processed count keeps incrementing no matter what arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    /// Sender address reduced to the addr-spec (`a@b`), casing as
    /// sent; empty when unparsable.
    pub sender: String,
    /// Decoded subject; empty when absent.
    pub subject: String,
    /// Parsed Date field; `None` when absent or non-standard.
    pub date: Option<DateTime<FixedOffset>>,
}

impl MessageSummary {
    /// Parses a raw header blob. Never fails.
    ///
    /// Non-UTF8 bytes are decoded lossily, encoded-word subjects are
    /// expanded, and the date accepts RFC 2822 with a `None` fallback.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let headers = Headers::parse(&text);

        let sender = headers
            .get("From")
            .map(|from| extract_addr_spec(&decode_encoded_words(from)))
            .unwrap_or_default();

        let subject = headers
            .get("Subject")
            .map(decode_encoded_words)
            .unwrap_or_default();

        let date = headers
            .get("Date")
            .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok());

        Self {
            sender,
            subject,
            date,
        }
    }
}

/// Reduces a From value to its addr-spec.
///
/// `Display Name <user@host>` becomes `user@host`; a bare address
/// passes through (quotes and comments stripped). When nothing looks
/// like an address the input is returned trimmed; a truly blank value
/// produces an empty string, which downstream matching treats the same
/// way.
fn extract_addr_spec(from: &str) -> String {
    // Angle-bracket form wins when present.
    if let Some(open) = from.rfind('<')
        && let Some(close) = from[open..].find('>')
    {
        return from[open + 1..open + close].trim().to_string();
    }

    // Otherwise find a '@'-containing token.
    from.split_whitespace()
        .find(|token| token.contains('@'))
        .map_or_else(
            || from.trim().to_string(),
            |token| token.trim_matches(['"', '\'', '(', ')', ',', ';']).to_string(),
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse_str(s: &str) -> MessageSummary {
        MessageSummary::parse(s.as_bytes())
    }

    #[test]
    fn test_plain_headers() {
        let summary = parse_str(
            "From: alice@example.com\r\nSubject: Weekly Update\r\nDate: Mon, 6 Oct 2025 09:30:00 +0200\r\n\r\n",
        );
        assert_eq!(summary.sender, "alice@example.com");
        assert_eq!(summary.subject, "Weekly Update");
        assert!(summary.date.is_some());
    }

    #[test]
    fn test_display_name_form() {
        let summary = parse_str("From: \"Alice Lidell\" <alice@example.com>\r\n\r\n");
        assert_eq!(summary.sender, "alice@example.com");
    }

    #[test]
    fn test_encoded_word_subject() {
        let summary = parse_str("Subject: =?utf-8?B?SMOpbGxv?= =?utf-8?Q?World?=\r\n\r\n");
        assert_eq!(summary.subject, "HélloWorld");
    }

    #[test]
    fn test_encoded_display_name() {
        let summary = parse_str("From: =?utf-8?Q?Ren=C3=A9?= <rene@example.fr>\r\n\r\n");
        assert_eq!(summary.sender, "rene@example.fr");
    }

    #[test]
    fn test_missing_fields_degrade_to_empty() {
        let summary = parse_str("X-Other: whatever\r\n\r\n");
        assert_eq!(summary.sender, "");
        assert_eq!(summary.subject, "");
        assert_eq!(summary.date, None);
    }

    #[test]
    fn test_non_utf8_bytes_never_fail() {
        let mut raw = b"From: a@x.com\r\nSubject: caf".to_vec();
        raw.extend_from_slice(&[0xE9, 0xFF, 0xFE]); // latin-1 é + junk
        raw.extend_from_slice(b"\r\n\r\n");

        let summary = MessageSummary::parse(&raw);
        assert_eq!(summary.sender, "a@x.com");
        assert!(summary.subject.starts_with("caf"));
    }

    #[test]
    fn test_malformed_date_is_none() {
        let summary = parse_str("From: a@x.com\r\nDate: next tuesday probably\r\n\r\n");
        assert_eq!(summary.date, None);
        // But the record itself still exists.
        assert_eq!(summary.sender, "a@x.com");
    }

    #[test]
    fn test_rfc2822_date_roundtrip() {
        let summary = parse_str("Date: Tue, 1 Jul 2003 10:52:37 +0200\r\n\r\n");
        let date = summary.date.unwrap();
        assert_eq!(date.to_rfc2822(), "Tue, 1 Jul 2003 10:52:37 +0200");
    }

    #[test]
    fn test_empty_input() {
        let summary = MessageSummary::parse(b"");
        assert_eq!(summary.sender, "");
        assert_eq!(summary.subject, "");
        assert_eq!(summary.date, None);
    }

    #[test]
    fn test_bare_address_without_brackets() {
        let summary = parse_str("From: bob@example.org (Bob)\r\n\r\n");
        assert_eq!(summary.sender, "bob@example.org");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_never_panics(raw in proptest::collection::vec(any::<u8>(), 0..1024)) {
                let _ = MessageSummary::parse(&raw);
            }
        }
    }
}
