//! Reduced IMAP response parsing.
//!
//! A scanning session only ever needs three shapes of server data:
//! tagged completion results, the untagged `EXISTS` count from EXAMINE,
//! and untagged `FETCH` responses carrying a header literal. Everything
//! else (FLAGS, RECENT, capability advertisements, ...) is recognized
//! and ignored rather than parsed.

use crate::{Error, Result};

/// Completion status of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command succeeded.
    Ok,
    /// Command failed.
    No,
    /// Command was malformed or not allowed.
    Bad,
    /// Server is disconnecting.
    Bye,
    /// Greeting for an already-authenticated connection.
    PreAuth,
}

impl Status {
    fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "OK" => Some(Self::Ok),
            "NO" => Some(Self::No),
            "BAD" => Some(Self::Bad),
            "BYE" => Some(Self::Bye),
            "PREAUTH" => Some(Self::PreAuth),
            _ => None,
        }
    }
}

/// A parsed server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Tagged command completion.
    Tagged {
        /// The command tag this completes.
        tag: String,
        /// Completion status.
        status: Status,
        /// Human-readable text (response codes included verbatim).
        text: String,
    },
    /// Untagged status line, e.g. the connection greeting.
    UntaggedStatus {
        /// Status word.
        status: Status,
        /// Human-readable text.
        text: String,
    },
    /// `* <n> EXISTS`: message count in the examined folder.
    Exists(u32),
    /// `* <n> FETCH (...)` with the raw header literal extracted.
    Fetch {
        /// Message sequence number.
        seq: u32,
        /// Raw header block bytes (empty when the server sent none).
        header: Vec<u8>,
    },
    /// Command continuation request.
    Continuation,
    /// Any other untagged data; recognized but not interpreted.
    Ignored,
}

impl Response {
    /// Parses one complete response as accumulated by the framed
    /// stream (line plus any embedded literal).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the line has no recognizable IMAP
    /// shape at all.
    pub fn parse(input: &[u8]) -> Result<Self> {
        if input.starts_with(b"+") {
            return Ok(Self::Continuation);
        }
        if let Some(rest) = input.strip_prefix(b"* ") {
            return Ok(Self::parse_untagged(rest));
        }
        Self::parse_tagged(input)
    }

    fn parse_untagged(rest: &[u8]) -> Self {
        let Some((word, tail)) = split_word(rest) else {
            return Self::Ignored;
        };

        if let Some(status) = Status::from_word(&word) {
            return Self::UntaggedStatus {
                status,
                text: text_of(tail),
            };
        }

        // Numeric responses: "<n> EXISTS", "<n> FETCH (...)", etc.
        if let Ok(n) = word.parse::<u32>() {
            let Some((kind, body)) = split_word(tail) else {
                return Self::Ignored;
            };
            return match kind.to_ascii_uppercase().as_str() {
                "EXISTS" => Self::Exists(n),
                "FETCH" => Self::Fetch {
                    seq: n,
                    header: extract_literal(body),
                },
                _ => Self::Ignored,
            };
        }

        Self::Ignored
    }

    fn parse_tagged(input: &[u8]) -> Result<Self> {
        let (tag, rest) = split_word(input).ok_or_else(|| Error::Parse {
            message: "empty response line".to_string(),
        })?;
        let (status_word, tail) = split_word(rest).ok_or_else(|| Error::Parse {
            message: format!("tagged response {tag:?} without status"),
        })?;
        let status = Status::from_word(&status_word).ok_or_else(|| Error::Parse {
            message: format!("unknown status {status_word:?}"),
        })?;

        Ok(Self::Tagged {
            tag,
            status,
            text: text_of(tail),
        })
    }
}

/// Splits the leading space-delimited word off a response line.
fn split_word(input: &[u8]) -> Option<(String, &[u8])> {
    let end = input
        .iter()
        .position(|&b| b == b' ' || b == b'\r' || b == b'\n')
        .unwrap_or(input.len());
    if end == 0 {
        return None;
    }
    let word = String::from_utf8_lossy(&input[..end]).into_owned();
    let rest = input.get(end + 1..).unwrap_or(&[]);
    Some((word, rest))
}

/// Trailing human-readable text, CRLF stripped, lossily decoded.
fn text_of(input: &[u8]) -> String {
    String::from_utf8_lossy(input)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

/// Extracts the first `{n}`-length literal from a FETCH body.
///
/// Servers answer the header fetch as
/// `* 7 FETCH (BODY[HEADER.FIELDS (...)] {123}\r\n<123 bytes>)\r\n`.
/// When there is no literal (NIL, or a quoted string) this degrades to
/// an empty header rather than failing the batch.
fn extract_literal(body: &[u8]) -> Vec<u8> {
    let Some(open) = body.iter().position(|&b| b == b'{') else {
        return Vec::new();
    };
    let after = &body[open + 1..];
    let Some(close) = after.iter().position(|&b| b == b'}') else {
        return Vec::new();
    };
    let Ok(len) = std::str::from_utf8(&after[..close])
        .unwrap_or("")
        .parse::<usize>()
    else {
        return Vec::new();
    };

    // Literal bytes start right after the CRLF following "{n}".
    let tail = &after[close + 1..];
    let Some(crlf) = tail.windows(2).position(|w| w == b"\r\n") else {
        return Vec::new();
    };
    let data = &tail[crlf + 2..];
    data.get(..len).map_or_else(|| data.to_vec(), <[u8]>::to_vec)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_greeting() {
        let response = Response::parse(b"* OK Dovecot ready.\r\n").unwrap();
        assert_eq!(
            response,
            Response::UntaggedStatus {
                status: Status::Ok,
                text: "Dovecot ready.".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_tagged_ok() {
        let response = Response::parse(b"A0001 OK LOGIN completed\r\n").unwrap();
        assert_eq!(
            response,
            Response::Tagged {
                tag: "A0001".to_string(),
                status: Status::Ok,
                text: "LOGIN completed".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_tagged_no_keeps_response_code() {
        let response =
            Response::parse(b"A0001 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n").unwrap();
        match response {
            Response::Tagged { status, text, .. } => {
                assert_eq!(status, Status::No);
                assert!(text.contains("AUTHENTICATIONFAILED"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_parse_exists() {
        let response = Response::parse(b"* 1432 EXISTS\r\n").unwrap();
        assert_eq!(response, Response::Exists(1432));
    }

    #[test]
    fn test_parse_fetch_with_literal() {
        let input = b"* 7 FETCH (BODY[HEADER.FIELDS (FROM SUBJECT DATE)] {26}\r\nFrom: a@x.com\r\nSubject: hi)\r\n";
        let response = Response::parse(input).unwrap();
        match response {
            Response::Fetch { seq, header } => {
                assert_eq!(seq, 7);
                assert_eq!(header, b"From: a@x.com\r\nSubject: hi");
                assert_eq!(header.len(), 26);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_parse_fetch_without_literal_degrades() {
        let response = Response::parse(b"* 7 FETCH (FLAGS (\\Seen))\r\n").unwrap();
        assert_eq!(
            response,
            Response::Fetch {
                seq: 7,
                header: Vec::new(),
            }
        );
    }

    #[test]
    fn test_parse_recent_is_ignored() {
        let response = Response::parse(b"* 3 RECENT\r\n").unwrap();
        assert_eq!(response, Response::Ignored);
    }

    #[test]
    fn test_parse_flags_is_ignored() {
        let response = Response::parse(b"* FLAGS (\\Answered \\Seen)\r\n").unwrap();
        assert_eq!(response, Response::Ignored);
    }

    #[test]
    fn test_parse_continuation() {
        assert_eq!(Response::parse(b"+ go ahead\r\n").unwrap(), Response::Continuation);
    }

    #[test]
    fn test_parse_bye() {
        let response = Response::parse(b"* BYE logging out\r\n").unwrap();
        assert_eq!(
            response,
            Response::UntaggedStatus {
                status: Status::Bye,
                text: "logging out".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(Response::parse(b"\r\n").is_err());
        assert!(Response::parse(b"A0001 WAT hmm\r\n").is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_never_panics(input in proptest::collection::vec(any::<u8>(), 0..512)) {
                let _ = Response::parse(&input);
            }

            #[test]
            fn exists_roundtrip(n in 0u32..=u32::MAX) {
                let line = format!("* {n} EXISTS\r\n");
                prop_assert_eq!(Response::parse(line.as_bytes()).unwrap(), Response::Exists(n));
            }
        }
    }
}
