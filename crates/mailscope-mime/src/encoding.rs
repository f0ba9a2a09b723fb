//! MIME header decoding: Base64, Quoted-Printable, RFC 2047 encoded
//! words.
//!
//! Decode-only: the scanner never generates mail, so there is no
//! encoding side here.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Decodes Quoted-Printable text (RFC 2045).
///
/// # Errors
///
/// Returns an error on incomplete or non-hex escape sequences.
pub fn decode_quoted_printable(text: &str) -> Result<String> {
    let mut result = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '=' {
            // Soft line break: "=\r\n" or "=\n".
            if chars.peek() == Some(&'\r') {
                chars.next();
                if chars.peek() == Some(&'\n') {
                    chars.next();
                    continue;
                }
            } else if chars.peek() == Some(&'\n') {
                chars.next();
                continue;
            }

            let hex: String = chars.by_ref().take(2).collect();
            if hex.len() == 2 {
                let byte = u8::from_str_radix(&hex, 16)
                    .map_err(|e| Error::InvalidEncoding(format!("invalid hex: {e}")))?;
                result.push(byte);
            } else {
                return Err(Error::InvalidEncoding(
                    "incomplete escape sequence".to_string(),
                ));
            }
        } else {
            let mut buf = [0u8; 4];
            result.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        }
    }

    String::from_utf8(result).map_err(Into::into)
}

/// Decodes one RFC 2047 encoded word: `=?charset?B|Q?encoded-text?=`.
///
/// Only UTF-8 compatible charsets decode to their real text; anything
/// declared in another charset is decoded lossily from its bytes.
///
/// # Errors
///
/// Returns an error when the word is structurally invalid or the
/// payload does not decode.
fn decode_word(word: &str) -> Result<String> {
    let inner = word
        .strip_prefix("=?")
        .and_then(|w| w.strip_suffix("?="))
        .ok_or_else(|| Error::InvalidEncoding("not an encoded word".to_string()))?;

    let parts: Vec<&str> = inner.splitn(3, '?').collect();
    if parts.len() != 3 {
        return Err(Error::InvalidEncoding("malformed encoded word".to_string()));
    }

    let encoding = parts[1].to_ascii_uppercase();
    let payload = parts[2];

    match encoding.as_str() {
        "B" => {
            let bytes = decode_base64(payload)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        "Q" => {
            // Q encoding writes spaces as underscores.
            decode_quoted_printable(&payload.replace('_', " "))
        }
        other => Err(Error::InvalidEncoding(format!("unknown encoding: {other}"))),
    }
}

/// Decodes all RFC 2047 encoded words embedded in a header value.
///
/// Real subjects freely mix plain text with any number of
/// `=?..?B|Q?..?=` tokens; this scans for them and decodes each in
/// place. A word that fails to decode is kept verbatim, so the result
/// is always usable text, never an error.
#[must_use]
pub fn decode_encoded_words(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("=?") {
        // An encoded word is "=?charset?enc?payload?=", i.e. the
        // closing "?=" is after the 4th '?' from the start.
        let Some(end) = find_word_end(&rest[start..]) else {
            break;
        };
        let word = &rest[start..start + end];

        result.push_str(&rest[..start]);
        match decode_word(word) {
            Ok(decoded) => result.push_str(&decoded),
            Err(_) => result.push_str(word),
        }
        rest = &rest[start + end..];

        // Whitespace between two adjacent encoded words is not
        // significant (RFC 2047 §6.2).
        if rest.trim_start().starts_with("=?") {
            rest = rest.trim_start();
        }
    }

    result.push_str(rest);
    result
}

/// Finds the byte length of the encoded word starting at offset 0
/// (which begins with `=?`), or None if it never closes.
fn find_word_end(s: &str) -> Option<usize> {
    // Skip "=?", then pass charset '?' enc '?', then find "?=".
    let after_charset = 2 + s[2..].find('?')? + 1;
    let after_encoding = after_charset + s[after_charset..].find('?')? + 1;
    let close = after_encoding + s[after_encoding..].find("?=")?;
    Some(close + 2)
}
