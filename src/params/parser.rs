//! URL-encoded pair parsing (query strings and form bodies).

use std::borrow::Cow;

use super::report::{Degradation, FragmentSource, Parsed};

/// Key-value pair list (faster than HashMap for small collections).
pub type ParamList = Vec<(String, String)>;

/// Why a component could not be decoded.
enum DecodeError {
    MalformedEscape,
    InvalidUtf8,
}

impl DecodeError {
    fn reason(&self) -> &'static str {
        match self {
            DecodeError::MalformedEscape => "malformed percent escape",
            DecodeError::InvalidUtf8 => "percent-decoded bytes are not valid UTF-8",
        }
    }
}

/// Check for `%` not followed by two hex digits.
fn has_malformed_escape(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return true;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    false
}

/// Decode one form component: `+` is a space, then percent-decoding.
fn decode_component(s: &str) -> Result<Cow<'_, str>, DecodeError> {
    if has_malformed_escape(s) {
        return Err(DecodeError::MalformedEscape);
    }

    let spaced = if s.contains('+') {
        Cow::Owned(s.replace('+', " "))
    } else {
        Cow::Borrowed(s)
    };

    if !spaced.contains('%') {
        return Ok(spaced);
    }

    percent_encoding::percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| Cow::Owned(decoded.into_owned()))
        .map_err(|_| DecodeError::InvalidUtf8)
}

/// Parse `&`-separated `key=value` pairs.
///
/// Components that fail to decode are kept as the raw token and recorded as
/// degraded; empty pairs are skipped, pairs without a key are skipped and
/// recorded.
pub fn parse_urlencoded(input: &str, source: FragmentSource) -> Parsed<ParamList> {
    let pair_count = input.matches('&').count() + 1;
    let mut parsed = Parsed::new(Vec::with_capacity(pair_count.min(16)));

    for pair in input.split('&') {
        if pair.is_empty() {
            continue;
        }

        let (raw_key, raw_value) = match pair.find('=') {
            Some(pos) => (&pair[..pos], &pair[pos + 1..]),
            None => (pair, ""),
        };

        if raw_key.is_empty() {
            parsed.degrade(Degradation::new(source, pair, "empty key"));
            continue;
        }

        let key = match decode_component(raw_key) {
            Ok(key) => key.into_owned(),
            Err(e) => {
                parsed.degrade(Degradation::new(source, pair, e.reason()));
                raw_key.to_string()
            }
        };

        let value = match decode_component(raw_value) {
            Ok(value) => value.into_owned(),
            Err(e) => {
                parsed.degrade(Degradation::new(source, pair, e.reason()));
                raw_value.to_string()
            }
        };

        parsed.value.push((key, value));
    }

    parsed
}

/// Parse a URL query string into key-value pairs.
#[inline]
pub fn parse_query_string(query: &str) -> Parsed<ParamList> {
    parse_urlencoded(query, FragmentSource::Query)
}
