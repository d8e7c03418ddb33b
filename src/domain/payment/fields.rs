//! `key=value&key=value` codec used inside the gateway ciphertext.
//!
//! The two directions are deliberately asymmetric: outbound values are
//! written as-is (the gateway expects raw values), inbound values are
//! percent-decoded.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// Joins fields into `k=v&k=v`, in iteration order, without encoding.
pub fn stringify_fields<I, K, V>(fields: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = String::new();
    for (key, value) in fields {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(key.as_ref());
        out.push('=');
        out.push_str(value.as_ref());
    }
    out
}

/// Splits `k=v&k=v` into a map.
///
/// Empty segments are skipped, only the first `=` separates key from value,
/// and a value whose percent escapes do not decode to UTF-8 is kept raw.
/// A repeated key keeps its last value.
pub fn parse_fields(input: &str) -> HashMap<String, String> {
    input
        .split('&')
        .filter(|segment| !segment.trim().is_empty())
        .filter_map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), decode_value(value)))
        })
        .collect()
}

fn decode_value(raw: &str) -> String {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}
