//! Decoding HTTP response bodies to UTF-8.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;

/// Only the document head is scanned for a `<meta>` charset declaration.
const META_SCAN_LIMIT: usize = 1024;

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
        .expect("meta charset pattern is valid")
});

/// Decode `bytes` to a string.
///
/// The charset comes from the `Content-Type` header when it names one, then from a
/// `<meta charset>` or `http-equiv` declaration near the top of the document, and
/// falls back to UTF-8 with invalid sequences replaced.
pub(crate) fn decode_bytes_to_utf8(bytes: &[u8], content_type: Option<&str>) -> String {
    let declared = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(bytes));

    let encoding = declared.unwrap_or(UTF_8);
    let (decoded, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(
            encoding = actual.name(),
            "replaced malformed byte sequences while decoding response"
        );
    }
    decoded.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Encoding::for_label(value.trim().trim_matches(['"', '\'']).as_bytes())
    })
}

fn charset_from_meta(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SCAN_LIMIT)];
    let captures = META_CHARSET.captures(head)?;
    Encoding::for_label(captures.get(1)?.as_bytes())
}
