//! Request and response head helpers.

use std::borrow::Cow;

use hyper::header::{HeaderMap, AUTHORIZATION, CONNECTION};
use hyper::Version;

/// The `Authorization` header, if present.
///
/// Non-UTF-8 bytes are replaced rather than dropped so a garbled header is
/// still reported as a malformed credential.
pub fn authorization(headers: &HeaderMap) -> Option<Cow<'_, str>> {
    headers
        .get(AUTHORIZATION)
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
}

fn connection_has(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|t| t.trim().eq_ignore_ascii_case(token))
}

/// Whether a message with this head keeps the connection open.
///
/// HTTP/1.0 needs an explicit `keep-alive`, HTTP/1.1 stays open unless `close`.
pub fn is_keep_alive(version: Version, headers: &HeaderMap) -> bool {
    if version == Version::HTTP_10 {
        connection_has(headers, "keep-alive")
    } else {
        !connection_has(headers, "close")
    }
}
