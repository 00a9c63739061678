//! The peer transfer wire protocol.
//!
//! One request per connection, no TLS, no framing:
//!
//! - Request: exactly one line `GET <target>\n`, where `<target>` is the
//!   absolute path on the sender's filesystem with each space replaced by
//!   `%20`. That is the whole encoding suite; nothing else is escaped.
//! - Response on miss: the literal bytes `HTTP/1.1 404 Not Found\n`.
//! - Response on hit: the raw file bytes, then close. The receiver relies
//!   on EOF to detect completion, and must sniff the first chunk for the
//!   404 sentinel. A file that genuinely starts with the sentinel bytes is
//!   misidentified; the behavior is kept for compatibility with existing
//!   peers.

/// Transfer chunk size, both sides.
pub const CHUNK_SIZE: usize = 1024;

/// Sentinel sent when the requested path does not exist.
pub const NOT_FOUND_RESPONSE: &[u8] = b"HTTP/1.1 404 Not Found\n";

/// Sentinel prefix the downloader sniffs in the first chunk (without the
/// trailing newline, so a short first read still matches).
pub const NOT_FOUND_SENTINEL: &[u8] = b"HTTP/1.1 404 Not Found";

/// It encodes a filesystem path for the request line.
#[must_use]
pub fn encode_target(path: &str) -> String {
    path.replace(' ', "%20")
}

/// It decodes a request-line target back into a filesystem path.
#[must_use]
pub fn decode_target(target: &str) -> String {
    target.replace("%20", " ")
}

/// It builds the full request line for a remote path.
#[must_use]
pub fn request_line(remote_path: &str) -> String {
    format!("GET {}\n", encode_target(remote_path))
}

/// It extracts the requested path from a received request line.
#[must_use]
pub fn parse_request_line(line: &str) -> Option<String> {
    let mut parts = line.split_whitespace();

    if parts.next()? != "GET" {
        return None;
    }

    Some(decode_target(parts.next()?))
}
