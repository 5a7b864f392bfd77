//! Just enough multipart/form-data parsing for the upload endpoint: the
//! boundary comes from the Content-Type header, fields are located by their
//! `form-data; name="…"` header, and each value runs from the blank line
//! after its headers to the next boundary delimiter.

/// Extract the boundary token from a Content-Type header value.
pub(crate) fn boundary(content_type: &str) -> Option<&str> {
    content_type
        .strip_prefix("multipart/form-data; boundary=")
        .filter(|boundary| !boundary.is_empty())
}

/// Scan the body for named fields. Values are raw bytes; file payloads are
/// binary. Parsing stops quietly at the first structural miss, leaving the
/// fields found so far.
pub(crate) fn fields(body: &[u8], boundary: &str) -> Vec<(String, Vec<u8>)> {
    const NAME_MARKER: &[u8] = b"form-data; name=\"";
    let delimiter = format!("\r\n--{boundary}");

    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(marker) = find(body, NAME_MARKER, pos) {
        let name_start = marker + NAME_MARKER.len();
        let Some(name_end) = find(body, b"\"", name_start) else { break };
        let Ok(name) = std::str::from_utf8(&body[name_start..name_end]) else { break };

        let Some(blank) = find(body, b"\r\n\r\n", name_end) else { break };
        let value_start = blank + 4;
        let Some(value_end) = find(body, delimiter.as_bytes(), value_start) else { break };

        out.push((name.to_owned(), body[value_start..value_end].to_vec()));
        pos = value_end;
    }
    out
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|at| at + from)
}
