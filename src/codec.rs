//! raw message codec
use crate::headers::HeaderBlock;

/// A structured decomposition of raw HTTP request text.
///
/// Produced by [`parse`], consumed by the mutation engine and the repeat
/// pipeline. Never persisted.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedRequest {
  /// method token, `GET` when the request line is malformed
  pub method: String,
  /// request path, `/` when absent
  pub path: String,
  /// headers in captured order
  pub headers: HeaderBlock,
  /// body text, trailing whitespace trimmed; may be empty
  pub body: String,
}

/// Parse raw HTTP request text into a [`ParsedRequest`].
///
/// Line endings are normalized first, then the text splits at the first
/// blank line into header block and body. This never fails: a malformed
/// request line falls back to `GET /`, and header lines without a colon
/// are ignored.
///
/// # Examples
///
/// ```rust
/// let req = recaster::codec::parse("POST /login HTTP/1.1\r\nHost: a.test\r\n\r\nuser=bob");
/// assert_eq!(req.method, "POST");
/// assert_eq!(req.path, "/login");
/// assert_eq!(req.headers.get("host"), Some("a.test"));
/// assert_eq!(req.body, "user=bob");
/// ```
pub fn parse(raw: &str) -> ParsedRequest {
  let text = raw.replace("\r\n", "\n").replace('\r', "\n");
  let (head, body) = match text.split_once("\n\n") {
    Some((head, body)) => (head, body),
    None => (text.as_str(), ""),
  };
  let mut lines = head.lines();
  let request_line = lines.next().unwrap_or_default().trim();
  let mut tokens = request_line.split(' ');
  let method = match tokens.next() {
    Some(m) if !m.is_empty() => m,
    _ => "GET",
  };
  let path = match tokens.next() {
    Some(p) if !p.is_empty() => p,
    _ => "/",
  };
  let mut headers = HeaderBlock::new();
  for line in lines {
    if let Some((name, value)) = line.split_once(':') {
      headers.append(name.trim(), value.trim());
    }
  }
  ParsedRequest {
    method: method.to_string(),
    path: path.to_string(),
    headers,
    body: body.trim_end().to_string(),
  }
}

/// Rebuild transmittable request text from a [`ParsedRequest`].
///
/// Emits a conformant request line, the headers in stored order, a blank
/// separator line and the body. Inverse of [`parse`] up to whitespace.
pub fn build(req: &ParsedRequest) -> String {
  let mut out = String::new();
  out.push_str(&req.method);
  out.push(' ');
  out.push_str(&req.path);
  out.push_str(" HTTP/1.1\r\n");
  for (name, value) in req.headers.iter() {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str("\r\n");
  }
  out.push_str("\r\n");
  out.push_str(&req.body);
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_splits_headers_and_body() {
    let req = parse("POST /login HTTP/1.1\r\nHost: a.test\r\nContent-Length: 9\r\n\r\nuser=bob\n");
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/login");
    assert_eq!(req.headers.get("Host"), Some("a.test"));
    assert_eq!(req.headers.get("content-length"), Some("9"));
    assert_eq!(req.body, "user=bob");
  }

  #[test]
  fn parse_normalizes_bare_carriage_returns() {
    let req = parse("GET /a HTTP/1.1\rHost: b.test\r\rbody");
    assert_eq!(req.path, "/a");
    assert_eq!(req.headers.get("host"), Some("b.test"));
    assert_eq!(req.body, "body");
  }

  #[test]
  fn parse_never_fails_on_malformed_request_line() {
    let req = parse("");
    assert_eq!(req.method, "GET");
    assert_eq!(req.path, "/");
    assert!(req.headers.is_empty());
    assert!(req.body.is_empty());
  }

  #[test]
  fn parse_ignores_header_lines_without_colon() {
    let req = parse("GET / HTTP/1.1\nHost: a.test\nnot a header line\nAccept: */*\n\n");
    assert_eq!(req.headers.len(), 2);
    assert_eq!(req.headers.get("accept"), Some("*/*"));
  }

  #[test]
  fn parse_trims_header_whitespace() {
    let req = parse("GET / HTTP/1.1\n  X-Padded  :   spaced value  \n\n");
    assert_eq!(req.headers.get("X-Padded"), Some("spaced value"));
  }

  #[test]
  fn round_trip_is_semantically_stable() {
    let raw = "POST /api/v1/items?q=1 HTTP/1.1\r\nHost: api.test\r\nContent-Type: application/json\r\n\r\n{\"k\":2}";
    let first = parse(raw);
    let second = parse(&build(&first));
    assert_eq!(first, second);
  }
}
