use std::io::{BufRead, Read};

use bytes::Bytes;
use flate2::read::MultiGzDecoder;
use http::Method;

use crate::body::Body;
use crate::errors::{new_io_error, Result};
use crate::headers::HeaderBlock;
use crate::{COLON_SPACE, CR_LF, SPACE};

/// A Response to a submitted `Request`.
#[derive(Debug, Default, Clone)]
pub struct Response {
  version: http::Version,
  uri: http::Uri,
  status_code: http::StatusCode,
  headers: HeaderBlock,
  body: Option<Body>,
}

impl Response {
  /// Get the `StatusCode` of this `Response`.
  #[inline]
  pub fn status_code(&self) -> http::StatusCode {
    self.status_code
  }
  /// Get the HTTP `Version` of this `Response`.
  #[inline]
  pub fn version(&self) -> http::Version {
    self.version
  }
  /// Get the headers of this `Response`, order and case preserved.
  #[inline]
  pub fn headers(&self) -> &HeaderBlock {
    &self.headers
  }
  /// Get a mutable reference to the headers.
  #[inline]
  pub fn headers_mut(&mut self) -> &mut HeaderBlock {
    &mut self.headers
  }
  /// Get the content-length of the response, if declared.
  pub fn content_length(&self) -> Option<u64> {
    self.headers.get("content-length").and_then(|v| v.parse().ok())
  }
  /// Get the final `http::Uri` of this `Response`.
  #[inline]
  pub fn uri(&self) -> &http::Uri {
    &self.uri
  }
  #[inline]
  pub(crate) fn url_mut(&mut self) -> &mut http::Uri {
    &mut self.uri
  }
  /// Get the full response body, if any.
  pub fn body(&self) -> Option<&Body> {
    self.body.as_ref()
  }
  /// Get the response text, UTF-8 with replacement characters.
  pub fn text(&self) -> String {
    match &self.body {
      Some(body) => String::from_utf8_lossy(body).to_string(),
      None => String::new(),
    }
  }
  /// Serialize back to raw message text.
  pub fn to_raw(&self) -> Bytes {
    let mut raw = Vec::new();
    raw.extend(format!("{:?}", self.version).as_bytes());
    raw.extend(SPACE);
    raw.extend(self.status_code.to_string().as_bytes());
    raw.extend(CR_LF);
    for (k, v) in self.headers.iter() {
      raw.extend(k.as_bytes());
      raw.extend(COLON_SPACE);
      raw.extend(v.as_bytes());
      raw.extend(CR_LF);
    }
    raw.extend(CR_LF);
    if let Some(b) = self.body() {
      raw.extend(b.as_ref());
    }
    Bytes::from(raw)
  }
}

/// response config
#[derive(Debug, Default, Clone)]
pub struct ResponseConfig {
  method: Method,
}

impl ResponseConfig {
  /// Config for the response to a request with the given method.
  ///
  /// `HEAD` responses carry no body regardless of declared length.
  pub fn new(method: Method) -> Self {
    ResponseConfig { method }
  }
}

/// A builder that reads a `Response` off a buffered stream.
#[derive(Debug)]
pub struct ResponseBuilder<R: BufRead> {
  reader: R,
  config: ResponseConfig,
}

impl<R: BufRead> ResponseBuilder<R> {
  /// Constructs a new response builder.
  pub fn new(reader: R, config: ResponseConfig) -> ResponseBuilder<R> {
    ResponseBuilder { reader, config }
  }

  fn parse_status_line(&mut self) -> Result<(http::Version, http::StatusCode)> {
    let mut line = String::new();
    self.reader.read_line(&mut line)?;
    let mut tokens = line.split(' ');
    let version = match tokens.next().map(|v| v.trim_end()) {
      Some("HTTP/0.9") => http::Version::HTTP_09,
      Some("HTTP/1.0") => http::Version::HTTP_10,
      Some("HTTP/1.1") => http::Version::HTTP_11,
      Some("HTTP/2.0") => http::Version::HTTP_2,
      Some("HTTP/3.0") => http::Version::HTTP_3,
      _ => {
        return Err(new_io_error(
          std::io::ErrorKind::InvalidData,
          "invalid http version",
        ));
      }
    };
    let status = tokens
      .next()
      .map(|s| s.trim_end())
      .filter(|s| !s.is_empty())
      .ok_or(new_io_error(
        std::io::ErrorKind::InvalidData,
        "missing status code",
      ))?;
    let status_code = http::StatusCode::from_bytes(status.as_bytes())?;
    Ok((version, status_code))
  }

  fn read_headers(&mut self) -> HeaderBlock {
    let mut headers = HeaderBlock::new();
    let mut line = String::new();
    while let Ok(length) = self.reader.read_line(&mut line) {
      let trimmed = line.trim_end_matches(['\r', '\n']);
      if length == 0 || trimmed.is_empty() {
        break;
      }
      if let Some((name, value)) = trimmed.split_once(':') {
        headers.append(name.trim(), value.trim());
      }
      line.clear();
    }
    headers
  }

  fn read_body(&mut self, headers: &HeaderBlock) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    if self.config.method == Method::HEAD {
      return Ok(body);
    }
    let chunked = headers
      .get("transfer-encoding")
      .map(|te| te.eq_ignore_ascii_case("chunked"))
      .unwrap_or(false);
    if chunked {
      body = self.read_chunked_body()?;
    } else if let Some(length) = headers.get("content-length").and_then(|v| v.parse::<usize>().ok())
    {
      body = vec![0; length];
      self.reader.read_exact(&mut body)?;
    } else {
      // no framing: read until the peer closes or the read times out
      let mut buffer = [0u8; 4096];
      loop {
        match self.reader.read(&mut buffer) {
          Ok(0) => break,
          Ok(n) => body.extend_from_slice(&buffer[..n]),
          Err(err)
            if err.kind() == std::io::ErrorKind::WouldBlock
              || err.kind() == std::io::ErrorKind::TimedOut =>
          {
            break;
          }
          Err(err) => return Err(err.into()),
        }
      }
    }
    if let Some(ce) = headers.get("content-encoding") {
      if ce.eq_ignore_ascii_case("gzip") {
        let mut decoded = Vec::new();
        let mut decoder = MultiGzDecoder::new(&body[..]);
        decoder.read_to_end(&mut decoded)?;
        body = decoded;
      }
    }
    Ok(body)
  }

  fn read_chunked_body(&mut self) -> Result<Vec<u8>> {
    let mut body: Vec<u8> = Vec::new();
    loop {
      let mut size_line = String::new();
      if self.reader.read_line(&mut size_line)? == 0 {
        break;
      }
      let size_token = size_line
        .trim()
        .split(';')
        .next()
        .unwrap_or_default()
        .to_string();
      if size_token.is_empty() {
        continue;
      }
      let size = usize::from_str_radix(&size_token, 16)
        .map_err(|_| new_io_error(std::io::ErrorKind::InvalidData, "invalid chunk size"))?;
      if size == 0 {
        // trailing CRLF after the last chunk
        let mut end = String::new();
        let _ = self.reader.read_line(&mut end);
        break;
      }
      let mut chunk = vec![0; size];
      self.reader.read_exact(&mut chunk)?;
      body.append(&mut chunk);
      let mut sep = String::new();
      let _ = self.reader.read_line(&mut sep);
    }
    Ok(body)
  }

  /// Read a complete `Response` off the stream.
  pub fn build(mut self) -> Result<Response> {
    let (version, status_code) = self.parse_status_line()?;
    let headers = self.read_headers();
    let body = self.read_body(&headers)?;
    Ok(Response {
      version,
      uri: Default::default(),
      status_code,
      headers,
      body: if body.is_empty() {
        None
      } else {
        Some(Body::from(body))
      },
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::{BufReader, Cursor};

  /// Helper to create a simple HTTP response as bytes
  fn mock_response(status: u16, headers: &[(&str, &str)], body: &str) -> Vec<u8> {
    let mut response = format!("HTTP/1.1 {} X\r\n", status);
    for (name, value) in headers {
      response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str("\r\n");
    response.push_str(body);
    response.into_bytes()
  }

  fn build(raw: Vec<u8>) -> Response {
    let reader = BufReader::new(Cursor::new(raw));
    ResponseBuilder::new(reader, ResponseConfig::default())
      .build()
      .unwrap()
  }

  #[test]
  fn parses_status_headers_and_sized_body() {
    let body = "This is the body content";
    let raw = mock_response(
      200,
      &[
        ("Content-Type", "text/plain"),
        ("Content-Length", &body.len().to_string()),
      ],
      body,
    );
    let response = build(raw);
    assert_eq!(response.status_code(), http::StatusCode::OK);
    assert_eq!(response.version(), http::Version::HTTP_11);
    assert_eq!(response.headers().get("content-type"), Some("text/plain"));
    assert_eq!(response.content_length(), Some(body.len() as u64));
    assert_eq!(response.text(), body);
  }

  #[test]
  fn parses_chunked_body() {
    let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n".to_vec();
    let response = build(raw);
    assert_eq!(response.text(), "Wikipedia");
  }

  #[test]
  fn reads_to_eof_without_framing() {
    let raw = b"HTTP/1.1 200 OK\r\n\r\nunframed body".to_vec();
    let response = build(raw);
    assert_eq!(response.text(), "unframed body");
  }

  #[test]
  fn decodes_gzip_bodies() {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"compressed payload").unwrap();
    let compressed = encoder.finish().unwrap();
    let mut raw = format!(
      "HTTP/1.1 200 OK\r\nContent-Encoding: gzip\r\nContent-Length: {}\r\n\r\n",
      compressed.len()
    )
    .into_bytes();
    raw.extend(compressed);
    let response = build(raw);
    assert_eq!(response.text(), "compressed payload");
  }

  #[test]
  fn head_responses_have_no_body() {
    let raw = mock_response(200, &[("Content-Length", "100")], "");
    let reader = BufReader::new(Cursor::new(raw));
    let response = ResponseBuilder::new(reader, ResponseConfig::new(Method::HEAD))
      .build()
      .unwrap();
    assert!(response.body().is_none());
  }

  #[test]
  fn preserves_header_case_and_order() {
    let raw = mock_response(200, &[("X-Bravo", "2"), ("x-alpha", "1")], "");
    let response = build(raw);
    let entries: Vec<_> = response.headers().iter().collect();
    assert_eq!(entries, vec![("X-Bravo", "2"), ("x-alpha", "1")]);
  }

  #[test]
  fn to_raw_reemits_the_message() {
    let raw = mock_response(404, &[("Content-Length", "5")], "nope!");
    let response = build(raw);
    let reemitted = String::from_utf8(response.to_raw().to_vec()).unwrap();
    assert!(reemitted.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(reemitted.contains("Content-Length: 5\r\n"));
    assert!(reemitted.ends_with("\r\n\r\nnope!"));
  }
}
