use bytes::Bytes;
use http::{Method, Version};

use crate::body::Body;
use crate::headers::HeaderBlock;
use crate::{Client, Response, COLON_SPACE, CR_LF, SPACE};

/// A request which can be executed with `Client::execute()`.
///
/// Headers live in a [`HeaderBlock`] so captured spelling and order
/// survive all the way to the wire.
#[derive(Debug, Clone)]
pub struct Request {
  uri: http::Uri,
  version: Version,
  method: Method,
  headers: HeaderBlock,
  body: Option<Body>,
}

impl Default for Request {
  fn default() -> Self {
    Request {
      uri: http::Uri::default(),
      version: Version::HTTP_11,
      method: Method::GET,
      headers: HeaderBlock::new(),
      body: None,
    }
  }
}

impl Request {
  /// Creates a request with the given method and target URI.
  pub fn new(method: Method, uri: http::Uri) -> Request {
    Request {
      method,
      uri,
      ..Request::default()
    }
  }
  /// The HTTP method for this request.
  #[inline]
  pub fn method(&self) -> &Method {
    &self.method
  }
  /// A mutable reference to the method.
  #[inline]
  pub fn method_mut(&mut self) -> &mut Method {
    &mut self.method
  }
  /// The target URI for this request.
  #[inline]
  pub fn uri(&self) -> &http::Uri {
    &self.uri
  }
  /// A mutable reference to the URI.
  #[inline]
  pub fn uri_mut(&mut self) -> &mut http::Uri {
    &mut self.uri
  }
  /// The headers of this request, in emission order.
  #[inline]
  pub fn headers(&self) -> &HeaderBlock {
    &self.headers
  }
  /// A mutable reference to the headers.
  #[inline]
  pub fn headers_mut(&mut self) -> &mut HeaderBlock {
    &mut self.headers
  }
  /// The request body, if any.
  #[inline]
  pub fn body(&self) -> Option<&Body> {
    self.body.as_ref()
  }
  /// Sets the request body.
  #[inline]
  pub fn set_body<B: Into<Body>>(&mut self, body: B) {
    let body = body.into();
    self.body = if body.is_empty() { None } else { Some(body) };
  }
  /// The HTTP version emitted on the request line.
  #[inline]
  pub fn version(&self) -> Version {
    self.version
  }

  /// Serialize into transmittable bytes.
  ///
  /// Emits the origin-form request line, injects `Host` from the URI
  /// authority when absent and `Content-Length` when a body is present
  /// without one, then the headers in stored order and the body.
  pub(crate) fn to_raw(&self) -> Bytes {
    let mut raw = Vec::new();
    raw.extend(self.method.as_str().as_bytes());
    raw.extend(SPACE);
    raw.extend(self.uri.path().as_bytes());
    if let Some(q) = self.uri.query() {
      raw.extend([b'?']);
      raw.extend(q.as_bytes());
    }
    raw.extend(SPACE);
    raw.extend(format!("{:?}", self.version).as_bytes());
    raw.extend(CR_LF);
    if !self.headers.contains("host") {
      raw.extend(b"Host");
      raw.extend(COLON_SPACE);
      if let Some(authority) = self.uri.authority() {
        raw.extend(authority.as_str().as_bytes());
      }
      raw.extend(CR_LF);
    }
    let body_len = self.body.as_ref().map(|b| b.len()).unwrap_or(0);
    if body_len > 0 && !self.headers.contains("content-length") {
      raw.extend(b"Content-Length");
      raw.extend(COLON_SPACE);
      raw.extend(body_len.to_string().as_bytes());
      raw.extend(CR_LF);
    }
    for (name, value) in self.headers.iter() {
      raw.extend(name.as_bytes());
      raw.extend(COLON_SPACE);
      raw.extend(value.as_bytes());
      raw.extend(CR_LF);
    }
    raw.extend(CR_LF);
    if let Some(body) = &self.body {
      raw.extend(body.as_ref());
    }
    Bytes::from(raw)
  }
}

/// A builder to construct the properties of a `Request`.
///
/// To construct a `RequestBuilder`, refer to the `Client` documentation.
#[must_use = "RequestBuilder does nothing until you 'send' it"]
pub struct RequestBuilder {
  client: Client,
  request: Request,
}

impl RequestBuilder {
  /// Constructs a new request builder.
  pub fn new(client: Client, request: Request) -> RequestBuilder {
    RequestBuilder { client, request }
  }
  /// Add a header to this request, overriding any existing value.
  pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> RequestBuilder {
    self.request.headers.set(key, value);
    self
  }
  /// Merge a set of headers into the request.
  pub fn headers(mut self, headers: HeaderBlock) -> RequestBuilder {
    for (key, value) in headers {
      self.request.headers.set(key, value);
    }
    self
  }
  /// Set the request body.
  pub fn body<B: Into<Body>>(mut self, body: B) -> RequestBuilder {
    self.request.set_body(body);
    self
  }
  /// Build a `Request`, which can be inspected, modified and executed
  /// with `Client::execute()`.
  pub fn build(self) -> Request {
    self.request
  }
  /// Constructs the `Request` and sends it to the target URL, returning
  /// the `Response`.
  ///
  /// # Errors
  ///
  /// This method fails if the endpoint is unreachable or a transport
  /// error occurs while exchanging the messages.
  pub fn send(self) -> crate::Result<Response> {
    self.client.execute(self.request)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_raw_injects_host_and_content_length() {
    let mut req = Request::new(Method::POST, "http://a.test/login".parse().unwrap());
    req.set_body("user=alice");
    let raw = String::from_utf8(req.to_raw().to_vec()).unwrap();
    assert!(raw.starts_with("POST /login HTTP/1.1\r\n"));
    assert!(raw.contains("Host: a.test\r\n"));
    assert!(raw.contains("Content-Length: 10\r\n"));
    assert!(raw.ends_with("\r\n\r\nuser=alice"));
  }

  #[test]
  fn to_raw_keeps_existing_host_and_header_order() {
    let mut req = Request::new(Method::GET, "http://a.test/x?q=1".parse().unwrap());
    req.headers_mut().append("host", "override.test");
    req.headers_mut().append("X-First", "1");
    req.headers_mut().append("X-Second", "2");
    let raw = String::from_utf8(req.to_raw().to_vec()).unwrap();
    assert!(raw.starts_with("GET /x?q=1 HTTP/1.1\r\nhost: override.test\r\nX-First: 1\r\nX-Second: 2\r\n\r\n"));
    assert_eq!(raw.matches("host").count() + raw.matches("Host").count(), 1);
  }

  #[test]
  fn to_raw_respects_caller_supplied_content_length() {
    let mut req = Request::new(Method::POST, "http://a.test/".parse().unwrap());
    req.headers_mut().append("Content-Length", "99");
    req.set_body("abc");
    let raw = String::from_utf8(req.to_raw().to_vec()).unwrap();
    assert!(raw.contains("Content-Length: 99\r\n"));
    assert!(!raw.contains("Content-Length: 3\r\n"));
  }
}
