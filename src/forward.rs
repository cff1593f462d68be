//! transmission through the forwarding endpoint
use std::time::Duration;

use http::Method;
use log::debug;
use serde::Serialize;

use crate::client::Client;
use crate::errors::Result;
use crate::headers::HeaderBlock;
use crate::mutation::PROVENANCE_HEADER;
use crate::proxy::Proxy;
use crate::record::truncate_text;
use crate::redirect::Policy;
use crate::Request;

/// Outcome of sending a request through the forwarding endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SendResult {
  /// response status code
  pub status_code: u16,
  /// response headers in received order
  pub headers: Vec<(String, String)>,
  /// response body, truncated with an omitted-count marker when a
  /// positive limit is configured
  pub body: String,
  /// the URL that was requested
  pub url: String,
  /// the method that was sent
  pub method: String,
  /// identifier of the source item, set by the repeat pipeline
  #[serde(skip_serializing_if = "Option::is_none")]
  pub item_id: Option<i64>,
}

/// Sends structured requests through a forwarding proxy listener.
///
/// Certificate validation is disabled and redirects are never followed:
/// the traffic is being intercepted on purpose, and the caller wants the
/// exact first response. A provenance header is ensured on every outbound
/// request so the capture layer can tag the item.
///
/// ```rust
/// # fn run() -> Result<(), recaster::Error> {
/// let forwarder = recaster::Forwarder::new("http://127.0.0.1:8080")?
///   .max_body(4000);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Forwarder {
  client: Client,
  max_body: usize,
}

impl Forwarder {
  /// Creates a forwarder routing through the given proxy listener URL.
  pub fn new<U>(endpoint: U) -> Result<Forwarder>
  where
    http::Uri: TryFrom<U>,
    <http::Uri as TryFrom<U>>::Error: Into<http::Error>,
  {
    Self::with_timeout(endpoint, Duration::from_secs(30))
  }

  /// Creates a forwarder with an explicit network timeout.
  pub fn with_timeout<U>(endpoint: U, timeout: Duration) -> Result<Forwarder>
  where
    http::Uri: TryFrom<U>,
    <http::Uri as TryFrom<U>>::Error: Into<http::Error>,
  {
    let client = Client::builder()
      .proxy(Proxy::parse(endpoint)?)
      .danger_accept_invalid_certs(true)
      .danger_accept_invalid_hostnames(true)
      .redirect(Policy::none())
      .timeout(timeout)
      .build()?;
    Ok(Forwarder {
      client,
      max_body: 0,
    })
  }

  /// Truncate response bodies to this many characters. 0 = unlimited.
  pub fn max_body(mut self, limit: usize) -> Forwarder {
    self.max_body = limit;
    self
  }

  /// Issues `method url` through the forwarding endpoint and normalizes
  /// the response.
  ///
  /// The method token is upper-cased; a default provenance header is
  /// added when the caller did not supply one.
  pub fn send(
    &self,
    method: &str,
    url: &str,
    mut headers: HeaderBlock,
    body: Option<String>,
  ) -> Result<SendResult> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
    let uri: http::Uri = url.parse()?;
    if !headers.contains(PROVENANCE_HEADER) {
      headers.set(PROVENANCE_HEADER, "send");
    }
    let mut request = Request::new(method.clone(), uri);
    *request.headers_mut() = headers;
    if let Some(body) = body {
      request.set_body(body);
    }
    debug!("forwarding {} {}", method, url);
    let response = self.client.execute(request)?;
    let body = truncate_text(&response.text(), self.max_body);
    Ok(SendResult {
      status_code: response.status_code().as_u16(),
      headers: response
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
      body,
      url: url.to_string(),
      method: method.as_str().to_string(),
      item_id: None,
    })
  }
}
