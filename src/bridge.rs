//! capture bridge client and the repeat pipeline
use std::time::Duration;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use log::debug;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::errors::{Error, Result};
use crate::forward::{Forwarder, SendResult};
use crate::mutation::{mutate, MutationSpec};
use crate::query::QueryCriteria;
use crate::record::TrafficItem;
use crate::response::Response;

/// Where the capture bridge lives and how long to wait for it.
///
/// An explicit value passed to [`BridgeClient::with_config`]; there is no
/// process-wide default beyond [`BridgeConfig::default`].
#[derive(Debug, Clone)]
pub struct BridgeConfig {
  /// base address of the bridge API
  pub endpoint: String,
  /// network timeout applied to every call
  pub timeout: Duration,
}

impl Default for BridgeConfig {
  fn default() -> Self {
    BridgeConfig {
      endpoint: "http://127.0.0.1:8090".to_string(),
      timeout: Duration::from_secs(10),
    }
  }
}

/// Liveness report of the capture bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
  /// `"ok"` when the bridge is up
  pub status: String,
  /// number of captured items
  pub count: u64,
  /// port the bridge listens on
  pub port: u16,
}

/// Scope verdict for a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeCheck {
  /// the URL that was checked
  pub url: String,
  /// whether it is inside the configured target scope
  pub in_scope: bool,
}

/// A request to open a captured or raw message in the manual editor.
///
/// Provide either `history_id` or `request` (+ host/port/https); anything
/// else is rejected as invalid input.
#[derive(Debug, Default, Clone)]
pub struct RepeaterSend {
  /// identifier of a captured item to open
  pub history_id: Option<i64>,
  /// raw request text for an explicit payload
  pub request: Option<String>,
  /// target host for a raw payload
  pub host: Option<String>,
  /// target port for a raw payload
  pub port: u16,
  /// whether the raw payload targets TLS
  pub https: bool,
  /// optional tab label
  pub tab_name: Option<String>,
}

/// Acknowledgment for a repeater send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeaterAck {
  /// `"sent"` on success
  pub status: String,
  /// the tab label that was applied, if any
  #[serde(default)]
  pub tab_name: Option<String>,
}

/// Hostnames wire shape of `GET /proxy/hosts`.
#[derive(Debug, Deserialize)]
struct Hosts {
  #[serde(default)]
  hosts: Vec<String>,
}

/// Client for the capture bridge API.
///
/// All operations are synchronous single exchanges; errors are reported
/// per the crate [`Error`](crate::Error) taxonomy and never retried
/// internally.
///
/// ```rust,no_run
/// # fn run() -> Result<(), recaster::Error> {
/// use recaster::{BridgeClient, QueryCriteria};
///
/// let bridge = BridgeClient::new();
/// let mut criteria = QueryCriteria::new();
/// criteria.host = Some("example.com".to_string());
/// for item in bridge.history(&criteria)? {
///   println!("[{}] {:?}", item.id, item.url);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BridgeClient {
  config: BridgeConfig,
  http: Client,
}

impl Default for BridgeClient {
  fn default() -> Self {
    Self::new()
  }
}

impl BridgeClient {
  /// A client against the default local bridge endpoint.
  ///
  /// # Panics
  ///
  /// Panics if the TLS backend cannot be initialized; use
  /// [`with_config`](BridgeClient::with_config) to handle that as an
  /// `Error`.
  pub fn new() -> BridgeClient {
    Self::with_config(BridgeConfig::default()).expect("BridgeClient::new()")
  }

  /// A client with an explicit endpoint and timeout.
  pub fn with_config(config: BridgeConfig) -> Result<BridgeClient> {
    let http = Client::builder().timeout(config.timeout).build()?;
    Ok(BridgeClient { config, http })
  }

  /// The configured bridge endpoint.
  pub fn endpoint(&self) -> &str {
    &self.config.endpoint
  }

  // wire plumbing

  fn url(&self, path: &str, params: &[(&'static str, String)]) -> String {
    let mut url = format!("{}{}", self.config.endpoint.trim_end_matches('/'), path);
    if !params.is_empty() {
      url.push('?');
      let encoded: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, utf8_percent_encode(v, NON_ALPHANUMERIC)))
        .collect();
      url.push_str(&encoded.join("&"));
    }
    url
  }

  fn get(&self, path: &str, params: &[(&'static str, String)]) -> Result<Response> {
    let url = self.url(path, params);
    debug!("bridge GET {}", url);
    let uri: http::Uri = url.parse()?;
    let response = self
      .http
      .get(uri)
      .send()
      .map_err(|e| self.name_endpoint(e))?;
    self.check_status(response)
  }

  fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&'static str, String)]) -> Result<T> {
    let response = self.get(path, params)?;
    Ok(serde_json::from_str(&response.text())?)
  }

  fn post_json<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
    let url = self.url(path, &[]);
    debug!("bridge POST {}", url);
    let uri: http::Uri = url.parse()?;
    let response = self
      .http
      .post(uri)
      .header("Content-Type", "application/json")
      .body(body.to_string())
      .send()
      .map_err(|e| self.name_endpoint(e))?;
    let response = self.check_status(response)?;
    Ok(serde_json::from_str(&response.text())?)
  }

  fn check_status(&self, response: Response) -> Result<Response> {
    let status = response.status_code();
    if status.is_success() {
      Ok(response)
    } else {
      Err(Error::Status {
        status: status.as_u16(),
        body: response.text(),
      })
    }
  }

  /// Connectivity failures name the configured endpoint, not the full
  /// request URL.
  fn name_endpoint(&self, err: Error) -> Error {
    match err {
      Error::Connect { source, .. } => Error::Connect {
        endpoint: self.config.endpoint.clone(),
        source,
      },
      other => other,
    }
  }

  // bridge operations

  /// Liveness, item count and port of the bridge.
  pub fn health(&self) -> Result<Health> {
    self.get_json("/health", &[])
  }

  /// Plain-text API reference served by the bridge.
  pub fn docs(&self) -> Result<String> {
    Ok(self.get("/", &[])?.text())
  }

  /// Sorted unique hostnames seen in captured traffic.
  pub fn hosts(&self) -> Result<Vec<String>> {
    let hosts: Hosts = self.get_json("/proxy/hosts", &[])?;
    Ok(hosts.hosts)
  }

  /// Search the capture history.
  pub fn history(&self, criteria: &QueryCriteria) -> Result<Vec<TrafficItem>> {
    self.get_json("/proxy/history", &criteria.to_params())
  }

  /// One full item, response body truncated to `max_body` characters
  /// (0 = unlimited).
  pub fn item(&self, id: i64, max_body: u32) -> Result<TrafficItem> {
    let mut params = Vec::new();
    if max_body > 0 {
      params.push(("max_body", max_body.to_string()));
    }
    self.get_json(&format!("/proxy/history/{}", id), &params)
  }

  /// History restricted to the manual editor tool.
  pub fn repeater_history(&self, criteria: &QueryCriteria) -> Result<Vec<TrafficItem>> {
    self.get_json("/repeater/history", &criteria.to_params())
  }

  /// The most recent manual-editor send, with full decoded content.
  pub fn repeater_latest(&self, max_body: u32) -> Result<TrafficItem> {
    let mut params = Vec::new();
    if max_body > 0 {
      params.push(("max_body", max_body.to_string()));
    }
    self.get_json("/repeater/latest", &params)
  }

  /// Opens a captured item or a raw payload in the manual editor.
  pub fn send_to_repeater(&self, send: RepeaterSend) -> Result<RepeaterAck> {
    let mut body = serde_json::Map::new();
    match (send.history_id, send.request) {
      (Some(id), _) => {
        body.insert("history_id".to_string(), id.into());
      }
      (None, Some(request)) => {
        body.insert(
          "request".to_string(),
          BASE64_STANDARD.encode(request).into(),
        );
        body.insert(
          "host".to_string(),
          send.host.unwrap_or_default().into(),
        );
        body.insert("port".to_string(), send.port.into());
        body.insert("https".to_string(), send.https.into());
      }
      (None, None) => {
        return Err(Error::InvalidInput(
          "provide either a history id or a raw request".to_string(),
        ));
      }
    }
    if let Some(tab_name) = send.tab_name {
      body.insert("tab_name".to_string(), tab_name.into());
    }
    self.post_json("/repeater", serde_json::Value::Object(body))
  }

  /// Whether `url` is inside the bridge's target scope.
  pub fn scope(&self, url: &str) -> Result<ScopeCheck> {
    self.get_json("/scope", &[("url", url.to_string())])
  }

  // repeat pipeline

  /// Fetches the full raw request of `item_id`, applies `spec` and
  /// resends it through `forwarder`.
  ///
  /// The outbound scheme follows the item's recorded URL; the host comes
  /// from the mutated `Host` header (removed before transport, which
  /// re-derives it) with the recorded host as fallback.
  ///
  /// # Errors
  ///
  /// [`Error::NotFound`] when the item has no request text; bridge and
  /// transport failures propagate per the crate taxonomy.
  pub fn repeat(
    &self,
    item_id: i64,
    spec: &MutationSpec,
    forwarder: &Forwarder,
  ) -> Result<SendResult> {
    let item = self.item(item_id, 0)?;
    let raw = item
      .request_text
      .as_deref()
      .filter(|t| !t.is_empty())
      .ok_or(Error::NotFound(item_id))?;
    let mut parsed = mutate(raw, spec, item_id);
    let scheme = if item.url.as_deref().unwrap_or("").starts_with("https") {
      "https"
    } else {
      "http"
    };
    let host = parsed
      .headers
      .remove("host")
      .filter(|h| !h.is_empty())
      .unwrap_or_else(|| item.hostname().to_string());
    let url = format!("{}://{}{}", scheme, host, parsed.path);
    debug!("repeating item {} as {} {}", item_id, parsed.method, url);
    let body = if parsed.body.is_empty() {
      None
    } else {
      Some(parsed.body.clone())
    };
    let mut result = forwarder.send(&parsed.method, &url, parsed.headers, body)?;
    result.item_id = Some(item_id);
    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn repeater_send_requires_some_payload() {
    let bridge = BridgeClient::new();
    let err = bridge.send_to_repeater(RepeaterSend::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
  }

  #[test]
  fn url_encodes_query_values() {
    let bridge = BridgeClient::new();
    let url = bridge.url("/scope", &[("url", "https://a.test/?q=1".to_string())]);
    assert_eq!(
      url,
      "http://127.0.0.1:8090/scope?url=https%3A%2F%2Fa%2Etest%2F%3Fq%3D1"
    );
  }
}
