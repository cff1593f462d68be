//! captured traffic records
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Originating tool of a captured item, assigned by the capture layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tool {
  /// intercepting proxy listener
  Proxy,
  /// manual request editor
  Repeater,
  /// automated scanner
  Scanner,
  /// payload fuzzer
  Intruder,
  /// other extensions
  Extension,
}

impl Tool {
  /// Wire name of the tool tag.
  pub fn as_str(&self) -> &'static str {
    match self {
      Tool::Proxy => "PROXY",
      Tool::Repeater => "REPEATER",
      Tool::Scanner => "SCANNER",
      Tool::Intruder => "INTRUDER",
      Tool::Extension => "EXTENSION",
    }
  }
}

impl fmt::Display for Tool {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Tool {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_uppercase().as_str() {
      "PROXY" => Ok(Tool::Proxy),
      "REPEATER" => Ok(Tool::Repeater),
      "SCANNER" => Ok(Tool::Scanner),
      "INTRUDER" => Ok(Tool::Intruder),
      "EXTENSION" => Ok(Tool::Extension),
      other => Err(format!("unknown tool: {}", other)),
    }
  }
}

/// A captured traffic record, owned by the bridge and read-only here.
///
/// Every attribute other than `id` is `Option` because the bridge's field
/// projection may omit any of them from a listing.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficItem {
  /// unique identifier assigned by the bridge
  pub id: i64,
  /// originating tool tag
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tool: Option<Tool>,
  /// ISO-8601 capture time, opaque to this crate
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timestamp: Option<String>,
  /// full URL
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  /// hostname only
  #[serde(skip_serializing_if = "Option::is_none")]
  pub host: Option<String>,
  /// port number
  #[serde(skip_serializing_if = "Option::is_none")]
  pub port: Option<u16>,
  /// whether the exchange was TLS
  #[serde(skip_serializing_if = "Option::is_none")]
  pub https: Option<bool>,
  /// HTTP method token
  #[serde(skip_serializing_if = "Option::is_none")]
  pub method: Option<String>,
  /// path and query
  #[serde(skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,
  /// response status code
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status_code: Option<u16>,
  /// raw request size in bytes
  #[serde(skip_serializing_if = "Option::is_none")]
  pub request_length: Option<u64>,
  /// raw response size in bytes
  #[serde(skip_serializing_if = "Option::is_none")]
  pub response_length: Option<u64>,
  /// decoded raw request text
  #[serde(skip_serializing_if = "Option::is_none")]
  pub request_text: Option<String>,
  /// decoded raw response text
  #[serde(skip_serializing_if = "Option::is_none")]
  pub response_text: Option<String>,
  /// provenance tag, present only on tool-originated requests
  #[serde(skip_serializing_if = "Option::is_none")]
  pub agent_tag: Option<String>,
}

impl TrafficItem {
  /// Hostname of the item, falling back to the recorded URL's authority.
  pub fn hostname(&self) -> &str {
    if let Some(host) = self.host.as_deref() {
      if !host.is_empty() {
        return host;
      }
    }
    let url = self.url.as_deref().unwrap_or("");
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let authority = rest.split('/').next().unwrap_or("");
    authority.split(':').next().unwrap_or("")
  }

  /// Path and query of the item, derived from the URL when unset.
  pub fn path_and_query(&self) -> &str {
    if let Some(path) = self.path.as_deref() {
      if !path.is_empty() {
        return path;
      }
    }
    let url = self.url.as_deref().unwrap_or("");
    match url.split_once("://") {
      Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or("/"),
      None => "/",
    }
  }

  /// File extension of the URL path, lower-cased; empty when none.
  ///
  /// The extension is the substring after the last `.` of the final path
  /// segment, before any query string.
  pub fn url_extension(&self) -> String {
    let path = self.path_and_query();
    let path = path.split('?').next().unwrap_or("");
    let file = path.rsplit('/').next().unwrap_or("");
    match file.rsplit_once('.') {
      Some((_, ext)) if !ext.is_empty() => ext.to_ascii_lowercase(),
      _ => String::new(),
    }
  }

  /// Declared `Content-Type` of the response, lower-cased; empty if absent.
  pub fn content_type(&self) -> String {
    let raw = self.response_text.as_deref().unwrap_or("");
    for line in message_head(raw).lines() {
      let lower = line.to_ascii_lowercase();
      if let Some(value) = lower.strip_prefix("content-type:") {
        return value.trim().to_string();
      }
    }
    String::new()
  }

  /// URL of the item, rebuilt from host/port/scheme when not recorded.
  pub fn full_url(&self) -> String {
    if let Some(url) = self.url.as_deref() {
      if !url.is_empty() {
        return url.to_string();
      }
    }
    let https = self.https.unwrap_or(false);
    let scheme = if https { "https" } else { "http" };
    let port = self.port.unwrap_or(0);
    let default_port = (https && port == 443) || (!https && port == 80) || port == 0;
    let port_str = if default_port {
      String::new()
    } else {
      format!(":{}", port)
    };
    format!("{}://{}{}{}", scheme, self.hostname(), port_str, self.path_and_query())
  }
}

/// Header portion of raw message text: everything before the first blank
/// line, with line endings normalized.
pub(crate) fn message_head(raw: &str) -> String {
  let text = raw.replace("\r\n", "\n").replace('\r', "\n");
  match text.split_once("\n\n") {
    Some((head, _)) => head.to_string(),
    None => text,
  }
}

/// Body portion of raw message text; empty when there is no separator.
pub(crate) fn message_body(raw: &str) -> String {
  let text = raw.replace("\r\n", "\n").replace('\r', "\n");
  match text.split_once("\n\n") {
    Some((_, body)) => body.to_string(),
    None => String::new(),
  }
}

/// Truncate `text` to `limit` characters, appending a marker naming the
/// exact omitted count. `limit == 0` means unlimited.
///
/// # Examples
///
/// ```rust
/// let out = recaster::record::truncate_text("abcdefghijklmnopqrstuvwxy", 10);
/// assert_eq!(out, "abcdefghij\n[... 15 chars omitted]");
/// ```
pub fn truncate_text(text: &str, limit: usize) -> String {
  let total = text.chars().count();
  if limit == 0 || total <= limit {
    return text.to_string();
  }
  let kept: String = text.chars().take(limit).collect();
  format!("{}\n[... {} chars omitted]", kept, total - limit)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(path: &str) -> TrafficItem {
    TrafficItem {
      id: 1,
      path: Some(path.to_string()),
      ..TrafficItem::default()
    }
  }

  #[test]
  fn url_extension_ignores_query_string() {
    assert_eq!(item("/app.js?v=2").url_extension(), "js");
    assert_eq!(item("/app.jsx").url_extension(), "jsx");
    assert_eq!(item("/api/users").url_extension(), "");
    assert_eq!(item("/archive.tar.GZ").url_extension(), "gz");
    assert_eq!(item("/trailing.").url_extension(), "");
  }

  #[test]
  fn content_type_reads_response_head_only() {
    let mut it = item("/");
    it.response_text = Some(
      "HTTP/1.1 200 OK\r\nContent-Type: Application/JSON; charset=utf-8\r\n\r\nContent-Type: nope"
        .to_string(),
    );
    assert_eq!(it.content_type(), "application/json; charset=utf-8");
  }

  #[test]
  fn full_url_omits_default_ports() {
    let mut it = item("/x");
    it.host = Some("a.test".to_string());
    it.port = Some(443);
    it.https = Some(true);
    assert_eq!(it.full_url(), "https://a.test/x");
    it.port = Some(8443);
    assert_eq!(it.full_url(), "https://a.test:8443/x");
  }

  #[test]
  fn truncate_marker_counts_omitted_chars() {
    let body = "abcdefghijklmnopqrstuvwxy"; // 25 chars
    assert_eq!(truncate_text(body, 10), "abcdefghij\n[... 15 chars omitted]");
    assert_eq!(truncate_text(body, 0), body);
    assert_eq!(truncate_text(body, 25), body);
  }

  #[test]
  fn hostname_falls_back_to_url() {
    let mut it = TrafficItem::default();
    it.url = Some("https://api.test:8443/v1".to_string());
    assert_eq!(it.hostname(), "api.test");
  }
}
