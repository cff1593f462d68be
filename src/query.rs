//! history query model
use std::fmt;
use std::str::FromStr;

use crate::record::{message_body, message_head, TrafficItem, Tool};

/// Sort order over capture time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Order {
  /// oldest first
  Asc,
  /// newest first
  #[default]
  Desc,
}

/// Named part of a captured exchange that a text search may be
/// restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
  /// request line and headers plus body
  Request,
  /// request line and headers only
  RequestHeaders,
  /// request body only
  RequestBody,
  /// response line and headers plus body
  Response,
  /// response line and headers only
  ResponseHeaders,
  /// response body only
  ResponseBody,
}

impl SearchScope {
  /// Wire name of the scope.
  pub fn as_str(&self) -> &'static str {
    match self {
      SearchScope::Request => "request",
      SearchScope::RequestHeaders => "request_headers",
      SearchScope::RequestBody => "request_body",
      SearchScope::Response => "response",
      SearchScope::ResponseHeaders => "response_headers",
      SearchScope::ResponseBody => "response_body",
    }
  }
}

impl FromStr for SearchScope {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "request" => Ok(SearchScope::Request),
      "request_headers" => Ok(SearchScope::RequestHeaders),
      "request_body" => Ok(SearchScope::RequestBody),
      "response" => Ok(SearchScope::Response),
      "response_headers" => Ok(SearchScope::ResponseHeaders),
      "response_body" => Ok(SearchScope::ResponseBody),
      other => Err(format!("unknown search scope: {}", other)),
    }
  }
}

impl fmt::Display for SearchScope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Field names the bridge can project a result down to.
///
/// Omitting the projection yields the default set
/// {id, tool, timestamp, url, method, status_code}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Field {
  Id,
  Tool,
  Timestamp,
  Url,
  Host,
  Port,
  Https,
  Method,
  Path,
  StatusCode,
  RequestLength,
  ResponseLength,
  RequestText,
  ResponseText,
  AgentTag,
}

impl Field {
  /// Wire name of the field.
  pub fn as_str(&self) -> &'static str {
    match self {
      Field::Id => "id",
      Field::Tool => "tool",
      Field::Timestamp => "timestamp",
      Field::Url => "url",
      Field::Host => "host",
      Field::Port => "port",
      Field::Https => "https",
      Field::Method => "method",
      Field::Path => "path",
      Field::StatusCode => "status_code",
      Field::RequestLength => "request_length",
      Field::ResponseLength => "response_length",
      Field::RequestText => "request_text",
      Field::ResponseText => "response_text",
      Field::AgentTag => "agent_tag",
    }
  }
}

impl FromStr for Field {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "id" => Ok(Field::Id),
      "tool" => Ok(Field::Tool),
      "timestamp" => Ok(Field::Timestamp),
      "url" => Ok(Field::Url),
      "host" => Ok(Field::Host),
      "port" => Ok(Field::Port),
      "https" => Ok(Field::Https),
      "method" => Ok(Field::Method),
      "path" => Ok(Field::Path),
      "status_code" => Ok(Field::StatusCode),
      "request_length" => Ok(Field::RequestLength),
      "response_length" => Ok(Field::ResponseLength),
      "request_text" => Ok(Field::RequestText),
      "response_text" => Ok(Field::ResponseText),
      "agent_tag" => Ok(Field::AgentTag),
      other => Err(format!("unknown field: {}", other)),
    }
  }
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Filter criteria over the capture history.
///
/// [`to_params`](QueryCriteria::to_params) renders the wire form for the
/// bridge; [`matches`](QueryCriteria::matches) and
/// [`apply`](QueryCriteria::apply) are the canonical composition semantics
/// the bridge is expected to honor, usable locally on fetched items.
#[derive(Debug, Default, Clone)]
pub struct QueryCriteria {
  /// case-insensitive substring match on the hostname
  pub host: Option<String>,
  /// exact, case-sensitive match on the method token
  pub method: Option<String>,
  /// decimal prefix match on the status code, e.g. `"4"` for all 4xx
  pub status: Option<String>,
  /// case-insensitive search text
  pub search: Option<String>,
  /// parts the search is restricted to; empty searches everything
  pub search_in: Vec<SearchScope>,
  /// originating tool filter
  pub tool: Option<Tool>,
  /// URL file extensions to exclude, compared case-insensitively
  pub ext_exclude: Vec<String>,
  /// substring match on the response's declared content type
  pub mime: Option<String>,
  /// sort order, newest first by default
  pub order: Order,
  /// caps the result count after all filters
  pub limit: Option<u32>,
  /// skips that many matching results before the limit applies
  pub offset: u32,
  /// field projection; empty yields the default field set
  pub fields: Vec<Field>,
  /// truncates `*_text` fields to this many characters, 0 = unlimited
  pub max_body: u32,
  /// restricts results to items carrying a provenance tag
  pub agent_only: bool,
}

impl QueryCriteria {
  /// Criteria matching everything, newest first.
  pub fn new() -> QueryCriteria {
    QueryCriteria::default()
  }

  /// Renders the canonical parameter set for the bridge's history
  /// endpoints. Unset criteria are omitted.
  pub fn to_params(&self) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(host) = &self.host {
      params.push(("host", host.clone()));
    }
    if let Some(method) = &self.method {
      params.push(("method", method.clone()));
    }
    if let Some(status) = &self.status {
      params.push(("status", status.clone()));
    }
    if let Some(search) = &self.search {
      params.push(("search", search.clone()));
    }
    if !self.search_in.is_empty() {
      let csv: Vec<&str> = self.search_in.iter().map(|s| s.as_str()).collect();
      params.push(("search_in", csv.join(",")));
    }
    if let Some(tool) = self.tool {
      params.push(("tool", tool.as_str().to_string()));
    }
    if !self.ext_exclude.is_empty() {
      params.push(("ext_exclude", self.ext_exclude.join(",")));
    }
    if let Some(mime) = &self.mime {
      params.push(("mime", mime.clone()));
    }
    if self.order == Order::Asc {
      params.push(("order", "asc".to_string()));
    }
    if let Some(limit) = self.limit {
      params.push(("limit", limit.to_string()));
    }
    if self.offset > 0 {
      params.push(("offset", self.offset.to_string()));
    }
    if !self.fields.is_empty() {
      let csv: Vec<&str> = self.fields.iter().map(|f| f.as_str()).collect();
      params.push(("fields", csv.join(",")));
    }
    if self.max_body > 0 {
      params.push(("max_body", self.max_body.to_string()));
    }
    if self.agent_only {
      params.push(("agent", "true".to_string()));
    }
    params
  }

  /// Whether a single item passes every configured filter.
  ///
  /// Operates on unprojected records; pagination and ordering belong to
  /// [`apply`](QueryCriteria::apply).
  pub fn matches(&self, item: &TrafficItem) -> bool {
    if self.agent_only && item.agent_tag.is_none() {
      return false;
    }
    if let Some(host) = &self.host {
      let hostname = item.hostname().to_ascii_lowercase();
      if !hostname.contains(&host.to_ascii_lowercase()) {
        return false;
      }
    }
    if let Some(method) = &self.method {
      if item.method.as_deref() != Some(method.as_str()) {
        return false;
      }
    }
    if let Some(status) = &self.status {
      let code = item.status_code.unwrap_or(0).to_string();
      if !code.starts_with(status.as_str()) {
        return false;
      }
    }
    if let Some(tool) = self.tool {
      if item.tool != Some(tool) {
        return false;
      }
    }
    if !self.ext_exclude.is_empty() {
      let ext = item.url_extension();
      if !ext.is_empty() && self.ext_exclude.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
        return false;
      }
    }
    if let Some(mime) = &self.mime {
      if !item.content_type().contains(&mime.to_ascii_lowercase()) {
        return false;
      }
    }
    if let Some(search) = &self.search {
      if !search_hit(item, search, &self.search_in) {
        return false;
      }
    }
    true
  }

  /// Applies the full query semantics over a slice of items: capture-order
  /// sort per [`Order`], all filters, then offset and limit.
  pub fn apply<'a>(&self, items: &'a [TrafficItem]) -> Vec<&'a TrafficItem> {
    let mut ordered: Vec<&TrafficItem> = items.iter().collect();
    ordered.sort_by_key(|i| i.id);
    if self.order == Order::Desc {
      ordered.reverse();
    }
    ordered
      .into_iter()
      .filter(|i| self.matches(i))
      .skip(self.offset as usize)
      .take(self.limit.map(|l| l as usize).unwrap_or(usize::MAX))
      .collect()
  }
}

/// Case-insensitive scoped text search over an item.
///
/// An empty scope set searches everything the record exposes: hostname,
/// path and both raw message texts.
fn search_hit(item: &TrafficItem, search: &str, scopes: &[SearchScope]) -> bool {
  let needle = search.to_lowercase();
  if scopes.is_empty() {
    return item.hostname().to_lowercase().contains(&needle)
      || item.path_and_query().to_lowercase().contains(&needle)
      || contains(item.request_text.as_deref(), &needle)
      || contains(item.response_text.as_deref(), &needle);
  }
  scopes.iter().any(|scope| {
    let part = match scope {
      SearchScope::Request => item.request_text.clone().unwrap_or_default(),
      SearchScope::RequestHeaders => message_head(item.request_text.as_deref().unwrap_or("")),
      SearchScope::RequestBody => message_body(item.request_text.as_deref().unwrap_or("")),
      SearchScope::Response => item.response_text.clone().unwrap_or_default(),
      SearchScope::ResponseHeaders => message_head(item.response_text.as_deref().unwrap_or("")),
      SearchScope::ResponseBody => message_body(item.response_text.as_deref().unwrap_or("")),
    };
    part.to_lowercase().contains(&needle)
  })
}

fn contains(text: Option<&str>, needle: &str) -> bool {
  text.map(|t| t.to_lowercase().contains(needle)).unwrap_or(false)
}
