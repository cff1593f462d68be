//! mutation engine
use crate::codec::{self, ParsedRequest};

/// Name of the provenance header tagging tool-originated traffic.
///
/// The capture layer strips it before forwarding and records its value on
/// the item, which lets replays be filtered apart from organic traffic.
pub const PROVENANCE_HEADER: &str = "X-Recast-Tag";

/// Headers the transmission layer recomputes; stale captured values would
/// corrupt the outbound message.
const AUTO_HEADERS: [&str; 2] = ["content-length", "transfer-encoding"];

/// Requested changes to a captured request before it is resent.
#[derive(Debug, Default, Clone)]
pub struct MutationSpec {
  /// Ordered `(old, new)` literal substitutions, applied to the raw text
  /// before parsing. Each pair is a whole-text non-overlapping replace;
  /// later pairs run over the output of earlier ones, so overlapping
  /// substitutions are order-dependent.
  pub replacements: Vec<(String, String)>,
  /// Header overrides applied to the parsed structure: insert if absent,
  /// overwrite case-insensitively if present.
  pub headers: Vec<(String, String)>,
  /// Replaces the body outright when set.
  pub body: Option<String>,
}

impl MutationSpec {
  /// An empty spec; [`mutate`] with it only strips auto-managed headers
  /// and tags provenance.
  pub fn new() -> MutationSpec {
    MutationSpec::default()
  }
  /// Adds a text substitution pair.
  pub fn replace<O: Into<String>, N: Into<String>>(mut self, old: O, new: N) -> MutationSpec {
    self.replacements.push((old.into(), new.into()));
    self
  }
  /// Adds a header override.
  pub fn header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> MutationSpec {
    self.headers.push((name.into(), value.into()));
    self
  }
  /// Sets a full body replacement.
  pub fn body<B: Into<String>>(mut self, body: B) -> MutationSpec {
    self.body = Some(body.into());
    self
  }
}

/// Apply `spec` to raw request text and return the mutated structure.
///
/// Substitutions run over the raw text in listed order, then the text is
/// parsed, `content-length`/`transfer-encoding` are stripped, header
/// overrides and the optional body replacement are applied, and finally a
/// provenance marker naming `item_id` is injected.
pub fn mutate(raw: &str, spec: &MutationSpec, item_id: i64) -> ParsedRequest {
  let mut text = raw.to_string();
  for (old, new) in &spec.replacements {
    text = text.replace(old.as_str(), new.as_str());
  }
  let mut req = codec::parse(&text);
  for name in AUTO_HEADERS {
    req.headers.remove(name);
  }
  for (name, value) in &spec.headers {
    req.headers.set(name.clone(), value.clone());
  }
  if let Some(body) = &spec.body {
    req.body = body.clone();
  }
  req.headers.set(PROVENANCE_HEADER, format!("replay:{}", item_id));
  req
}

#[cfg(test)]
mod tests {
  use super::*;

  const RAW: &str =
    "POST /login HTTP/1.1\nHost: a.test\nContent-Length: 9\nAuthorization: Bearer old\n\nuser=bob";

  #[test]
  fn empty_spec_strips_auto_headers_and_tags_provenance() {
    let req = mutate(RAW, &MutationSpec::new(), 7);
    assert_eq!(req.headers.get("content-length"), None);
    assert_eq!(req.headers.get("transfer-encoding"), None);
    assert_eq!(req.headers.get(PROVENANCE_HEADER), Some("replay:7"));
    assert_eq!(req.body, "user=bob");
  }

  #[test]
  fn replacements_apply_in_order_on_raw_text() {
    let spec = MutationSpec::new()
      .replace("Bearer old", "Bearer mid")
      .replace("Bearer mid", "Bearer new");
    let req = mutate(RAW, &spec, 1);
    assert_eq!(req.headers.get("authorization"), Some("Bearer new"));
  }

  #[test]
  fn header_override_is_case_insensitive() {
    let raw = "GET / HTTP/1.1\ncontent-type: text/plain\n\n";
    let spec = MutationSpec::new().header("Content-Type", "application/json");
    let req = mutate(raw, &spec, 1);
    let matches: Vec<_> = req
      .headers
      .iter()
      .filter(|(k, _)| k.eq_ignore_ascii_case("content-type"))
      .collect();
    assert_eq!(matches, vec![("content-type", "application/json")]);
  }

  #[test]
  fn body_replacement_wins_over_survived_body() {
    let spec = MutationSpec::new().body("user=alice");
    let req = mutate(RAW, &spec, 7);
    assert_eq!(req.body, "user=alice");
    assert_eq!(req.headers.get("content-length"), None);
  }

  #[test]
  fn substitution_can_rewrite_the_request_line() {
    let spec = MutationSpec::new().replace("/login", "/admin/login");
    let req = mutate(RAW, &spec, 2);
    assert_eq!(req.path, "/admin/login");
  }
}
