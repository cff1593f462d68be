//! structured results for automated callers
//!
//! An agent-facing registration layer binds operations by name and cannot
//! branch on `Result`; it needs failures as data. Every method here
//! returns a `serde_json::Value` that is either the operation's payload
//! or an object with a single `error` field.
use serde::Serialize;
use serde_json::{json, Value};

use crate::bridge::{BridgeClient, RepeaterSend};
use crate::forward::Forwarder;
use crate::headers::HeaderBlock;
use crate::mutation::MutationSpec;
use crate::query::QueryCriteria;
use crate::Result;

/// URL extensions excluded from searches by default, so listings are not
/// dominated by static assets.
pub const DEFAULT_EXT_EXCLUDE: &str =
  "js,css,png,gif,ico,woff,woff2,ttf,eot,svg,map,jpg,jpeg,webp,mp4,mp3,pdf";

fn data_or_error<T: Serialize>(result: Result<T>) -> Value {
  match result {
    Ok(value) => serde_json::to_value(value)
      .unwrap_or_else(|err| json!({ "error": err.to_string() })),
    Err(err) => json!({ "error": err.to_string() }),
  }
}

/// The crate's operations as data-in, data-out calls.
#[derive(Clone)]
pub struct Tools {
  bridge: BridgeClient,
}

impl Tools {
  /// Wraps a bridge client.
  pub fn new(bridge: BridgeClient) -> Tools {
    Tools { bridge }
  }

  /// Liveness of the capture bridge.
  pub fn health(&self) -> Value {
    data_or_error(self.bridge.health())
  }

  /// Unique captured hostnames.
  pub fn hosts(&self) -> Value {
    data_or_error(self.bridge.hosts())
  }

  /// Search the capture history.
  pub fn search(&self, criteria: &QueryCriteria) -> Value {
    data_or_error(self.bridge.history(criteria))
  }

  /// Full request and response of one item.
  pub fn get_item(&self, item_id: i64, max_body: u32) -> Value {
    data_or_error(self.bridge.item(item_id, max_body))
  }

  /// The most recent manual-editor send.
  pub fn repeater_latest(&self, max_body: u32) -> Value {
    data_or_error(self.bridge.repeater_latest(max_body))
  }

  /// Open a captured item or raw payload in the manual editor.
  pub fn send_to_repeater(&self, send: RepeaterSend) -> Value {
    data_or_error(self.bridge.send_to_repeater(send))
  }

  /// Fetch, mutate and resend a captured request.
  pub fn repeat(&self, item_id: i64, spec: &MutationSpec, forwarder: &Forwarder) -> Value {
    data_or_error(self.bridge.repeat(item_id, spec, forwarder))
  }

  /// Send an arbitrary request through the forwarding endpoint.
  pub fn send(
    &self,
    method: &str,
    url: &str,
    headers: HeaderBlock,
    body: Option<String>,
    forwarder: &Forwarder,
  ) -> Value {
    data_or_error(forwarder.send(method, url, headers, body))
  }

  /// Whether a URL is inside the target scope.
  pub fn scope(&self, url: &str) -> Value {
    data_or_error(self.bridge.scope(url))
  }
}
