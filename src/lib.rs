#![deny(missing_docs)]
//! # recaster
//!
//! The `recaster` crate is a client for HTTP traffic captured by an
//! intercepting proxy: it searches the capture history through a local
//! bridge API and resends captured requests, optionally mutated, through
//! the proxy's forwarding listener.
//!
//! - Search history with composable [`QueryCriteria`]
//! - Parse, mutate and rebuild raw requests ([`codec`], [`MutationSpec`])
//! - Replay through the proxy with [`BridgeClient::repeat`]
//! - Raw sends via [`Forwarder`] (no redirects, no certificate checks)
//!
//! ## Searching history
//!
//! ```rust,no_run
//! # fn run() -> Result<(), recaster::Error> {
//! use recaster::{BridgeClient, QueryCriteria};
//!
//! let bridge = BridgeClient::new();
//! let mut criteria = QueryCriteria::new();
//! criteria.search = Some("password".to_string());
//! let items = bridge.history(&criteria)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Repeating a captured request
//!
//! ```rust,no_run
//! # fn run() -> Result<(), recaster::Error> {
//! use recaster::{BridgeClient, Forwarder, MutationSpec};
//!
//! let bridge = BridgeClient::new();
//! let forwarder = Forwarder::new("http://127.0.0.1:8080")?.max_body(4000);
//! let spec = MutationSpec::new()
//!   .replace("role=user", "role=admin")
//!   .header("X-Forwarded-For", "127.0.0.1");
//! let outcome = bridge.repeat(42, &spec, &forwarder)?;
//! println!("{} -> {}", outcome.url, outcome.status_code);
//! # Ok(())
//! # }
//! ```
//!
//! Every operation is a synchronous, single exchange: no shared state, no
//! internal retries, timeouts surface as connectivity errors. Automated
//! callers that want failures as data instead of `Err` can go through
//! [`tools::Tools`].
mod body;
mod bridge;
mod client;
pub mod codec;
mod connector;
mod errors;
mod forward;
mod headers;
mod mutation;
mod proxy;
pub mod query;
pub mod record;
/// Redirect Handling
pub mod redirect;
mod request;
mod response;
mod socket;
pub mod tools;

pub use body::Body;
pub use bridge::{BridgeClient, BridgeConfig, Health, RepeaterAck, RepeaterSend, ScopeCheck};
pub use client::{Client, ClientBuilder};
pub use codec::ParsedRequest;
pub use connector::{Connector, ConnectorBuilder};
pub use errors::{Error, Result};
pub use forward::{Forwarder, SendResult};
pub use headers::HeaderBlock;
pub use http::Method;
pub use http::{StatusCode, Version};
pub use mutation::{mutate, MutationSpec, PROVENANCE_HEADER};
pub use proxy::Proxy;
pub use query::{Field, Order, QueryCriteria, SearchScope};
pub use record::{Tool, TrafficItem};
pub use request::{Request, RequestBuilder};
pub use response::{Response, ResponseBuilder, ResponseConfig};
pub use socket::Socket;

pub(crate) const CR_LF: &[u8] = &[13, 10];
pub(crate) const SPACE: &[u8] = &[32];
pub(crate) const COLON_SPACE: &[u8] = &[58, 32];
