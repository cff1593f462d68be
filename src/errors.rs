//! error taxonomy
use std::io::ErrorKind;
use thiserror::Error as ThisError;
/// A `Result` alias where the `Err` case is `recaster::Error`.
pub type Result<T> = std::result::Result<T, Error>;
/// The errors that may occur while talking to the capture bridge or the
/// forwarding endpoint.
///
/// Failures are reported as data and never swallowed; the crate performs no
/// internal retries, so every variant is retryable by the caller.
#[derive(ThisError, Debug)]
pub enum Error {
  /// The configured endpoint is unreachable.
  #[error("cannot connect to {endpoint}: {source} (is the capture bridge running?)")]
  Connect {
    /// the endpoint that refused the connection
    endpoint: String,
    /// underlying socket error
    source: std::io::Error,
  },
  /// A non-2xx response from the bridge or the forwarding endpoint.
  #[error("HTTP {status}: {body}")]
  Status {
    /// response status code
    status: u16,
    /// response body, verbatim
    body: String,
  },
  /// The requested item has no retrievable request text.
  #[error("no request text for item {0}")]
  NotFound(i64),
  /// The caller omitted a required input.
  #[error("{0}")]
  InvalidInput(String),
  /// tls Error
  #[error(transparent)]
  Tls(#[from] native_tls::Error),
  /// Error
  #[error(transparent)]
  IO(#[from] std::io::Error),
  /// http::Error
  #[error(transparent)]
  Http(http::Error),
  /// serde_json::Error
  #[error(transparent)]
  Json(#[from] serde_json::Error),
  /// Unknown Error
  #[error("{0}")]
  Other(String),
}

impl From<http::Error> for Error {
  fn from(value: http::Error) -> Self {
    Error::Http(value)
  }
}

impl From<http::uri::InvalidUri> for Error {
  fn from(value: http::uri::InvalidUri) -> Self {
    Error::Http(http::Error::from(value))
  }
}

impl From<http::status::InvalidStatusCode> for Error {
  fn from(value: http::status::InvalidStatusCode) -> Self {
    Error::Http(http::Error::from(value))
  }
}

impl From<http::method::InvalidMethod> for Error {
  fn from(value: http::method::InvalidMethod) -> Self {
    Error::Http(http::Error::from(value))
  }
}

pub(crate) fn new_io_error(error_kind: ErrorKind, msg: &str) -> Error {
  Error::IO(std::io::Error::new(error_kind, msg))
}

pub(crate) fn other<E: Into<Box<dyn std::error::Error + Send + Sync>>>(e: E) -> Error {
  Error::Other(e.into().to_string())
}
