use std::io::{BufReader, Write};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, StatusCode};
use log::debug;

use crate::connector::{Connector, ConnectorBuilder};
use crate::errors::{Error, Result};
use crate::proxy::Proxy;
use crate::redirect::{Action, Policy};
use crate::request::RequestBuilder;
use crate::response::{ResponseBuilder, ResponseConfig};
use crate::{Request, Response};

/// A `Client` to make Requests with.
///
/// The Client has various configuration values to tweak, but the defaults
/// are set to what is usually the most commonly desired value. To
/// configure a `Client`, use `Client::builder()`.
///
/// # Examples
///
/// ```rust
/// use recaster::Client;
/// #
/// # fn run() -> Result<(), recaster::Error> {
/// let client = Client::new();
/// let resp = client.get("http://httpbin.org/".parse()?).send()?;
/// #   Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
  inner: ClientRef,
}

#[derive(Clone)]
struct ClientRef {
  connector: Arc<Connector>,
  redirect_policy: Policy,
}

impl Default for Client {
  fn default() -> Self {
    Self::new()
  }
}

impl Client {
  /// Constructs a new `Client` with default configuration.
  ///
  /// # Panics
  ///
  /// This method panics if the TLS backend cannot be initialized. Use
  /// `Client::builder()` to handle the failure as an `Error` instead.
  pub fn new() -> Client {
    ClientBuilder::new().build().expect("Client::new()")
  }
  /// Creates a `ClientBuilder` to configure a `Client`.
  ///
  /// This is the same as `ClientBuilder::new()`.
  pub fn builder() -> ClientBuilder {
    ClientBuilder::new()
  }
  /// Convenience method to make a `GET` request to a URL.
  pub fn get(&self, url: http::Uri) -> RequestBuilder {
    self.request(Method::GET, url)
  }
  /// Convenience method to make a `POST` request to a URL.
  pub fn post(&self, url: http::Uri) -> RequestBuilder {
    self.request(Method::POST, url)
  }
  /// Start building a `Request` with the `Method` and `Uri`.
  ///
  /// Returns a `RequestBuilder`, which will allow setting headers and
  /// the request body before sending.
  pub fn request(&self, method: Method, url: http::Uri) -> RequestBuilder {
    RequestBuilder::new(self.clone(), Request::new(method, url))
  }

  /// Performs one exchange on an established socket.
  fn execute_request(&self, socket: &mut crate::Socket, request: &Request) -> Result<Response> {
    let raw: Bytes = request.to_raw();
    debug!("> {} {} ({} bytes)", request.method(), request.uri(), raw.len());
    socket.write_all(&raw)?;
    socket.flush()?;
    let reader = BufReader::new(socket);
    let config = ResponseConfig::new(request.method().clone());
    let mut response = ResponseBuilder::new(reader, config).build()?;
    *response.url_mut() = request.uri().clone();
    debug!("< {} ({} bytes)", response.status_code(), response.body().map(|b| b.len()).unwrap_or(0));
    Ok(response)
  }

  /// Executes a `Request`.
  ///
  /// A connection is established per hop; the configured redirect policy
  /// decides whether a 3xx response is followed or returned as-is.
  ///
  /// # Errors
  ///
  /// Connection failures surface as [`Error::Connect`] naming the
  /// endpoint that was dialed (the proxy when one is configured).
  pub fn execute<R: Into<Request>>(&self, request: R) -> Result<Response> {
    let mut request = request.into();
    let mut cur_uri = request.uri().clone();
    let mut previous: Vec<http::Uri> = vec![];
    loop {
      let mut socket = self
        .inner
        .connector
        .connect_with_uri(&cur_uri)
        .map_err(|e| self.connect_error(&cur_uri, e))?;
      let response = self.execute_request(&mut socket, &request)?;
      let _ = socket.shutdown();
      let should_redirect = match response.status_code() {
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER => {
          match request.method() {
            &Method::GET | &Method::HEAD => {}
            _ => {
              *request.method_mut() = Method::GET;
              request.set_body(Vec::new());
              request.headers_mut().remove("content-length");
              request.headers_mut().remove("transfer-encoding");
            }
          }
          true
        }
        StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT => true,
        _ => false,
      };
      if should_redirect {
        if let Some(next) = next_location(&response, &cur_uri) {
          previous.push(cur_uri.clone());
          match self
            .inner
            .redirect_policy
            .check(response.status_code(), &next, previous.as_slice())
          {
            Action::Follow => {
              debug!("redirect -> {}", next);
              cur_uri = next;
              *request.uri_mut() = cur_uri.clone();
              continue;
            }
            Action::Stop => return Ok(response),
          }
        }
      }
      return Ok(response);
    }
  }

  fn connect_error(&self, target: &http::Uri, err: Error) -> Error {
    let endpoint = match self.inner.connector.proxy() {
      Some(proxy) => proxy.uri().to_string(),
      None => target.to_string(),
    };
    match err {
      Error::IO(source) => Error::Connect { endpoint, source },
      other => other,
    }
  }
}

/// Resolves the `Location` header against the current URI.
fn next_location(response: &Response, cur_uri: &http::Uri) -> Option<http::Uri> {
  let location = response.headers().get("location")?;
  if location.starts_with("http://") || location.starts_with("https://") {
    return http::Uri::from_str(location).ok();
  }
  let path = if location.starts_with('/') {
    location.to_string()
  } else {
    format!("/{}", location)
  };
  http::Uri::builder()
    .scheme(cur_uri.scheme_str().unwrap_or("http"))
    .authority(cur_uri.authority()?.as_str())
    .path_and_query(path)
    .build()
    .ok()
}

/// A `ClientBuilder` can be used to create a `Client` with custom
/// configuration.
///
/// # Example
///
/// ```
/// # fn run() -> Result<(), recaster::Error> {
/// use std::time::Duration;
///
/// let client = recaster::Client::builder()
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct ClientBuilder {
  config: Config,
}

struct Config {
  connect_timeout: Option<Duration>,
  timeout: Option<Duration>,
  nodelay: bool,
  proxy: Option<Proxy>,
  hostname_verification: bool,
  certs_verification: bool,
  redirect_policy: Policy,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      connect_timeout: Some(Duration::from_secs(10)),
      timeout: Some(Duration::from_secs(30)),
      nodelay: false,
      proxy: None,
      hostname_verification: true,
      certs_verification: true,
      redirect_policy: Policy::default(),
    }
  }
}

impl Default for ClientBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl ClientBuilder {
  /// Constructs a new `ClientBuilder`.
  ///
  /// This is the same as `Client::builder()`.
  pub fn new() -> ClientBuilder {
    ClientBuilder {
      config: Config::default(),
    }
  }
  /// Returns a `Client` that uses this `ClientBuilder` configuration.
  ///
  /// # Errors
  ///
  /// This method fails if the TLS backend cannot be initialized.
  pub fn build(self) -> Result<Client> {
    let config = self.config;
    let connector = ConnectorBuilder::default()
      .proxy(config.proxy)
      .nodelay(config.nodelay)
      .read_timeout(config.timeout)
      .write_timeout(config.timeout)
      .connect_timeout(config.connect_timeout)
      .hostname_verification(config.hostname_verification)
      .certs_verification(config.certs_verification)
      .build()?;
    Ok(Client {
      inner: ClientRef {
        connector: Arc::new(connector),
        redirect_policy: config.redirect_policy,
      },
    })
  }
  /// Set a `redirect::Policy` for this client.
  ///
  /// Default will follow redirects up to a maximum of 10.
  pub fn redirect(mut self, policy: Policy) -> ClientBuilder {
    self.config.redirect_policy = policy;
    self
  }
  /// Route requests through a `Proxy`.
  pub fn proxy(mut self, proxy: Proxy) -> ClientBuilder {
    self.config.proxy = Some(proxy);
    self
  }
  /// Set a timeout for read and write operations of a `Client`.
  ///
  /// Default is 30 seconds.
  pub fn timeout(mut self, timeout: Duration) -> ClientBuilder {
    self.config.timeout = Some(timeout);
    self
  }
  /// Set a timeout for only the connect phase of a `Client`.
  ///
  /// Default is 10 seconds.
  pub fn connect_timeout(mut self, timeout: Duration) -> ClientBuilder {
    self.config.connect_timeout = Some(timeout);
    self
  }
  /// Set whether sockets have `TCP_NODELAY` enabled.
  ///
  /// Default is `false`.
  pub fn tcp_nodelay(mut self, enabled: bool) -> ClientBuilder {
    self.config.nodelay = enabled;
    self
  }
  /// Controls the use of hostname verification.
  ///
  /// # Warning
  ///
  /// You should think very carefully before you use this method. If
  /// hostname verification is not used, any valid certificate for any
  /// site will be trusted for use from any other.
  pub fn danger_accept_invalid_hostnames(mut self, accept_invalid_hostname: bool) -> ClientBuilder {
    self.config.hostname_verification = !accept_invalid_hostname;
    self
  }
  /// Controls the use of certificate validation.
  ///
  /// # Warning
  ///
  /// You should think very carefully before using this method. If invalid
  /// certificates are trusted, *any* certificate for *any* site will be
  /// trusted for use, expired certificates included.
  pub fn danger_accept_invalid_certs(mut self, accept_invalid_certs: bool) -> ClientBuilder {
    self.config.certs_verification = !accept_invalid_certs;
    self
  }
}
