use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use native_tls::TlsConnector;

use crate::errors::{other, Result};
use crate::proxy::{Proxy, ProxyConnect};
use crate::socket::{MaybeTlsStream, Socket};

/// ConnectorBuilder
#[derive(Clone)]
pub struct ConnectorBuilder {
  hostname_verification: bool,
  certs_verification: bool,
  read_timeout: Option<Duration>,
  write_timeout: Option<Duration>,
  connect_timeout: Option<Duration>,
  nodelay: bool,
  proxy: Option<Proxy>,
}

impl Default for ConnectorBuilder {
  fn default() -> Self {
    Self {
      hostname_verification: true,
      certs_verification: true,
      read_timeout: Some(Duration::from_secs(30)),
      write_timeout: Some(Duration::from_secs(30)),
      connect_timeout: Some(Duration::from_secs(10)),
      nodelay: false,
      proxy: None,
    }
  }
}

impl ConnectorBuilder {
  /// Controls the use of hostname verification.
  ///
  /// # Warning
  ///
  /// You should think very carefully before using this method. If invalid
  /// hostnames are trusted, *any* valid certificate for *any* site will be
  /// trusted for use.
  pub fn hostname_verification(mut self, value: bool) -> ConnectorBuilder {
    self.hostname_verification = value;
    self
  }
  /// Controls the use of certificate validation.
  ///
  /// # Warning
  ///
  /// You should think very carefully before using this method. If invalid
  /// certificates are trusted, *any* certificate for *any* site will be
  /// trusted for use. This includes expired certificates.
  pub fn certs_verification(mut self, value: bool) -> ConnectorBuilder {
    self.certs_verification = value;
    self
  }
  /// Set that all sockets have `SO_NODELAY` set to the supplied value.
  ///
  /// Default is `false`.
  pub fn nodelay(mut self, value: bool) -> ConnectorBuilder {
    self.nodelay = value;
    self
  }
  /// Enables a read timeout, applied per read operation.
  ///
  /// Default is 30 seconds.
  pub fn read_timeout(mut self, timeout: Option<Duration>) -> ConnectorBuilder {
    self.read_timeout = timeout;
    self
  }
  /// Enables a write timeout, applied per write operation.
  ///
  /// Default is 30 seconds.
  pub fn write_timeout(mut self, timeout: Option<Duration>) -> ConnectorBuilder {
    self.write_timeout = timeout;
    self
  }
  /// Set a timeout for only the connect phase.
  ///
  /// Default is 10 seconds.
  pub fn connect_timeout(mut self, timeout: Option<Duration>) -> ConnectorBuilder {
    self.connect_timeout = timeout;
    self
  }
  /// Route every connection through the given proxy.
  pub fn proxy(mut self, proxy: Option<Proxy>) -> ConnectorBuilder {
    self.proxy = proxy;
    self
  }
  /// Combine the configuration of this builder into a `Connector`.
  pub fn build(&self) -> Result<Connector> {
    let mut tls = TlsConnector::builder();
    tls
      .danger_accept_invalid_certs(!self.certs_verification)
      .danger_accept_invalid_hostnames(!self.hostname_verification);
    Ok(Connector {
      connect_timeout: self.connect_timeout,
      read_timeout: self.read_timeout,
      write_timeout: self.write_timeout,
      nodelay: self.nodelay,
      proxy: self.proxy.clone(),
      tls: tls.build()?,
    })
  }
}

/// Connector
///
/// Establishes sockets towards targets, applying the configured timeouts,
/// proxy and TLS policy.
#[derive(Debug)]
pub struct Connector {
  connect_timeout: Option<Duration>,
  read_timeout: Option<Duration>,
  write_timeout: Option<Duration>,
  nodelay: bool,
  proxy: Option<Proxy>,
  tls: TlsConnector,
}

impl Connector {
  /// Connect to a remote endpoint by address.
  pub fn connect_with_addr<S: Into<SocketAddr>>(&self, addr: S) -> Result<Socket> {
    let addr = addr.into();
    let stream = match self.connect_timeout {
      None => TcpStream::connect(addr)?,
      Some(timeout) => TcpStream::connect_timeout(&addr, timeout)?,
    };
    stream.set_read_timeout(self.read_timeout)?;
    stream.set_write_timeout(self.write_timeout)?;
    if self.nodelay {
      stream.set_nodelay(true)?;
    }
    Ok(Socket::new(MaybeTlsStream::Tcp(stream)))
  }
  /// Connect to a remote endpoint by URI, through the proxy when set.
  pub fn connect_with_uri(&self, target: &http::Uri) -> Result<Socket> {
    ProxyConnect::new(target, &self.proxy).establish(self)
  }
  /// Wraps an established socket in TLS towards `domain`.
  pub fn upgrade_to_tls(&self, socket: Socket, domain: &str) -> Result<Socket> {
    match socket.into_inner() {
      MaybeTlsStream::Tcp(stream) => {
        let tls = self
          .tls
          .connect(domain, stream)
          .map_err(|e| other(e.to_string()))?;
        Ok(Socket::new(MaybeTlsStream::Tls(tls)))
      }
      tls @ MaybeTlsStream::Tls(_) => Ok(Socket::new(tls)),
    }
  }
  pub(crate) fn proxy(&self) -> &Option<Proxy> {
    &self.proxy
  }
}
