use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

use native_tls::TlsStream;

/// Socket
///
/// A single established connection, plain or TLS, used for exactly one
/// exchange (plus any CONNECT handshake that preceded it).
#[derive(Debug)]
pub struct Socket {
  inner: MaybeTlsStream,
}

/// A stream that may or may not be TLS-wrapped.
#[derive(Debug)]
pub enum MaybeTlsStream {
  /// TCP
  Tcp(TcpStream),
  /// TLS
  Tls(TlsStream<TcpStream>),
}

impl Socket {
  pub(crate) fn new(inner: MaybeTlsStream) -> Self {
    Socket { inner }
  }
  pub(crate) fn into_inner(self) -> MaybeTlsStream {
    self.inner
  }
  /// Address of the remote peer.
  pub fn peer_addr(&self) -> std::io::Result<SocketAddr> {
    self.tcp_ref().peer_addr()
  }
  /// Local address of the connection.
  pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
    self.tcp_ref().local_addr()
  }
  /// Shuts down both halves of the underlying stream.
  pub fn shutdown(&self) -> std::io::Result<()> {
    self.tcp_ref().shutdown(Shutdown::Both)
  }
  fn tcp_ref(&self) -> &TcpStream {
    match &self.inner {
      MaybeTlsStream::Tcp(s) => s,
      MaybeTlsStream::Tls(t) => t.get_ref(),
    }
  }
}

impl Read for Socket {
  fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
    match &mut self.inner {
      MaybeTlsStream::Tcp(s) => s.read(buf),
      MaybeTlsStream::Tls(s) => s.read(buf),
    }
  }
}

impl Write for Socket {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    match &mut self.inner {
      MaybeTlsStream::Tcp(s) => s.write(buf),
      MaybeTlsStream::Tls(s) => s.write(buf),
    }
  }

  fn flush(&mut self) -> std::io::Result<()> {
    match &mut self.inner {
      MaybeTlsStream::Tcp(s) => s.flush(),
      MaybeTlsStream::Tls(s) => s.flush(),
    }
  }
}
