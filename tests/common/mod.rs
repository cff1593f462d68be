//! loopback fixtures shared by the wire-level tests
#![allow(dead_code)]
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

/// Serves `count` connections on a loopback port, answering each request
/// with whatever `handler` returns for its raw text. Returns the base URL
/// and a handle yielding every request the server saw.
pub fn serve<F>(count: usize, handler: F) -> (String, JoinHandle<Vec<String>>)
where
  F: Fn(&str) -> String + Send + 'static,
{
  let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
  let addr = listener.local_addr().expect("local addr");
  let handle = thread::spawn(move || {
    let mut seen = Vec::new();
    for _ in 0..count {
      let (mut stream, _) = listener.accept().expect("accept");
      let request = read_request(&mut stream);
      let response = handler(&request);
      stream.write_all(response.as_bytes()).expect("write response");
      seen.push(request);
    }
    seen
  });
  (format!("http://{}", addr), handle)
}

/// A proxy listener: answers the CONNECT handshake, then serves one
/// tunneled exchange with `response`. Returns the proxy URL and a handle
/// yielding the tunneled request text.
pub fn serve_proxy(response: &'static str) -> (String, JoinHandle<String>) {
  let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
  let addr = listener.local_addr().expect("local addr");
  let handle = thread::spawn(move || {
    let (mut stream, _) = listener.accept().expect("accept");
    let connect = read_request(&mut stream);
    assert!(connect.starts_with("CONNECT "), "expected CONNECT, got: {}", connect);
    stream
      .write_all(b"HTTP/1.1 200 Connection Established\r\n\r\n")
      .expect("write connect reply");
    let tunneled = read_request(&mut stream);
    stream.write_all(response.as_bytes()).expect("write response");
    tunneled
  });
  (format!("http://{}", addr), handle)
}

/// Reads one request: head up to the blank line, then `Content-Length`
/// bytes of body. Byte-wise, so nothing beyond the message is consumed.
pub fn read_request(stream: &mut TcpStream) -> String {
  let mut raw: Vec<u8> = Vec::new();
  let mut byte = [0u8; 1];
  while !raw.ends_with(b"\r\n\r\n") {
    match stream.read(&mut byte) {
      Ok(0) => break,
      Ok(_) => raw.push(byte[0]),
      Err(err) => panic!("read request head: {}", err),
    }
  }
  let head = String::from_utf8_lossy(&raw).to_string();
  let content_length = head
    .lines()
    .find_map(|line| {
      let (name, value) = line.split_once(':')?;
      name
        .eq_ignore_ascii_case("content-length")
        .then(|| value.trim().parse::<usize>().ok())?
    })
    .unwrap_or(0);
  let mut body = vec![0u8; content_length];
  if content_length > 0 {
    stream.read_exact(&mut body).expect("read request body");
  }
  raw.extend(body);
  String::from_utf8_lossy(&raw).to_string()
}

/// A minimal JSON 200 response.
pub fn json_response(body: &str) -> String {
  format!(
    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
    body.len(),
    body
  )
}
