mod common;

use common::{json_response, serve};
use recaster::redirect::Policy;
use recaster::{Client, Error};

#[test]
fn get_parses_status_headers_and_body() {
  let (endpoint, server) = serve(1, |_| {
    "HTTP/1.1 200 OK\r\nX-Check: yes\r\nContent-Length: 5\r\n\r\nhello".to_string()
  });
  let client = Client::new();
  let uri: http::Uri = format!("{}/path?q=1", endpoint).parse().unwrap();
  let response = client.get(uri).send().unwrap();
  assert_eq!(response.status_code(), http::StatusCode::OK);
  assert_eq!(response.headers().get("x-check"), Some("yes"));
  assert_eq!(response.text(), "hello");

  let seen = server.join().unwrap();
  assert!(seen[0].starts_with("GET /path?q=1 HTTP/1.1\r\n"));
  assert!(seen[0].contains("Host: 127.0.0.1"));
}

#[test]
fn default_policy_follows_redirects() {
  let (endpoint, server) = serve(2, |request| {
    if request.starts_with("GET /next ") {
      json_response("{}")
    } else {
      "HTTP/1.1 302 Found\r\nLocation: /next\r\nContent-Length: 0\r\n\r\n".to_string()
    }
  });
  let client = Client::new();
  let uri: http::Uri = format!("{}/start", endpoint).parse().unwrap();
  let response = client.get(uri).send().unwrap();
  assert_eq!(response.status_code(), http::StatusCode::OK);

  let seen = server.join().unwrap();
  assert!(seen[0].starts_with("GET /start "));
  assert!(seen[1].starts_with("GET /next "));
}

#[test]
fn policy_none_observes_the_first_response() {
  let (endpoint, server) = serve(1, |_| {
    "HTTP/1.1 302 Found\r\nLocation: /elsewhere\r\nContent-Length: 0\r\n\r\n".to_string()
  });
  let client = Client::builder().redirect(Policy::none()).build().unwrap();
  let uri: http::Uri = format!("{}/start", endpoint).parse().unwrap();
  let response = client.get(uri).send().unwrap();
  assert_eq!(response.status_code(), http::StatusCode::FOUND);
  assert_eq!(response.headers().get("location"), Some("/elsewhere"));
  server.join().unwrap();
}

#[test]
fn connection_refused_is_a_connect_error_naming_the_target() {
  let client = Client::new();
  let uri: http::Uri = "http://127.0.0.1:9/x".parse().unwrap();
  let err = client.get(uri).send().unwrap_err();
  match err {
    Error::Connect { endpoint, .. } => assert!(endpoint.contains("127.0.0.1:9")),
    other => panic!("expected Connect, got: {:?}", other),
  }
}

#[test]
fn post_sends_body_with_computed_content_length() {
  let (endpoint, server) = serve(1, |_| json_response("{}"));
  let client = Client::new();
  let uri: http::Uri = format!("{}/submit", endpoint).parse().unwrap();
  client.post(uri).body("k=v&x=y").send().unwrap();

  let seen = server.join().unwrap();
  assert!(seen[0].starts_with("POST /submit "));
  assert!(seen[0].contains("Content-Length: 7\r\n"));
  assert!(seen[0].ends_with("\r\n\r\nk=v&x=y"));
}
