mod common;

use std::time::Duration;

use common::{json_response, serve, serve_proxy};
use recaster::{BridgeClient, BridgeConfig, Error, Forwarder, HeaderBlock, MutationSpec};

fn bridge_for(endpoint: &str) -> BridgeClient {
  BridgeClient::with_config(BridgeConfig {
    endpoint: endpoint.to_string(),
    timeout: Duration::from_secs(5),
  })
  .unwrap()
}

#[test]
fn repeat_mutates_and_resends_through_the_proxy() {
  let (store, store_server) = serve(1, |_| {
    json_response(
      "{\"id\":7,\"tool\":\"PROXY\",\"url\":\"http://a.test/login\",\"host\":\"a.test\",\
       \"request_text\":\"POST /login HTTP/1.1\\nHost: a.test\\nContent-Length: 9\\n\\nuser=bob\"}",
    )
  });
  let (proxy, proxy_server) = serve_proxy("HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok");

  let bridge = bridge_for(&store);
  let forwarder = Forwarder::with_timeout(proxy.as_str(), Duration::from_secs(5)).unwrap();
  let spec = MutationSpec::new().body("user=alice");
  let result = bridge.repeat(7, &spec, &forwarder).unwrap();

  assert_eq!(result.status_code, 200);
  assert_eq!(result.body, "ok");
  assert_eq!(result.item_id, Some(7));
  assert_eq!(result.url, "http://a.test/login");
  assert_eq!(result.method, "POST");

  let store_seen = store_server.join().unwrap();
  assert!(store_seen[0].starts_with("GET /proxy/history/7 HTTP/1.1\r\n"));

  let tunneled = proxy_server.join().unwrap();
  assert!(tunneled.starts_with("POST /login HTTP/1.1\r\n"));
  assert!(tunneled.contains("Host: a.test\r\n"));
  assert!(tunneled.contains("Content-Length: 10\r\n"));
  assert!(!tunneled.contains("Content-Length: 9"));
  assert!(tunneled.contains("X-Recast-Tag: replay:7\r\n"));
  assert!(tunneled.ends_with("\r\n\r\nuser=alice"));
}

#[test]
fn repeat_without_request_text_is_not_found() {
  let (store, _server) = serve(1, |_| json_response("{\"id\":7}"));
  let (proxy, proxy_server) = serve_proxy("HTTP/1.1 200 OK\r\n\r\n");
  let bridge = bridge_for(&store);
  let forwarder = Forwarder::with_timeout(proxy.as_str(), Duration::from_secs(5)).unwrap();
  let err = bridge.repeat(7, &MutationSpec::new(), &forwarder).unwrap_err();
  assert!(matches!(err, Error::NotFound(7)));
  drop(proxy_server); // the proxy never sees a connection
}

#[test]
fn raw_send_defaults_the_provenance_header_and_truncates() {
  let (proxy, proxy_server) = serve_proxy(
    "HTTP/1.1 200 OK\r\nContent-Length: 25\r\n\r\nabcdefghijklmnopqrstuvwxy",
  );
  let forwarder = Forwarder::with_timeout(proxy.as_str(), Duration::from_secs(5))
    .unwrap()
    .max_body(10);
  let result = forwarder
    .send("get", "http://a.test/big", HeaderBlock::new(), None)
    .unwrap();

  assert_eq!(result.method, "GET");
  assert_eq!(result.status_code, 200);
  assert_eq!(result.body, "abcdefghij\n[... 15 chars omitted]");

  let tunneled = proxy_server.join().unwrap();
  assert!(tunneled.starts_with("GET /big HTTP/1.1\r\n"));
  assert!(tunneled.contains("X-Recast-Tag: send\r\n"));
}

#[test]
fn forwarder_never_follows_redirects() {
  let (proxy, proxy_server) = serve_proxy(
    "HTTP/1.1 302 Found\r\nLocation: http://b.test/\r\nContent-Length: 0\r\n\r\n",
  );
  let forwarder = Forwarder::with_timeout(proxy.as_str(), Duration::from_secs(5)).unwrap();
  let result = forwarder
    .send("GET", "http://a.test/start", HeaderBlock::new(), None)
    .unwrap();
  assert_eq!(result.status_code, 302);
  let location = result
    .headers
    .iter()
    .find(|(name, _)| name.eq_ignore_ascii_case("location"))
    .map(|(_, value)| value.as_str());
  assert_eq!(location, Some("http://b.test/"));
  proxy_server.join().unwrap();
}

#[test]
fn repeat_applies_replacements_and_header_overrides() {
  let (store, _store_server) = serve(1, |_| {
    json_response(
      "{\"id\":12,\"url\":\"http://a.test/api\",\"host\":\"a.test\",\
       \"request_text\":\"GET /api HTTP/1.1\\nHost: a.test\\nAuthorization: Bearer old_token\\n\\n\"}",
    )
  });
  let (proxy, proxy_server) = serve_proxy("HTTP/1.1 204 No Content\r\nContent-Length: 0\r\n\r\n");

  let bridge = bridge_for(&store);
  let forwarder = Forwarder::with_timeout(proxy.as_str(), Duration::from_secs(5)).unwrap();
  let spec = MutationSpec::new()
    .replace("Bearer old_token", "Bearer new_token")
    .header("X-Forwarded-For", "127.0.0.1");
  let result = bridge.repeat(12, &spec, &forwarder).unwrap();
  assert_eq!(result.status_code, 204);

  let tunneled = proxy_server.join().unwrap();
  assert!(tunneled.contains("Authorization: Bearer new_token\r\n"));
  assert!(tunneled.contains("X-Forwarded-For: 127.0.0.1\r\n"));
  assert!(tunneled.contains("X-Recast-Tag: replay:12\r\n"));
}
