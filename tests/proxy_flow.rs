//! End-to-end request flow through a running proxy.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;

use viaduct::config::{InterceptorConfig, OriginConfig, ProxyConfig, RouteConfig};
use viaduct::engine::Engine;

mod common;

fn proxy_config(origins: Vec<(&str, SocketAddr)>, path_prefix: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    for (name, addr) in origins {
        config.origins.push(OriginConfig {
            name: name.into(),
            group: "web".into(),
            address: addr.to_string(),
        });
    }
    config.routes.push(RouteConfig {
        name: "r1".into(),
        host: None,
        path_prefix: Some(path_prefix.into()),
        headers: Default::default(),
        origin_group: "web".into(),
        priority: 0,
    });
    config.health_check.enabled = false;
    config
}

async fn start_proxy(config: ProxyConfig) -> (std::sync::Arc<Engine>, SocketAddr) {
    let (engine, _events) = Engine::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    engine.start(listener).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    (engine, addr)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_proxies_request_to_origin() {
    let origin = common::start_mock_origin("hello from origin").await;
    let (engine, proxy) = start_proxy(proxy_config(vec![("o1", origin)], "/")).await;

    let res = client()
        .get(format!("http://{}/anything", proxy))
        .send()
        .await
        .expect("proxy unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "hello from origin");

    engine.stop().await;
}

#[tokio::test]
async fn test_request_headers_and_path_reach_origin() {
    // The origin echoes its received request head back as the body.
    let origin = common::start_programmable_origin(|head| async move { (200, head) }).await;

    let mut config = proxy_config(vec![("o1", origin)], "/");
    config.interceptors.push(InterceptorConfig::RequestId);
    let (engine, proxy) = start_proxy(config).await;

    let res = client()
        .get(format!("http://{}/api/v1/items?page=2", proxy))
        .header("x-test-marker", "abc123")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let request_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let head = res.text().await.unwrap();

    assert!(head.starts_with("GET /api/v1/items?page=2 HTTP/1.1"));
    assert!(head.contains("x-test-marker"));
    assert!(head.contains("abc123"));
    // The request id interceptor tags the outbound request and echoes it
    // on the response.
    assert!(head.contains("x-request-id"));
    assert!(request_id.is_some());

    engine.stop().await;
}

#[tokio::test]
async fn test_no_matching_route_is_404() {
    let origin = common::start_mock_origin("never reached").await;
    let (engine, proxy) = start_proxy(proxy_config(vec![("o1", origin)], "/api")).await;

    let res = client()
        .get(format!("http://{}/other", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);

    engine.stop().await;
}

#[tokio::test]
async fn test_origin_error_status_passes_through() {
    // A well-formed 503 from the origin is a response, not a transport
    // failure; it must come back verbatim without retrying.
    let origin =
        common::start_programmable_origin(|_| async { (503, "origin says no".into()) }).await;
    let (engine, proxy) = start_proxy(proxy_config(vec![("o1", origin)], "/")).await;

    let res = client()
        .get(format!("http://{}/x", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 503);
    assert_eq!(res.text().await.unwrap(), "origin says no");

    engine.stop().await;
}

#[tokio::test]
async fn test_post_body_reaches_origin() {
    let origin = common::start_programmable_origin(|head| async move { (200, head) }).await;
    let (engine, proxy) = start_proxy(proxy_config(vec![("o1", origin)], "/")).await;

    let res = client()
        .post(format!("http://{}/submit", proxy))
        .body("payload-bytes")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let head = res.text().await.unwrap();
    assert!(head.starts_with("POST /submit HTTP/1.1"));
    assert!(head.contains("content-length"));

    engine.stop().await;
}
