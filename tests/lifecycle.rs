//! Engine lifecycle against a live listener.

use std::time::Duration;

use tokio::net::TcpListener;

use viaduct::config::{OriginConfig, ProxyConfig, RouteConfig};
use viaduct::engine::Engine;

mod common;

fn proxy_config(origin: std::net::SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.origins.push(OriginConfig {
        name: "o1".into(),
        group: "web".into(),
        address: origin.to_string(),
    });
    config.routes.push(RouteConfig {
        name: "r1".into(),
        host: None,
        path_prefix: Some("/".into()),
        headers: Default::default(),
        origin_group: "web".into(),
        priority: 0,
    });
    config.health_check.enabled = false;
    config
}

#[tokio::test]
async fn test_stop_closes_listener() {
    let origin = common::start_mock_origin("ok").await;
    let (engine, _events) = Engine::new(proxy_config(origin)).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy = listener.local_addr().unwrap();
    engine.start(listener).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();

    let res = client
        .get(format!("http://{}/x", proxy))
        .send()
        .await
        .expect("proxy should serve before stop");
    assert_eq!(res.status(), 200);

    engine.stop().await;

    // The listener is closed once stop returns; new connections fail.
    let after = client
        .get(format!("http://{}/x", proxy))
        .timeout(Duration::from_millis(500))
        .send()
        .await;
    assert!(after.is_err());
}

#[tokio::test]
async fn test_stop_is_idempotent_across_tasks() {
    let origin = common::start_mock_origin("ok").await;
    let (engine, _events) = Engine::new(proxy_config(origin)).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    engine.start(listener).await.unwrap();

    let e1 = engine.clone();
    let e2 = engine.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { e1.stop().await }),
        tokio::spawn(async move { e2.stop().await }),
    );
    a.unwrap();
    b.unwrap();
    assert!(engine.is_stopped());
}
