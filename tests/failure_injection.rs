//! Failure injection against a running proxy.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;

use viaduct::config::{OriginConfig, ProxyConfig, RouteConfig};
use viaduct::engine::Engine;

mod common;

fn proxy_config(origins: Vec<(&str, SocketAddr)>) -> ProxyConfig {
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
        path_prefix: Some("/".into()),
        headers: Default::default(),
        origin_group: "web".into(),
        priority: 0,
    });
    config.health_check.enabled = false;
    config.retries.base_delay_ms = 1;
    config.retries.max_delay_ms = 5;
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

/// An address nothing is listening on: bind, capture, drop.
async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

#[tokio::test]
async fn test_failover_to_healthy_origin() {
    let dead = dead_addr().await;
    let alive = common::start_mock_origin("from b").await;

    let mut config = proxy_config(vec![("a", dead), ("b", alive)]);
    config.retries.max_retries = 2;
    config.health_check.unhealthy_threshold = 100; // keep both selectable
    let (engine, proxy) = start_proxy(config).await;

    // Whichever origin round-robin picks first, every request must land
    // on the live one.
    for _ in 0..6 {
        let res = client()
            .get(format!("http://{}/x", proxy))
            .send()
            .await
            .expect("proxy unreachable");
        assert_eq!(res.status(), 200);
        assert_eq!(res.text().await.unwrap(), "from b");
    }

    engine.stop().await;
}

#[tokio::test]
async fn test_all_origins_down_is_bad_gateway() {
    let dead = dead_addr().await;

    let mut config = proxy_config(vec![("a", dead)]);
    config.retries.max_retries = 1;
    config.health_check.unhealthy_threshold = 100;
    let (engine, proxy) = start_proxy(config).await;

    let res = client()
        .get(format!("http://{}/x", proxy))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);

    engine.stop().await;
}

#[tokio::test]
async fn test_pool_exhaustion_is_service_unavailable() {
    // One slow origin, a pool of one, and a short acquire deadline: the
    // second concurrent request must fail fast with 503, not queue.
    let slow = common::start_programmable_origin(|_| async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        (200, "slow".into())
    })
    .await;

    let mut config = proxy_config(vec![("a", slow)]);
    config.pool.max_per_origin = 1;
    config.pool.max_idle = 1;
    config.pool.acquire_timeout_ms = 50;
    config.retries.max_retries = 0;
    let (engine, proxy) = start_proxy(config).await;

    let c = client();
    let url = format!("http://{}/x", proxy);

    let first = {
        let c = c.clone();
        let url = url.clone();
        tokio::spawn(async move { c.get(&url).send().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let second = c.get(&url).send().await.unwrap();
    assert_eq!(second.status(), 503);

    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status(), 200);

    engine.stop().await;
}

#[tokio::test]
async fn test_origin_marked_unhealthy_after_threshold() {
    let dead = dead_addr().await;
    let alive = common::start_mock_origin("from b").await;

    let mut config = proxy_config(vec![("a", dead), ("b", alive)]);
    config.retries.max_retries = 2;
    config.health_check.unhealthy_threshold = 1;
    let (engine, proxy) = start_proxy(config).await;

    // First request trips the dead origin to unhealthy (threshold 1);
    // afterwards it is excluded from selection entirely.
    for _ in 0..10 {
        let res = client()
            .get(format!("http://{}/x", proxy))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.text().await.unwrap(), "from b");
    }

    engine.stop().await;
}
