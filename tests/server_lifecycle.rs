//! End-to-end: bind, serve over TCP, shut down.

use std::time::Duration;

use static_site_server::config::{loader, ServerConfig};
use static_site_server::http::HttpServer;
use static_site_server::lifecycle::{startup, Shutdown};

mod common;
use common::Site;

#[test]
fn port_environment_variable_selects_the_listener_port() {
    let mut config = ServerConfig::default();
    loader::apply_env_overrides(&mut config, |key| {
        (key == loader::PORT_ENV).then(|| "8080".to_string())
    })
    .unwrap();

    assert_eq!(config.listener.bind_address(), "0.0.0.0:8080");
    let addr = "0.0.0.0:8080".parse().unwrap();
    assert_eq!(
        startup::public_url(&config.listener.host, addr),
        "http://localhost:8080"
    );
}

#[test]
fn non_numeric_port_fails_loudly() {
    let mut config = ServerConfig::default();
    let err = loader::apply_env_overrides(&mut config, |_| Some("eighty".to_string()))
        .unwrap_err();
    assert!(err.to_string().contains("eighty"));
}

#[tokio::test]
async fn serves_over_tcp_until_shutdown() {
    let site = Site::new();
    let mut config = site.config();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;

    let server = HttpServer::new(config).unwrap();
    let listener = startup::bind(&server.config().listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .get(format!("http://{addr}/"))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["cache-control"], "no-cache");
    assert!(res.headers().contains_key("content-security-policy"));
    assert!(!res.headers().contains_key("content-encoding"));
    let etag = res.headers()["etag"].to_str().unwrap().to_string();
    assert_eq!(res.bytes().await.unwrap(), site.read("index.html"));

    let again = client.get(format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(again.headers()["etag"], etag.as_str());

    let not_modified = client
        .get(format!("http://{addr}/"))
        .header("if-none-match", &etag)
        .send()
        .await
        .unwrap();
    assert_eq!(not_modified.status(), 304);
    assert!(not_modified.bytes().await.unwrap().is_empty());

    let missing = client
        .get(format!("http://{addr}/nonexistent.xyz"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);

    drop(client);
    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
