//! Status endpoint tests: one live server, all three render formats.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;

use upcheck::check::CheckOutcome;
use upcheck::registry::PeerId;
use upcheck::status::{self, AppState};
use upcheck::{Engine, Monitor, Shutdown, UpcheckConfig};

/// Two peers in one pool; the first is marked up by hand so every
/// format has both states to render.
async fn start_status_server() -> (SocketAddr, Shutdown, tokio::task::JoinHandle<()>) {
    let config: UpcheckConfig = toml::from_str(
        r#"
[[upstreams]]
name = "web"
servers = ["127.0.0.1:8081", "127.0.0.1:8082"]
check = "type=http interval=30000 timeout=1000 rise=1 fall=5"
"#,
    )
    .unwrap();

    let engine = Engine::build(&config).unwrap();
    let up = engine.registry.get(PeerId(0)).clone();
    engine.store.apply(
        &up,
        &CheckOutcome {
            peer: up.id,
            success: true,
            latency: Duration::from_millis(3),
            detail: "status 200".to_string(),
        },
    );

    let monitor = Monitor::new(engine);
    let state = AppState {
        engine: monitor.shared(),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = tokio::spawn(async move {
        let _ = status::serve_on(listener, "/status", state, rx).await;
    });

    (addr, shutdown, server)
}

#[tokio::test]
async fn test_html_report() {
    let (addr, shutdown, server) = start_status_server().await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .get(format!("http://{addr}/status"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let body = res.text().await.unwrap();
    assert!(body.contains("<title>Upstream Check Status</title>"));
    assert!(body.contains("check upstream server number: 2, generation: 1, up: 1, down: 1"));
    assert!(body.contains("<td>127.0.0.1:8081</td>"));
    assert!(body.contains("<td>up</td>"));
    assert!(body.contains("<td>down</td>"));

    shutdown.trigger();
    let _ = server.await;
}

#[tokio::test]
async fn test_json_report() {
    let (addr, shutdown, server) = start_status_server().await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let body: serde_json::Value = client
        .get(format!("http://{addr}/status?format=json"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["generation"], 1);
    assert_eq!(body["total"], 2);
    assert_eq!(body["up"], 1);
    assert_eq!(body["down"], 1);

    let peers = body["peers"].as_array().unwrap();
    assert_eq!(peers.len(), 2);
    assert_eq!(peers[0]["name"], "127.0.0.1:8081");
    assert_eq!(peers[0]["status"], "up");
    assert_eq!(peers[0]["check_type"], "http");
    assert_eq!(peers[1]["status"], "down");
    assert!(peers[1]["last_check_ms"].is_null());

    shutdown.trigger();
    let _ = server.await;
}

#[tokio::test]
async fn test_csv_report() {
    let (addr, shutdown, server) = start_status_server().await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .get(format!("http://{addr}/status?format=csv"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/csv"));

    let body = res.text().await.unwrap();
    let mut lines = body.lines();
    assert_eq!(
        lines.next().unwrap(),
        "index,upstream,name,status,rise,fall,check_type,last_check_ms"
    );
    assert_eq!(lines.clone().count(), 2);
    assert!(lines.next().unwrap().starts_with("0,web,127.0.0.1:8081,up,"));

    shutdown.trigger();
    let _ = server.await;
}

#[tokio::test]
async fn test_unknown_format_is_rejected() {
    let (addr, shutdown, server) = start_status_server().await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .get(format!("http://{addr}/status?format=xml"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    assert_eq!(res.text().await.unwrap(), "unknown format \"xml\"");

    shutdown.trigger();
    let _ = server.await;
}
