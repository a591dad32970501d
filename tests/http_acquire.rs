//! HTTP transport acquisition against a mockito server.

use std::net::TcpListener;
use std::time::{Duration, Instant};

use krypton_boundary_orchestrator::client::AcquireError;
use krypton_boundary_orchestrator::health::ParseError;
use krypton_boundary_orchestrator::transport::TransportError;
use krypton_boundary_orchestrator::{Decision, HealthSnapshot, KryptonClient, KryptonConfig};
use mockito::{Mock, Server, ServerGuard};

fn health_mock(server: &mut ServerGuard, status: usize, body: &str) -> Mock {
    server
        .mock("GET", "/health")
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create()
}

fn client_for(server: &ServerGuard) -> KryptonClient {
    KryptonClient::new(KryptonConfig::http(format!("{}/health", server.url())))
}

#[test]
fn test_flat_response() {
    let mut server = Server::new();
    let mock = health_mock(
        &mut server,
        200,
        r#"{"samples":42,"mean":0.48,"variance":0.02,"jitter":0.003,"decision":"Kill"}"#,
    );

    let snapshot = client_for(&server).acquire();
    mock.assert();
    assert_eq!(
        snapshot,
        HealthSnapshot {
            samples: 42,
            mean: 0.48,
            variance: 0.02,
            jitter: 0.003,
            decision: Decision::Kill,
        }
    );
}

#[test]
fn test_enveloped_response_uses_nested_snapshot() {
    let mut server = Server::new();
    let _mock = health_mock(
        &mut server,
        200,
        r#"{"krypton": {"samples":5,"mean":0.1,"variance":0.0,"jitter":0.0,"decision":"Throttle"}, "status":"ok"}"#,
    );

    let snapshot = client_for(&server).try_acquire().unwrap();
    assert_eq!(snapshot.samples, 5);
    assert_eq!(snapshot.mean, 0.1);
    assert_eq!(snapshot.variance, 0.0);
    assert_eq!(snapshot.jitter, 0.0);
    assert_eq!(snapshot.decision, Decision::Throttle);
}

#[test]
fn test_server_error_falls_back_to_stub() {
    let mut server = Server::new();
    let _mock = health_mock(&mut server, 503, r#"{"decision":"Kill"}"#);
    let client = client_for(&server);

    assert!(matches!(
        client.try_acquire(),
        Err(AcquireError::Transport(TransportError::Status { status: 503, .. }))
    ));
    assert_eq!(client.acquire(), HealthSnapshot::STUB);
}

#[test]
fn test_non_object_body_falls_back_to_stub() {
    let mut server = Server::new();
    let _mock = health_mock(&mut server, 200, r#"["Keep"]"#);
    let client = client_for(&server);

    assert!(matches!(
        client.try_acquire(),
        Err(AcquireError::Parse(ParseError::NotAnObject(_)))
    ));
    assert_eq!(client.acquire(), HealthSnapshot::STUB);
}

#[test]
fn test_malformed_body_falls_back_to_stub() {
    let mut server = Server::new();
    let _mock = health_mock(&mut server, 200, "<html>gateway booting</html>");
    let client = client_for(&server);

    assert!(matches!(
        client.try_acquire(),
        Err(AcquireError::Parse(ParseError::Json(_)))
    ));
    assert_eq!(client.acquire(), HealthSnapshot::STUB);
}

#[test]
fn test_unknown_nested_decision_falls_back_to_stub() {
    let mut server = Server::new();
    let _mock = health_mock(
        &mut server,
        200,
        r#"{"status":"ok","krypton":{"samples":9,"decision":"Unknown"}}"#,
    );
    let client = client_for(&server);

    assert!(matches!(
        client.try_acquire(),
        Err(AcquireError::Parse(ParseError::UnknownDecision(_)))
    ));
    assert_eq!(client.acquire(), HealthSnapshot::STUB);
}

#[test]
fn test_connection_refused_falls_back_to_stub() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = KryptonClient::new(KryptonConfig::http(format!(
        "http://127.0.0.1:{port}/health"
    )));

    assert!(matches!(
        client.try_acquire(),
        Err(AcquireError::Transport(TransportError::Http(_)))
    ));
    assert_eq!(client.acquire(), HealthSnapshot::STUB);
}

#[test]
fn test_silent_server_times_out_to_stub() {
    // Accepted by the kernel backlog but never answered.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let client = KryptonClient::new(KryptonConfig::http(format!(
        "http://127.0.0.1:{port}/health"
    )));

    let started = Instant::now();
    let snapshot = client.acquire();
    let elapsed = started.elapsed();

    assert_eq!(snapshot, HealthSnapshot::STUB);
    assert!(elapsed >= Duration::from_millis(900), "returned after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
    drop(listener);
}

#[test]
fn test_each_acquire_issues_one_request() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/health")
        .with_status(200)
        .with_body(r#"{"decision":"Keep"}"#)
        .expect(2)
        .create();
    let client = client_for(&server);

    client.acquire();
    client.acquire();
    mock.assert();
}
