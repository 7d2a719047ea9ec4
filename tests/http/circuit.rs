use super::{client_for, quick, request_count};
use callguard_core::FailureKind;
use callguard_executor::{CircuitBreakerConfig, CircuitState, Preset, ResilienceConfig};
use callguard_http::{HttpClientConfig, RequestOptions, ResilientHttpClient};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn breaker(threshold: u32) -> ResilienceConfig {
    ResilienceConfig {
        max_retries: 0,
        circuit_breaker: CircuitBreakerConfig::builder()
            .failure_threshold(threshold)
            .reset_timeout(Duration::from_secs(60))
            .build(),
        ..quick()
    }
}

#[tokio::test]
async fn open_circuit_stops_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server, breaker(2));
    for _ in 0..2 {
        let err = client.get("/reports", RequestOptions::new()).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::HttpStatus);
    }
    assert_eq!(client.circuit_state("GET /reports"), CircuitState::Open);

    let err = client.get("/reports", RequestOptions::new()).await.unwrap_err();

    assert!(err.is_circuit_open());
    assert_eq!(err.kind(), FailureKind::CircuitOpen);
    assert_eq!(err.status(), None);
    assert!(!err.is_retryable());
    assert_eq!(request_count(&server).await, 2);
    assert_eq!(client.operation_metrics("GET /reports").failures, 2);
}

#[tokio::test]
async fn endpoints_have_independent_circuits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fine"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server, breaker(1));
    let _ = client.get("/broken", RequestOptions::new()).await;

    assert_eq!(client.circuit_state("GET /broken"), CircuitState::Open);
    client.get("/fine", RequestOptions::new()).await.unwrap();
    assert_eq!(client.circuit_state("GET /fine"), CircuitState::Closed);
}

#[tokio::test]
async fn reset_circuit_allows_requests_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server, breaker(1));
    let _ = client.get("/jobs", RequestOptions::new()).await;
    assert!(client
        .get("/jobs", RequestOptions::new())
        .await
        .unwrap_err()
        .is_circuit_open());

    client.reset_circuit("GET /jobs");

    client.get("/jobs", RequestOptions::new()).await.unwrap();
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn preset_configures_the_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    // Query disables the breaker; a zero retry budget keeps the test fast.
    let client = ResilientHttpClient::new(
        HttpClientConfig::builder()
            .base_url(server.uri())
            .preset(Preset::Query)
            .resilience_overrides(callguard_executor::ResilienceOverrides::new().max_retries(0))
            .build(),
    )
    .unwrap();
    assert!(!client.resilience().circuit_breaker.enabled);

    for _ in 0..10 {
        let err = client.get("/search", RequestOptions::new()).await.unwrap_err();
        assert!(!err.is_circuit_open());
    }
    assert_eq!(request_count(&server).await, 10);
}

#[tokio::test]
async fn clients_sharing_an_executor_share_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let executor = callguard_executor::ResilienceExecutor::new(breaker(1));
    let config = || {
        HttpClientConfig::builder()
            .base_url(server.uri())
            .resilience(breaker(1))
            .build()
    };
    let a = ResilientHttpClient::with_executor(config(), executor.clone()).unwrap();
    let b = ResilientHttpClient::with_executor(config(), executor).unwrap();

    let _ = a.get("/shared", RequestOptions::new()).await;

    assert!(b
        .get("/shared", RequestOptions::new())
        .await
        .unwrap_err()
        .is_circuit_open());
    assert_eq!(b.operation_metrics("GET /shared").failures, 1);
}
