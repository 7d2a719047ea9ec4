//! HTTP client metrics regression tests

use super::helpers::*;
use callguard_executor::ResilienceConfig;
use callguard_http::{HttpClientConfig, RequestOptions, ResilientHttpClient};
use serial_test::serial;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
#[serial]
async fn http_client_metrics_exist() {
    init_recorder();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = ResilientHttpClient::new(
        HttpClientConfig::builder()
            .base_url(server.uri())
            .resilience(ResilienceConfig::builder().max_retries(0).build())
            .build(),
    )
    .unwrap();

    client.get("/ok", RequestOptions::new()).await.unwrap();
    let _ = client.delete("/missing", RequestOptions::new()).await;

    assert_counter_exists("http_client_requests_total");
    assert_metric_has_label("http_client_requests_total", "method", "GET");
    assert_metric_has_label("http_client_requests_total", "method", "DELETE");
    assert_metric_has_label("http_client_requests_total", "outcome", "success");
    assert_metric_has_label("http_client_requests_total", "outcome", "http_status");

    // Executor metrics are keyed by the derived operation name.
    assert_metric_has_label("executor_calls_total", "operation", "GET /ok");
    assert_metric_has_label("executor_calls_total", "operation", "DELETE /missing");
}
