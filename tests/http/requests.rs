use super::{client_for, quick};
use callguard_http::header::{HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use callguard_http::{HttpClientConfig, Method, RequestOptions, ResilientHttpClient, StatusCode};
use serde::Serialize;
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Serialize)]
struct NewCompany<'a> {
    name: &'a str,
    employees: u32,
}

#[tokio::test]
async fn get_returns_status_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies/7"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-request-id", "abc")
                .set_body_json(json!({ "id": 7, "name": "Acme" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, quick());
    let response = client
        .get("/companies/7", RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "abc");
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body, json!({ "id": 7, "name": "Acme" }));
}

#[tokio::test]
async fn json_verbs_send_serialized_body() {
    let server = MockServer::start().await;
    for verb in ["POST", "PUT", "PATCH"] {
        Mock::given(method(verb))
            .and(path("/companies"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "name": "Acme", "employees": 12 })))
            .respond_with(ResponseTemplate::new(201).set_body_string(verb))
            .mount(&server)
            .await;
    }

    let client = client_for(&server, quick());
    let body = NewCompany {
        name: "Acme",
        employees: 12,
    };

    let post = client
        .post("/companies", &body, RequestOptions::new())
        .await
        .unwrap();
    let put = client
        .put("/companies", &body, RequestOptions::new())
        .await
        .unwrap();
    let patch = client
        .patch("/companies", &body, RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(post.status(), StatusCode::CREATED);
    assert_eq!(post.text(), "POST");
    assert_eq!(put.text(), "PUT");
    assert_eq!(patch.text(), "PATCH");
}

#[tokio::test]
async fn delete_and_raw_requests() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/companies/7"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string("raw bytes"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let client = client_for(&server, quick());

    let deleted = client
        .delete("/companies/7", RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    assert!(deleted.body().is_empty());

    let uploaded = client
        .request(
            Method::POST,
            "/upload",
            Some(bytes::Bytes::from_static(b"raw bytes")),
            RequestOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(uploaded.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn call_headers_override_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("x-tenant", "globex"))
        .and(header("authorization", "Bearer token"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = ResilientHttpClient::new(
        HttpClientConfig::builder()
            .base_url(server.uri())
            .default_header(
                HeaderName::from_static("x-tenant"),
                HeaderValue::from_static("acme"),
            )
            .default_header(
                HeaderName::from_static("authorization"),
                HeaderValue::from_static("Bearer token"),
            )
            .resilience(quick())
            .build(),
    )
    .unwrap();

    let response = client
        .get(
            "/me",
            RequestOptions::new().header(
                HeaderName::from_static("x-tenant"),
                HeaderValue::from_static("globex"),
            ),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn explicit_content_type_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .and(header("content-type", "application/vnd.events+json"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server, quick());
    let response = client
        .post(
            "/events",
            &json!({ "kind": "signup" }),
            RequestOptions::new()
                .header(CONTENT_TYPE, HeaderValue::from_static("application/vnd.events+json"))
                .header(ACCEPT, HeaderValue::from_static("application/json")),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn absolute_urls_bypass_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let client = ResilientHttpClient::new(
        HttpClientConfig::builder()
            .base_url("http://unreachable.invalid/api")
            .resilience(quick())
            .build(),
    )
    .unwrap();

    let url = format!("{}/health", server.uri());
    let response = client.get(&url, RequestOptions::new()).await.unwrap();

    assert_eq!(response.text(), "ok");
    assert_eq!(client.operation_metrics(&format!("GET {url}")).successes, 1);
}

#[tokio::test]
async fn operation_names() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server, quick());
    client.get("/users", RequestOptions::new()).await.unwrap();
    client.get("/users", RequestOptions::new()).await.unwrap();
    client
        .get("/users/1", RequestOptions::new().operation_name("user-lookup"))
        .await
        .unwrap();

    let metrics = client.metrics();
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics["GET /users"].successes, 2);
    assert_eq!(metrics["user-lookup"].successes, 1);
    assert!(!metrics.contains_key("GET /users/1"));
}
