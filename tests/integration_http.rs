// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the HTTP shim using wiremock.
//!
//! - GET shortcut returns the body
//! - Full requests carry method, headers and body
//! - Error statuses come back as responses

use serde_json::Value;
use std::collections::BTreeMap;
use testbed_rs::http::{Request, http_get, send_request};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_http_get_returns_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Example Domain"))
        .mount(&mock_server)
        .await;

    let body = http_get(format!("{}/", mock_server.uri())).await.unwrap();
    assert_eq!(body, "Example Domain");
}

#[tokio::test]
async fn test_send_request_with_body_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/post"))
        .and(header("x-test", "yes"))
        .and(body_string("Hello World!"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-served-by", "mock")
                .set_body_json(serde_json::json!({ "data": "Hello World!" })),
        )
        .mount(&mock_server)
        .await;

    let response = send_request(
        Request::builder()
            .method("POST")
            .url(format!("{}/post", mock_server.uri()))
            .headers(BTreeMap::from([("x-test".to_string(), "yes".to_string())]))
            .body("Hello World!")
            .build(),
    )
    .await
    .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(
        response.headers.get("x-served-by").map(String::as_str),
        Some("mock")
    );
    let json: Value = response.json().unwrap();
    assert_eq!(json["data"], "Hello World!");
}

#[tokio::test]
async fn test_error_statuses_are_responses() {
    for status in [404, 500] {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&mock_server)
            .await;

        let response = send_request(Request::get(format!("{}/missing", mock_server.uri())))
            .await
            .unwrap();
        assert_eq!(response.status, status);
        assert!(!response.is_success());
        assert_eq!(response.body, "nope");
    }
}

#[tokio::test]
async fn test_lowercase_method_is_accepted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/item/1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let response = send_request(
        Request::builder()
            .method("delete")
            .url(format!("{}/item/1", mock_server.uri()))
            .build(),
    )
    .await
    .unwrap();
    assert_eq!(response.status, 204);
    assert!(response.body.is_empty());
}
