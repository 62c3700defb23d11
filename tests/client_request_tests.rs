//! Client request-level scenarios from spec.md §8 (S1-S6).

use std::collections::HashSet;
use std::sync::Arc;

use arachne::error::GrabError;
use arachne::transport::ReqwestTransport;
use arachne::{Client, RequestOverrides};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn new_client() -> Client {
    Client::with_transport(Arc::new(ReqwestTransport::new().unwrap()))
}

#[tokio::test]
async fn s1_get_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Final Countdown"))
        .mount(&server)
        .await;

    let mut client = new_client();
    let doc = client
        .request(RequestOverrides::default().url(server.uri()))
        .await
        .unwrap();

    assert_eq!(doc.code, 200);
    assert_eq!(doc.body, b"Final Countdown");
}

#[tokio::test]
async fn s2_header_read_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header("Hello", "Grab"))
        .mount(&server)
        .await;

    let mut client = new_client();
    let doc = client
        .request(RequestOverrides::default().url(server.uri()))
        .await
        .unwrap();

    assert_eq!(doc.headers.get("Hello").unwrap(), "Grab");
}

#[tokio::test]
async fn s3_default_ua_is_stable_within_one_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut client = new_client();
    for _ in 0..3 {
        client
            .request(RequestOverrides::default().url(server.uri()))
            .await
            .unwrap();
    }

    let uas: HashSet<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.headers.get("user-agent").unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(uas.len(), 1, "a single client must reuse one default User-Agent");
}

#[tokio::test]
async fn s4_fresh_clients_vary_default_ua() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    for _ in 0..3 {
        let mut client = new_client();
        client
            .request(RequestOverrides::default().url(server.uri()))
            .await
            .unwrap();
    }

    let uas: HashSet<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.headers.get("user-agent").unwrap().to_str().unwrap().to_string())
        .collect();
    assert!(uas.len() >= 2, "fresh clients should rarely share a default User-Agent");
}

#[tokio::test]
async fn s5_redirect_follow() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/next"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let mut client = new_client();
    let doc = client
        .request(RequestOverrides::default().url(format!("{}/start", server.uri())))
        .await
        .unwrap();

    assert_eq!(doc.body, b"ok");
}

#[tokio::test]
async fn s6_redirect_cap_is_enforced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/b"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/a"))
        .mount(&server)
        .await;

    let mut client = new_client();
    let err = client
        .request(
            RequestOverrides::default()
                .url(format!("{}/a", server.uri()))
                .redirect_limit(2),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GrabError::TooManyRedirects));
}

#[tokio::test]
async fn redirect_preserves_method_on_303() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/start"))
        .respond_with(ResponseTemplate::new(303).insert_header("Location", "/next"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/next"))
        .respond_with(ResponseTemplate::new(200).set_body_string("still post"))
        .mount(&server)
        .await;

    let mut client = new_client();
    let doc = client
        .request(
            RequestOverrides::default()
                .url(format!("{}/start", server.uri()))
                .method(reqwest::Method::POST),
        )
        .await
        .unwrap();

    assert_eq!(doc.body, b"still post");
}
