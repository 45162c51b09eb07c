//! Request executor tests against a mock API server

use serde_json::json;
use tidbcloud_core::client::Method;
use tidbcloud_core::models::CreateClusterResponse;
use tidbcloud_core::{ApiClient, CoreError, Credentials};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHALLENGE: &str =
    r#"Digest realm="tidb.cloud", qop="auth", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#;

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::builder()
        .credentials(Credentials::new("public", "private").unwrap())
        .base_url(server.uri())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_ok_body_decodes_string_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1beta/projects/5/clusters"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"name": "sample"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "42"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let url = client.endpoint("/api/v1beta/projects/5/clusters");
    let resp: CreateClusterResponse = client.post(&url, &json!({"name": "sample"})).await.unwrap();

    assert_eq!(resp.id, 42);
}

#[tokio::test]
async fn test_only_200_is_success() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    for status in [201u16, 204, 400, 404, 500] {
        server.reset().await;
        Mock::given(method("GET"))
            .and(path("/api/v1beta/projects"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&server)
            .await;

        let raw = client
            .execute::<()>(Method::GET, &client.endpoint("/api/v1beta/projects"), None)
            .await;
        match raw {
            Err(CoreError::Api { status: got, body }) => {
                assert_eq!(got, status);
                if status != 204 {
                    assert_eq!(body, "nope");
                }
            }
            other => panic!("status {status}: expected API error, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_api_error_message_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1beta/projects/1/clusters/2"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"code":49900007}"#))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .delete(&client.endpoint("/api/v1beta/projects/1/clusters/2"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(
        err.to_string(),
        r#"Failed with status 404 and resp {"code":49900007}"#
    );
}

#[tokio::test]
async fn test_decode_error_is_distinct_from_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1beta/projects/1/clusters/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .get::<CreateClusterResponse>(&client.endpoint("/api/v1beta/projects/1/clusters/2"))
        .await
        .unwrap_err();

    assert!(err.is_decode());
    assert_eq!(err.status(), None);
    assert_eq!(err.body(), Some("<html>oops</html>"));
}

#[tokio::test]
async fn test_digest_challenge_is_answered_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1beta/projects"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [], "total": 0})))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1beta/projects"))
        .respond_with(ResponseTemplate::new(401).insert_header("www-authenticate", CHALLENGE))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let projects = tidbcloud_core::api::list_projects(&client).await.unwrap();
    assert!(projects.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let auth = requests[1]
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(auth.starts_with("Digest "));
    assert!(auth.contains(r#"username="public""#));
    assert!(auth.contains(r#"uri="/api/v1beta/projects""#));
}

#[tokio::test]
async fn test_unauthorized_without_challenge_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1beta/projects"))
        .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = tidbcloud_core::api::list_projects(&client).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.body(), Some("denied"));
}

#[tokio::test]
async fn test_rejected_credentials_surface_second_401() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1beta/projects"))
        .respond_with(ResponseTemplate::new(401).insert_header("www-authenticate", CHALLENGE))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = tidbcloud_core::api::list_projects(&client).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    let client = ApiClient::builder()
        .credentials(Credentials::new("public", "private").unwrap())
        .base_url("http://127.0.0.1:1")
        .build()
        .unwrap();

    let err = tidbcloud_core::api::list_projects(&client).await.unwrap_err();
    assert!(matches!(err, CoreError::Transport(_)));
    assert_eq!(err.status(), None);
}
