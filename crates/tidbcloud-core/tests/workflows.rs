//! Workflow scenarios against a mock API server

use std::time::Duration;

use serde_json::{Value, json};
use tidbcloud_core::workflows::{
    backup_and_restore, create_dedicated_cluster, create_developer_cluster, scale_out_tiflash,
};
use tidbcloud_core::{ApiClient, CoreError, Credentials, PollConfig, Poller, WorkflowOptions};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::builder()
        .credentials(Credentials::new("public", "private").unwrap())
        .base_url(server.uri())
        .build()
        .unwrap()
}

fn fast_poller() -> Poller {
    Poller::new(
        PollConfig::default()
            .with_interval(Duration::from_millis(10))
            .with_timeout(Duration::from_secs(5)),
    )
}

fn options() -> WorkflowOptions {
    WorkflowOptions {
        root_password: "secret".to_string(),
        ..Default::default()
    }
}

fn dedicated_spec() -> Value {
    json!({
        "cluster_type": "DEDICATED",
        "cloud_provider": "AWS",
        "region": "us-west-2",
        "tidb": [{"node_size": "8C16G", "node_quantity_range": {"min": 1, "step": 1}}],
        "tikv": [{
            "node_size": "8C32G",
            "node_quantity_range": {"min": 3, "step": 3},
            "storage_size_gib_range": {"min": 500, "max": 4096}
        }],
        "tiflash": [{
            "node_size": "8C64G",
            "node_quantity_range": {"min": 0, "step": 2},
            "storage_size_gib_range": {"min": 500, "max": 2048}
        }]
    })
}

fn cluster(id: &str, status: &str, tiflash: Value) -> Value {
    json!({
        "id": id,
        "project_id": "5",
        "name": "tidbcloud-sample-1",
        "cluster_type": "DEDICATED",
        "cloud_provider": "AWS",
        "region": "us-west-2",
        "status": {"tidb_version": "v6.1.0", "cluster_status": status},
        "config": {
            "port": 4000,
            "components": {
                "tidb": {"node_size": "8C16G", "node_quantity": 2},
                "tikv": {"node_size": "8C32G", "storage_size_gib": 500, "node_quantity": 3},
                "tiflash": tiflash
            }
        }
    })
}

async fn mock_get(server: &MockServer, at: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mock_specs_and_projects(server: &MockServer) {
    mock_get(
        server,
        "/api/v1beta/clusters/provider/regions",
        json!({"items": [
            {"cluster_type": "DEVELOPER", "cloud_provider": "AWS", "region": "us-east-1"},
            dedicated_spec()
        ]}),
    )
    .await;
    mock_get(
        server,
        "/api/v1beta/projects",
        json!({"items": [{"id": "5", "name": "default"}], "total": 1}),
    )
    .await;
}

#[tokio::test]
async fn test_create_dedicated_returns_id_while_creating() {
    let server = MockServer::start().await;
    mock_specs_and_projects(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1beta/projects/5/clusters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "100"})))
        .expect(1)
        .mount(&server)
        .await;
    mock_get(
        &server,
        "/api/v1beta/projects/5/clusters/100",
        cluster("100", "CREATING", Value::Null),
    )
    .await;

    let client = client_for(&server);
    let outcome = create_dedicated_cluster(&client, &fast_poller(), &options())
        .await
        .unwrap();

    assert_eq!(outcome.project_id, 5);
    assert_eq!(outcome.cluster_id, 100);
    assert!(!outcome.ready);
    assert!(!outcome.cleaned_up);
    assert_eq!(outcome.cluster.status(), "CREATING");

    let requests = server.received_requests().await.unwrap();
    let create = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let body: Value = serde_json::from_slice(&create.body).unwrap();
    assert_eq!(body["cluster_type"], "DEDICATED");
    assert_eq!(body["config"]["root_password"], "secret");
    assert_eq!(body["config"]["components"]["tikv"]["storage_size_gib"], 500);
    assert_eq!(body["config"]["ip_access_list"][0]["cidr"], "0.0.0.0/0");
}

#[tokio::test]
async fn test_create_dedicated_waits_until_available() {
    let server = MockServer::start().await;
    mock_specs_and_projects(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1beta/projects/5/clusters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "100"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1beta/projects/5/clusters/100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cluster("100", "CREATING", Value::Null)))
        .up_to_n_times(3)
        .with_priority(1)
        .mount(&server)
        .await;
    mock_get(
        &server,
        "/api/v1beta/projects/5/clusters/100",
        cluster("100", "AVAILABLE", Value::Null),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1beta/projects/5/clusters/100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let options = WorkflowOptions {
        wait: true,
        auto_cleanup: true,
        ..options()
    };
    let client = client_for(&server);
    let outcome = create_dedicated_cluster(&client, &fast_poller(), &options)
        .await
        .unwrap();

    assert!(outcome.ready);
    assert!(outcome.cleaned_up);
}

#[tokio::test]
async fn test_create_developer_cluster() {
    let server = MockServer::start().await;
    mock_specs_and_projects(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1beta/projects/5/clusters"))
        .and(body_json(json!({
            "name": "tidbcloud-sample-1",
            "cluster_type": "DEVELOPER",
            "cloud_provider": "AWS",
            "region": "us-east-1",
            "config": {
                "root_password": "secret",
                "components": {},
                "ip_access_list": [{"cidr": "0.0.0.0/0", "description": "Allow Access from Anywhere."}]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "101"})))
        .expect(1)
        .mount(&server)
        .await;
    mock_get(
        &server,
        "/api/v1beta/projects/5/clusters/101",
        cluster("101", "AVAILABLE", Value::Null),
    )
    .await;

    let client = client_for(&server);
    let outcome = create_developer_cluster(&client, &fast_poller(), &options())
        .await
        .unwrap();

    assert_eq!(outcome.cluster_id, 101);
    assert!(outcome.ready);
}

#[tokio::test]
async fn test_create_without_projects_is_not_found() {
    let server = MockServer::start().await;
    mock_get(&server, "/api/v1beta/projects", json!({"items": [], "total": 0})).await;

    let client = client_for(&server);
    let err = create_developer_cluster(&client, &fast_poller(), &options())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    let posts = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .count();
    assert_eq!(posts, 0);
}

#[tokio::test]
async fn test_scale_out_adds_first_tiflash_offering() {
    let server = MockServer::start().await;
    mock_specs_and_projects(&server).await;
    mock_get(
        &server,
        "/api/v1beta/projects/5/clusters/9",
        cluster("9", "AVAILABLE", json!({"node_size": "", "node_quantity": 0})),
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1beta/projects/5/clusters/9"))
        .and(body_json(json!({"config": {"components": {
            "tidb": {"node_size": "8C16G", "node_quantity": 2},
            "tikv": {"node_size": "8C32G", "storage_size_gib": 500, "node_quantity": 3},
            "tiflash": {"node_size": "8C64G", "storage_size_gib": 500, "node_quantity": 2}
        }}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcome = scale_out_tiflash(&client, &fast_poller(), &options(), 5, 9)
        .await
        .unwrap();
    assert_eq!(outcome.cluster_id, 9);
}

#[tokio::test]
async fn test_scale_out_grows_existing_tiflash_by_one() {
    let server = MockServer::start().await;
    mock_specs_and_projects(&server).await;
    mock_get(
        &server,
        "/api/v1beta/projects/5/clusters/9",
        cluster(
            "9",
            "AVAILABLE",
            json!({"node_size": "8C64G", "storage_size_gib": 1024, "node_quantity": 2}),
        ),
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1beta/projects/5/clusters/9"))
        .and(body_json(json!({"config": {"components": {
            "tidb": {"node_size": "8C16G", "node_quantity": 2},
            "tikv": {"node_size": "8C32G", "storage_size_gib": 500, "node_quantity": 3},
            "tiflash": {"node_size": "8C64G", "storage_size_gib": 1024, "node_quantity": 3}
        }}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    scale_out_tiflash(&client, &fast_poller(), &options(), 5, 9)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_scale_out_requires_available_cluster() {
    let server = MockServer::start().await;
    mock_specs_and_projects(&server).await;
    mock_get(
        &server,
        "/api/v1beta/projects/5/clusters/9",
        cluster("9", "MODIFYING", Value::Null),
    )
    .await;

    let client = client_for(&server);
    let err = scale_out_tiflash(&client, &fast_poller(), &options(), 5, 9)
        .await
        .unwrap_err();

    match err {
        CoreError::InvalidState { resource, status } => {
            assert_eq!(resource, "cluster");
            assert_eq!(status, "MODIFYING");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_backup_restore_and_cleanup() {
    let server = MockServer::start().await;
    mock_get(
        &server,
        "/api/v1beta/projects/5/clusters/9",
        cluster("9", "AVAILABLE", Value::Null),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/api/v1beta/projects/5/clusters/9/backups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "7"})))
        .expect(1)
        .mount(&server)
        .await;
    mock_get(
        &server,
        "/api/v1beta/projects/5/clusters/9/backups/7",
        json!({"id": "7", "name": "b", "type": "MANUAL", "size": "1024", "status": "SUCCESS"}),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/v1beta/projects/5/restores"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "8", "cluster_id": "200"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mock_get(
        &server,
        "/api/v1beta/projects/5/clusters/200",
        cluster("200", "AVAILABLE", Value::Null),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1beta/projects/5/clusters/9/backups/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1beta/projects/5/clusters/200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let options = WorkflowOptions {
        wait: true,
        auto_cleanup: true,
        ..options()
    };
    let client = client_for(&server);
    let outcome = backup_and_restore(&client, &fast_poller(), &options, 5, 9)
        .await
        .unwrap();

    assert_eq!(outcome.backup_id, 7);
    assert_eq!(outcome.restored_cluster_id, Some(200));
    let restored = outcome.restored_cluster.unwrap();
    assert_eq!(restored.id, 200);
    assert!(restored.is_available());
    assert!(outcome.backup.unwrap().is_success());
    assert!(outcome.cleaned_up);

    let requests = server.received_requests().await.unwrap();
    let restore = requests
        .iter()
        .find(|r| r.url.path() == "/api/v1beta/projects/5/restores")
        .unwrap();
    let body: Value = serde_json::from_slice(&restore.body).unwrap();
    assert_eq!(body["backup_id"], "7");
    assert_eq!(body["config"]["components"]["tikv"]["node_quantity"], 3);
}

#[tokio::test]
async fn test_backup_wait_times_out() {
    let server = MockServer::start().await;
    mock_get(
        &server,
        "/api/v1beta/projects/5/clusters/9",
        cluster("9", "AVAILABLE", Value::Null),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/v1beta/projects/5/clusters/9/backups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "7"})))
        .mount(&server)
        .await;
    mock_get(
        &server,
        "/api/v1beta/projects/5/clusters/9/backups/7",
        json!({"id": "7", "status": "RUNNING"}),
    )
    .await;

    let poller = Poller::new(
        PollConfig::default()
            .with_interval(Duration::from_millis(10))
            .with_max_attempts(3),
    );
    let options = WorkflowOptions {
        wait: true,
        ..options()
    };
    let client = client_for(&server);
    let err = backup_and_restore(&client, &poller, &options, 5, 9)
        .await
        .unwrap_err();

    assert!(err.is_convergence());
}

#[tokio::test]
async fn test_restore_without_password_sends_nothing() {
    let server = MockServer::start().await;
    mock_get(
        &server,
        "/api/v1beta/projects/5/clusters/9",
        cluster("9", "AVAILABLE", Value::Null),
    )
    .await;

    let options = WorkflowOptions {
        wait: true,
        root_password: String::new(),
        ..Default::default()
    };
    let client = client_for(&server);
    let err = backup_and_restore(&client, &fast_poller(), &options, 5, 9)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Validation(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_backup_only_needs_no_password() {
    let server = MockServer::start().await;
    mock_get(
        &server,
        "/api/v1beta/projects/5/clusters/9",
        cluster("9", "AVAILABLE", Value::Null),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/v1beta/projects/5/clusters/9/backups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "7"})))
        .expect(1)
        .mount(&server)
        .await;
    mock_get(
        &server,
        "/api/v1beta/projects/5/clusters/9/backups/7",
        json!({"id": "7", "status": "RUNNING"}),
    )
    .await;

    let options = WorkflowOptions {
        root_password: String::new(),
        ..Default::default()
    };
    let client = client_for(&server);
    let outcome = backup_and_restore(&client, &fast_poller(), &options, 5, 9)
        .await
        .unwrap();

    assert_eq!(outcome.backup_id, 7);
    assert_eq!(outcome.restored_cluster_id, None);
    assert!(outcome.restored_cluster.is_none());
}
