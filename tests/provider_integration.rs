//! Integration tests for the provider against a mock platform API.
//!
//! Each test configures a [`ConfluentProvider`] pointed at a wiremock server
//! and drives complete transitions: create with polling, refresh, update,
//! delete, import and data source lookups.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use confluent_provider::error::ErrorKind;
use confluent_provider::testing::{ProviderTester, TestError};
use confluent_provider::{ConfluentProvider, LifecycleState, ProviderError, ProviderService, WaitOptions};

// =============================================================================
// Test Helpers
// =============================================================================

const CLOUD_AUTH: &str = "Basic Q0s6Q1M=";
const TOPIC_AUTH: &str = "Basic VEs6VFM=";
const AMBIENT_KAFKA_AUTH: &str = "Basic QUs6QVM=";

fn fast_waits() -> WaitOptions {
    WaitOptions::new(Duration::from_secs(5), Duration::from_millis(10))
}

async fn configured(server: &MockServer, waits: WaitOptions) -> ConfluentProvider {
    let provider = ConfluentProvider::with_wait_options(waits).without_env_fallback();
    let diagnostics = provider
        .configure(json!({
            "cloud_api_key": "CK",
            "cloud_api_secret": "CS",
            "endpoint": server.uri(),
            "kafka_api_key": "AK",
            "kafka_api_secret": "AS"
        }))
        .await
        .unwrap();
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
    provider
}

fn network_config() -> Value {
    json!({
        "display_name": "private",
        "cloud": "AWS",
        "region": "us-east-2",
        "connection_types": ["PRIVATELINK"],
        "environment": [{"id": "env-1"}]
    })
}

fn network(id: &str, phase: &str) -> Value {
    json!({
        "id": id,
        "spec": {
            "display_name": "private",
            "cloud": "AWS",
            "region": "us-east-2",
            "connection_types": ["PRIVATELINK"],
            "cidr": "10.1.0.0/16",
            "zones": ["use2-az1", "use2-az2", "use2-az3"],
            "environment": {"id": "env-1"}
        },
        "status": {"phase": phase},
        "metadata": {"resource_name": format!("crn://confluent.cloud/environment=env-1/network={}", id)}
    })
}

async fn mount_network_reads(server: &MockServer, phases: &[&str], then: ResponseTemplate) {
    for phase in phases {
        Mock::given(method("GET"))
            .and(path("/networking/v1/networks/n-1"))
            .and(query_param("environment", "env-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(network("n-1", phase)))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/networking/v1/networks/n-1"))
        .and(query_param("environment", "env-1"))
        .respond_with(then)
        .mount(server)
        .await;
}

async fn mount_network_create(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/networking/v1/networks"))
        .and(header("Authorization", CLOUD_AUTH))
        .respond_with(ResponseTemplate::new(202).set_body_json(network("n-1", "PROVISIONING")))
        .expect(1)
        .mount(server)
        .await;
}

/// Fails the test if any request reaches the server.
async fn forbid_requests(server: &MockServer) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

// =============================================================================
// Provider
// =============================================================================

#[tokio::test]
async fn test_all_resource_kinds_registered() {
    let tester = ProviderTester::new(ConfluentProvider::new());
    let mut types = tester.resource_types();
    types.sort();
    assert_eq!(
        types,
        vec![
            "confluent_connector",
            "confluent_environment",
            "confluent_flink_compute_pool",
            "confluent_kafka_cluster",
            "confluent_kafka_topic",
            "confluent_network",
            "confluent_service_account",
        ]
    );

    let schema = tester.schema();
    assert!(schema.resources["confluent_kafka_cluster"]
        .block
        .exactly_one_of
        .iter()
        .any(|group| group.0.len() == 3));
    assert!(schema.data_sources.contains_key("confluent_environment"));
}

#[tokio::test]
async fn test_operations_require_configuration() {
    let provider = ConfluentProvider::new();
    let err = provider
        .create("confluent_environment", json!({"display_name": "staging"}))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_polls_until_ready() {
    let server = MockServer::start().await;
    mount_network_create(&server).await;
    mount_network_reads(
        &server,
        &["PROVISIONING", "PROVISIONING"],
        ResponseTemplate::new(200).set_body_json(network("n-1", "READY")),
    )
    .await;

    let provider = configured(&server, fast_waits()).await;
    let state = provider
        .create("confluent_network", network_config())
        .await
        .unwrap();

    assert_eq!(state["id"], "n-1");
    assert_eq!(state["cidr"], "10.1.0.0/16");
    assert_eq!(state["zones"], json!(["use2-az1", "use2-az2", "use2-az3"]));
    assert_eq!(state["environment"], json!([{"id": "env-1"}]));
    assert!(state["resource_name"].as_str().unwrap().ends_with("network=n-1"));
}

#[tokio::test]
async fn test_create_failure_reports_server_reason() {
    let server = MockServer::start().await;
    mount_network_create(&server).await;
    let mut failed = network("n-1", "FAILED");
    failed["status"]["error_message"] = json!("CIDR 10.1.0.0/16 overlaps an existing network");
    mount_network_reads(
        &server,
        &["PROVISIONING"],
        ResponseTemplate::new(200).set_body_json(failed),
    )
    .await;

    let provider = configured(&server, fast_waits()).await;
    let err = provider
        .create("confluent_network", network_config())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteFailed);
    let message = err.to_string();
    assert!(message.contains("confluent_network \"n-1\""));
    assert!(message.contains("overlaps an existing network"));
}

#[tokio::test]
async fn test_create_times_out_with_last_state() {
    let server = MockServer::start().await;
    mount_network_create(&server).await;
    mount_network_reads(
        &server,
        &[],
        ResponseTemplate::new(200).set_body_json(network("n-1", "PROVISIONING")),
    )
    .await;

    let waits = WaitOptions::new(Duration::from_millis(150), Duration::from_millis(20));
    let provider = configured(&server, waits).await;
    let err = provider
        .create("confluent_network", network_config())
        .await
        .unwrap_err();

    match err.root() {
        ProviderError::Timeout { last_state, .. } => {
            assert_eq!(*last_state, Some(LifecycleState::Provisioning));
        }
        other => panic!("expected a timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_validation_makes_no_calls() {
    let server = MockServer::start().await;
    forbid_requests(&server).await;

    let provider = configured(&server, fast_waits()).await;
    let mut config = network_config();
    config["connection_types"] = json!(["VPN"]);

    let err = provider.create("confluent_network", config).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/org/v2/environments"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/org/v2/environments"))
        .and(body_json(json!({"display_name": "staging"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": "env-1", "display_name": "staging"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/org/v2/environments/env-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "env-1", "display_name": "staging"})),
        )
        .mount(&server)
        .await;

    let provider = configured(&server, fast_waits()).await;
    let state = provider
        .create("confluent_environment", json!({"display_name": "staging"}))
        .await
        .unwrap();
    assert_eq!(state["id"], "env-1");
    assert_eq!(state["stream_governance"], json!([]));
}

#[tokio::test]
async fn test_exhausted_retries_report_status_and_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/org/v2/environments"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"errors": [{"detail": "overloaded"}]})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let provider = ConfluentProvider::with_wait_options(fast_waits()).without_env_fallback();
    provider
        .configure(json!({
            "cloud_api_key": "CK",
            "cloud_api_secret": "CS",
            "endpoint": server.uri(),
            "max_retries": 1
        }))
        .await
        .unwrap();

    let err = provider
        .create("confluent_environment", json!({"display_name": "staging"}))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
    let message = err.to_string();
    assert!(message.contains("503"), "{}", message);
    assert!(message.contains("overloaded"), "{}", message);
    assert!(message.contains("not yet assigned"), "{}", message);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

// =============================================================================
// Read
// =============================================================================

#[tokio::test]
async fn test_read_missing_object_returns_none() {
    let server = MockServer::start().await;
    mount_network_reads(
        &server,
        &[],
        ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"status": "404", "detail": "Network n-1 not found"}]
        })),
    )
    .await;

    let provider = configured(&server, fast_waits()).await;
    let mut state = network_config();
    state["id"] = json!("n-1");
    let refreshed = provider.read("confluent_network", state).await.unwrap();
    assert!(refreshed.is_none());
}

#[tokio::test]
async fn test_read_reports_drift() {
    let server = MockServer::start().await;
    let mut renamed = network("n-1", "READY");
    renamed["spec"]["display_name"] = json!("renamed-in-console");
    mount_network_reads(&server, &[], ResponseTemplate::new(200).set_body_json(renamed)).await;

    let provider = configured(&server, fast_waits()).await;
    let mut state = network_config();
    state["id"] = json!("n-1");
    let refreshed = provider.read("confluent_network", state).await.unwrap().unwrap();
    assert_eq!(refreshed["display_name"], "renamed-in-console");
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_force_new_change_makes_no_calls() {
    let server = MockServer::start().await;
    forbid_requests(&server).await;

    let provider = configured(&server, fast_waits()).await;
    let mut prior = network_config();
    prior["id"] = json!("n-1");
    let mut desired = prior.clone();
    desired["region"] = json!("us-west-2");

    let err = provider
        .update("confluent_network", prior, desired)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("'region' cannot be changed in place"));
}

#[tokio::test]
async fn test_rename_patches_then_reads() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/networking/v1/networks/n-1"))
        .and(body_json(json!({"spec": {"display_name": "renamed", "environment": {"id": "env-1"}}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    let mut renamed = network("n-1", "READY");
    renamed["spec"]["display_name"] = json!("renamed");
    mount_network_reads(&server, &[], ResponseTemplate::new(200).set_body_json(renamed)).await;

    let provider = configured(&server, fast_waits()).await;
    let mut prior = network_config();
    prior["id"] = json!("n-1");
    let mut desired = prior.clone();
    desired["display_name"] = json!("renamed");

    let state = provider
        .update("confluent_network", prior, desired)
        .await
        .unwrap();
    assert_eq!(state["display_name"], "renamed");
}

#[tokio::test]
async fn test_connector_pause() {
    let server = MockServer::start().await;
    let base = "/connect/v1/environments/env-1/clusters/lkc-1/connectors/orders-sink";
    Mock::given(method("PUT"))
        .and(path(format!("{}/pause", base)))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/config", base)))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    for state in ["RUNNING", "PAUSED"] {
        let mock = Mock::given(method("GET"))
            .and(path(format!("{}/status", base)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "orders-sink",
                "connector": {"state": state, "worker_id": "orders-sink", "trace": ""},
                "tasks": [],
                "type": "sink"
            })));
        let mock = if state == "RUNNING" { mock.up_to_n_times(1) } else { mock };
        mock.mount(&server).await;
    }
    Mock::given(method("GET"))
        .and(path(format!("{}/config", base)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "orders-sink",
            "connector.class": "S3_SINK",
            "aws.secret.access.key": "****************",
            "kafka.endpoint": "SASL_SSL://pkc-1:9092"
        })))
        .mount(&server)
        .await;

    let provider = configured(&server, fast_waits()).await;
    let prior = json!({
        "id": "env-1/lkc-1/orders-sink",
        "environment": [{"id": "env-1"}],
        "kafka_cluster": [{"id": "lkc-1"}],
        "config_nonsensitive": {"name": "orders-sink", "connector.class": "S3_SINK"},
        "config_sensitive": {"aws.secret.access.key": "s3cret"},
        "status": "RUNNING"
    });
    let mut desired = prior.clone();
    desired["status"] = json!("PAUSED");

    let state = provider
        .update("confluent_connector", prior, desired)
        .await
        .unwrap();
    assert_eq!(state["status"], "PAUSED");
    assert_eq!(state["config_sensitive"]["aws.secret.access.key"], "s3cret");
    assert_eq!(
        state["config_nonsensitive"],
        json!({"name": "orders-sink", "connector.class": "S3_SINK"})
    );
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_waits_for_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/networking/v1/networks/n-1"))
        .and(query_param("environment", "env-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_network_reads(
        &server,
        &["DEPROVISIONING", "DEPROVISIONING"],
        ResponseTemplate::new(404).set_body_string("Not Found"),
    )
    .await;

    let tester = ProviderTester::new(configured(&server, fast_waits()).await);
    let mut state = network_config();
    state["id"] = json!("n-1");
    tester.destroy("confluent_network", state).await.unwrap();
}

#[tokio::test]
async fn test_delete_of_missing_object_fails() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/networking/v1/networks/n-1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let provider = configured(&server, fast_waits()).await;
    let mut state = network_config();
    state["id"] = json!("n-1");
    let err = provider.delete("confluent_network", state).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_verify_destroyed_reports_server_errors() {
    let server = MockServer::start().await;
    mount_network_reads(
        &server,
        &[],
        ResponseTemplate::new(403).set_body_json(json!({"error": {"message": "Forbidden Access"}})),
    )
    .await;

    let tester = ProviderTester::new(configured(&server, fast_waits()).await);
    let mut state = network_config();
    state["id"] = json!("n-1");
    let err = tester.verify_destroyed("confluent_network", state).await.unwrap_err();
    match err {
        TestError::Provider(err) => assert_eq!(err.kind(), ErrorKind::Api),
        other => panic!("expected a provider error, got {}", other),
    }
}

// =============================================================================
// Import
// =============================================================================

#[tokio::test]
async fn test_import_composite_id() {
    let server = MockServer::start().await;
    let mut imported = network("n-456", "READY");
    imported["spec"]["environment"]["id"] = json!("env-123");
    Mock::given(method("GET"))
        .and(path("/networking/v1/networks/n-456"))
        .and(query_param("environment", "env-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(imported))
        .expect(1)
        .mount(&server)
        .await;

    let provider = configured(&server, fast_waits()).await;
    let imported = provider
        .import_resource("confluent_network", "env-123/n-456")
        .await
        .unwrap();

    assert_eq!(imported.len(), 1);
    let state = &imported[0].state;
    assert_eq!(state["id"], "n-456");
    assert_eq!(state["environment"], json!([{"id": "env-123"}]));
    assert_eq!(state["cloud"], "AWS");
}

#[tokio::test]
async fn test_import_rejects_malformed_id() {
    let server = MockServer::start().await;
    forbid_requests(&server).await;

    let provider = configured(&server, fast_waits()).await;
    let err = provider
        .import_resource("confluent_network", "env-123")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("<environment_id>/<network_id>"));
}

#[tokio::test]
async fn test_import_id_segments_are_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/networking/v1/networks/n-1%3Fenvironment%3Denv-2"))
        .and(query_param("environment", "env-1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = configured(&server, fast_waits()).await;
    let err = provider
        .import_resource("confluent_network", "env-1/n-1?environment=env-2")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_import_of_unknown_cluster_type_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cmk/v2/clusters/lkc-9"))
        .and(query_param("environment", "env-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "lkc-9",
            "spec": {
                "display_name": "analytics",
                "availability": "MULTI_ZONE",
                "cloud": "AWS",
                "region": "us-east-2",
                "config": {"kind": "Enterprise"},
                "environment": {"id": "env-1"}
            },
            "status": {"phase": "PROVISIONED"}
        })))
        .mount(&server)
        .await;

    let provider = configured(&server, fast_waits()).await;
    let err = provider
        .import_resource("confluent_kafka_cluster", "env-1/lkc-9")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnrecognizedStatus);
    assert!(err.to_string().contains("Enterprise"));
}

#[tokio::test]
async fn test_import_of_missing_object_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fcpm/v2/compute-pools/lfcp-9"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let provider = configured(&server, fast_waits()).await;
    let err = provider
        .import_resource("confluent_flink_compute_pool", "env-1/lfcp-9")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// =============================================================================
// Kafka topics
// =============================================================================

#[tokio::test]
async fn test_topic_uses_resource_credentials() {
    let server = MockServer::start().await;
    let topics = "/kafka/v3/clusters/lkc-1/topics";
    let topic = json!({
        "kind": "KafkaTopic",
        "cluster_id": "lkc-1",
        "topic_name": "orders",
        "is_internal": false,
        "replication_factor": 3,
        "partitions_count": 3
    });

    Mock::given(method("POST"))
        .and(path(topics))
        .and(header("Authorization", TOPIC_AUTH))
        .and(body_json(json!({
            "topic_name": "orders",
            "partitions_count": 3,
            "configs": [{"name": "cleanup.policy", "value": "compact"}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(topic.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/orders", topics)))
        .and(header("Authorization", TOPIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(topic))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/orders/configs", topics)))
        .and(header("Authorization", TOPIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"name": "cleanup.policy", "value": "compact", "source": "DYNAMIC_TOPIC_CONFIG"},
                {"name": "retention.ms", "value": "604800000", "source": "DEFAULT_CONFIG"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(any())
        .and(header("Authorization", AMBIENT_KAFKA_AUTH))
        .respond_with(ResponseTemplate::new(401))
        .expect(0)
        .mount(&server)
        .await;

    let provider = configured(&server, fast_waits()).await;
    let state = provider
        .create(
            "confluent_kafka_topic",
            json!({
                "topic_name": "orders",
                "partitions_count": 3,
                "config": {"cleanup.policy": "compact"},
                "kafka_cluster": [{"id": "lkc-1"}],
                "rest_endpoint": server.uri(),
                "credentials": [{"key": "TK", "secret": "TS"}]
            }),
        )
        .await
        .unwrap();

    assert_eq!(state["id"], "lkc-1/orders");
    assert_eq!(state["config"], json!({"cleanup.policy": "compact"}));
    assert_eq!(state["credentials"], json!([{"key": "TK", "secret": "TS"}]));
}

#[tokio::test]
async fn test_topic_partition_decrease_rejected_without_calls() {
    let server = MockServer::start().await;
    forbid_requests(&server).await;

    let provider = configured(&server, fast_waits()).await;
    let prior = json!({
        "id": "lkc-1/orders",
        "topic_name": "orders",
        "partitions_count": 6,
        "config": {},
        "kafka_cluster": [{"id": "lkc-1"}],
        "rest_endpoint": server.uri()
    });
    let mut desired = prior.clone();
    desired["partitions_count"] = json!(3);

    let err = provider
        .update("confluent_kafka_topic", prior, desired)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("can only be increased"));
}

// =============================================================================
// Data sources
// =============================================================================

#[tokio::test]
async fn test_kafka_cluster_data_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cmk/v2/clusters/lkc-1"))
        .and(query_param("environment", "env-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "lkc-1",
            "spec": {
                "display_name": "inventory",
                "availability": "SINGLE_ZONE",
                "cloud": "AWS",
                "region": "us-east-2",
                "config": {"kind": "Basic"},
                "kafka_bootstrap_endpoint": "SASL_SSL://pkc-1.us-east-2.aws.confluent.cloud:9092",
                "http_endpoint": "https://pkc-1.us-east-2.aws.confluent.cloud:443",
                "environment": {"id": "env-1"}
            },
            "status": {"phase": "PROVISIONED"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = configured(&server, fast_waits()).await;
    let cluster = provider
        .read_data_source(
            "confluent_kafka_cluster",
            json!({"id": "lkc-1", "environment": [{"id": "env-1"}]}),
        )
        .await
        .unwrap();

    assert_eq!(cluster["display_name"], "inventory");
    assert_eq!(cluster["basic"], json!([{}]));
    assert_eq!(cluster["rest_endpoint"], "https://pkc-1.us-east-2.aws.confluent.cloud:443");
}
