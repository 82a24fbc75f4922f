use std::time::Duration;

use apollo_sdk::client::{ApolloClient, ApolloError};
use apollo_sdk::shared::config::ClientConfig;
use apollo_sdk::{fetch_messages, fetch_task_messages, FetchPath};
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "API_KEY_TEST";
const TASK_ID: &str = "6909e075db7f4eff00486c73";
const MESSAGES_PATH: &str = "/ia-controller/api/v1/external/tasks/6909e075db7f4eff00486c73/messages";

fn base_url(server: &MockServer) -> String {
    format!("{}/ia-controller", server.uri())
}

fn client_for(server: &MockServer) -> ApolloClient {
    ApolloClient::new(ClientConfig::new(&base_url(server)).unwrap()).unwrap()
}

fn messages_mock() -> wiremock::MockBuilder {
    Mock::given(method("GET"))
        .and(path(MESSAGES_PATH))
        .and(header("x-network-api-key", API_KEY))
}

fn message_with_value(value: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "msg-2",
        "task_id": TASK_ID,
        "text": "Here is a microwave that fits",
        "sender": "agent",
        "receiver": "user",
        "cards": [{
            "title": "Built-in microwave",
            "parameters": [
                {"name": "capacity", "value": "25L"},
                {"name": "dimensions", "value": value}
            ]
        }],
        "followup_suggestions": ["Show cheaper options"]
    })
}

#[tokio::test]
async fn primary_path_returns_typed_messages() {
    let server = MockServer::start().await;
    let body = json!([
        {"id": "msg-1", "text": "I am looking for a microwave", "sender": "user", "receiver": "agent"},
        message_with_value(json!("45x30x38"))
    ]);
    messages_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let fetched = fetch_task_messages(&client_for(&server), API_KEY, TASK_ID)
        .await
        .unwrap();

    assert_eq!(fetched.path, FetchPath::Primary);
    assert_eq!(fetched.messages.len(), 2);
    let expected: Vec<apollo_sdk::ExternalTaskMessage> = serde_json::from_value(body).unwrap();
    assert_eq!(fetched.messages, expected);
}

#[tokio::test]
async fn structured_value_triggers_repair() {
    let server = MockServer::start().await;
    messages_mock()
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([message_with_value(json!({"x": 1}))])),
        )
        .expect(2)
        .mount(&server)
        .await;

    let fetched = fetch_task_messages(&client_for(&server), API_KEY, TASK_ID)
        .await
        .unwrap();

    assert_eq!(fetched.path, FetchPath::Repaired);
    assert_eq!(fetched.messages.len(), 1);
    let params = &fetched.messages[0].cards[0].parameters;
    assert_eq!(params[0].value.as_deref(), Some("25L"));
    assert_eq!(params[1].value.as_deref(), Some("{\"x\": 1}"));
    assert_eq!(fetched.messages[0].followup_suggestions, vec!["Show cheaper options"]);
}

#[tokio::test]
async fn fallback_http_failure_reports_status_and_body() {
    let server = MockServer::start().await;
    messages_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([message_with_value(json!(3))])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    messages_mock()
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"detail\":\"Task not found\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetch_task_messages(&client_for(&server), API_KEY, TASK_ID)
        .await
        .unwrap_err();

    match err {
        ApolloError::Http { status, body } => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, "{\"detail\":\"Task not found\"}");
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

#[tokio::test]
async fn timeout_is_not_retried() {
    let server = MockServer::start().await;
    messages_mock()
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ApolloClient::new(
        ClientConfig::new(&base_url(&server))
            .unwrap()
            .with_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let err = fetch_task_messages(&client, API_KEY, TASK_ID).await.unwrap_err();
    match err {
        ApolloError::Request(e) => assert!(e.is_timeout()),
        other => panic!("expected request error, got {other:?}"),
    }
}

#[tokio::test]
async fn connection_refused_propagates() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = fetch_messages(&format!("http://127.0.0.1:{port}"), API_KEY, TASK_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, ApolloError::Request(_)));
}

#[tokio::test]
async fn primary_error_status_skips_fallback() {
    let server = MockServer::start().await;
    messages_mock()
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetch_task_messages(&client_for(&server), API_KEY, TASK_ID)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(err.body(), Some("invalid api key"));
}

#[tokio::test]
async fn non_json_body_skips_fallback() {
    let server = MockServer::start().await;
    messages_mock()
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetch_task_messages(&client_for(&server), API_KEY, TASK_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, ApolloError::Decode { .. }));
}

#[tokio::test]
async fn empty_list_on_either_path() {
    let server = MockServer::start().await;
    messages_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let messages = fetch_messages(&base_url(&server), API_KEY, TASK_ID)
        .await
        .unwrap();
    assert!(messages.is_empty());

    let server = MockServer::start().await;
    messages_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messages": null})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    messages_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let fetched = fetch_task_messages(&client_for(&server), API_KEY, TASK_ID)
        .await
        .unwrap();
    assert_eq!(fetched.path, FetchPath::Repaired);
    assert!(fetched.messages.is_empty());
}

#[tokio::test]
async fn repaired_payload_that_still_fails_is_fatal() {
    let server = MockServer::start().await;
    // `name` is mistyped too; only `value` is repaired
    messages_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "msg-3",
            "cards": [{"parameters": [{"name": 7, "value": {"x": 1}}]}]
        }])))
        .expect(2)
        .mount(&server)
        .await;

    let err = fetch_task_messages(&client_for(&server), API_KEY, TASK_ID)
        .await
        .unwrap_err();
    assert!(err.is_validation());
}
