use std::process::Output;
use std::time::Duration;

use serde_json::json;
use tokio::process::Command;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "API_KEY_TEST";
const TASK_ID: &str = "6909e075db7f4eff00486c73";
const MESSAGES_PATH: &str = "/ia-controller/api/v1/external/tasks/6909e075db7f4eff00486c73/messages";

fn messages_mock() -> wiremock::MockBuilder {
    Mock::given(method("GET"))
        .and(path(MESSAGES_PATH))
        .and(header("x-network-api-key", API_KEY))
}

async fn run_test_tasks(base_url: &str, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_apollo-test-tasks"))
        .args(["--base-url", base_url, "--api-key", API_KEY, "--task-id", TASK_ID])
        .args(extra)
        .env_remove("APOLLO_LOG_DIR")
        .env("RUST_LOG", "off")
        .output()
        .await
        .expect("run apollo-test-tasks")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[tokio::test]
async fn empty_list_exits_zero() {
    let server = MockServer::start().await;
    messages_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_test_tasks(&format!("{}/ia-controller", server.uri()), &[]).await;

    assert_eq!(output.status.code(), Some(0), "stderr={}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Messages returned: 0"));
    assert!(!out.contains("Sample message"));
    assert!(!out.contains("Value fields were converted"));
}

#[tokio::test]
async fn repaired_path_exits_zero_with_note() {
    let server = MockServer::start().await;
    messages_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "msg-2",
            "cards": [{"parameters": [{"name": "dimensions", "value": {"x": 1}}]}]
        }])))
        .expect(2)
        .mount(&server)
        .await;

    let output = run_test_tasks(&format!("{}/ia-controller", server.uri()), &[]).await;

    assert_eq!(output.status.code(), Some(0), "stderr={}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Messages returned: 1"));
    assert!(out.contains(r#""value": "{\"x\": 1}""#));
    assert!(out.contains("Value fields were converted"));
}

#[tokio::test]
async fn fallback_not_found_exits_one_with_status_and_body() {
    let server = MockServer::start().await;
    messages_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "msg-2",
            "cards": [{"parameters": [{"name": "weight", "value": 3}]}]
        }])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    messages_mock()
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"detail\":\"Task not found\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_test_tasks(&format!("{}/ia-controller", server.uri()), &[]).await;

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Status Code: 404"), "stderr={err}");
    assert!(err.contains("Task not found"), "stderr={err}");
}

#[tokio::test]
async fn connection_refused_exits_one() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let output = run_test_tasks(&format!("http://127.0.0.1:{port}"), &[]).await;

    assert_eq!(output.status.code(), Some(1));
    assert!(!stderr(&output).contains("Status Code"));
}

#[tokio::test]
async fn timeout_exits_one_without_retry() {
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

    let output = run_test_tasks(
        &format!("{}/ia-controller", server.uri()),
        &["--timeout-secs", "1"],
    )
    .await;

    assert_eq!(output.status.code(), Some(1));
}

#[tokio::test]
async fn invalid_base_url_exits_one() {
    let output = run_test_tasks("ftp://example.com", &[]).await;
    assert_eq!(output.status.code(), Some(1));
}
