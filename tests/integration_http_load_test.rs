use anyhow::Result;
use chat_loadgen::{ModelSettings, OpenAiEndpoint, ReportWriter, Scheduler, TestConfig, TestSummary};
use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn config_for(base_url: String, prompts: &[&str], output_dir: &std::path::Path) -> TestConfig {
    TestConfig {
        // Fast enough that every prompt in these short pools gets a slot.
        target_rate: 20.0,
        duration: Duration::from_secs(1),
        prompt_pool: prompts.iter().map(|p| p.to_string()).collect(),
        cycle_prompts: false,
        model: ModelSettings {
            base_url,
            api_key: "test-key".to_string(),
            ..Default::default()
        },
        output_dir: output_dir.to_path_buf(),
        json_output: None,
    }
}

/// Full run against a mock OpenAI-compatible server: every request succeeds
/// and the report lists each one in order.
#[tokio::test]
async fn http_run_writes_complete_report() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("Authorization", "Bearer test-key");
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "content": "mock answer", "reasoning_content": "mock reasoning" } }
                ]
            }));
        })
        .await;

    let dir = tempfile::tempdir()?;
    let config = config_for(server.url("/v1"), &["first", "second", "third", "fourth"], dir.path());
    let endpoint = Arc::new(OpenAiEndpoint::new(&config.model)?);

    let outcome = Scheduler::new(config.clone(), endpoint).run().await;
    let summary = TestSummary::from_records(&outcome.records);
    let path = ReportWriter::new(dir.path()).write(&config, &outcome, &summary)?;

    mock.assert_hits_async(4).await;
    assert_eq!(summary.total_requests, 4);
    assert_eq!(summary.success_count, 4);
    assert_eq!(summary.success_rate_percent, 100.0);
    for record in &outcome.records {
        assert_eq!(record.content, "mock answer");
        assert_eq!(record.reasoning.as_deref(), Some("mock reasoning"));
    }

    let report = std::fs::read_to_string(path)?;
    assert!(report.contains("Success rate: 100.00%"));
    let positions: Vec<usize> = (1..=4)
        .map(|id| report.find(&format!("Request {}:\n", id)).expect("block present"))
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    Ok(())
}

/// A server error for one prompt fails only that request.
#[tokio::test]
async fn http_run_isolates_server_errors() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_includes("good question");
            then.status(200)
                .json_body(json!({ "choices": [ { "message": { "content": "fine" } } ] }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_includes("bad question");
            then.status(500).body("internal error");
        })
        .await;

    let dir = tempfile::tempdir()?;
    let config = config_for(
        server.url("/v1"),
        &["good question 1", "good question 2", "bad question 3", "good question 4"],
        dir.path(),
    );
    let endpoint = Arc::new(OpenAiEndpoint::new(&config.model)?);

    let outcome = Scheduler::new(config.clone(), endpoint).run().await;
    let summary = TestSummary::from_records(&outcome.records);

    assert_eq!(summary.success_count, 3);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(summary.success_rate_percent, 75.0);

    let failed = &outcome.records[2];
    assert_eq!(failed.sequence_id, 3);
    assert!(!failed.success);
    assert_eq!(failed.error_message, "endpoint returned HTTP 500: internal error");

    let path = ReportWriter::new(dir.path()).write(&config, &outcome, &summary)?;
    let report = std::fs::read_to_string(path)?;
    assert!(report.contains("Error: endpoint returned HTTP 500: internal error"));
    Ok(())
}

/// With nothing listening, every request fails but the run still completes
/// and produces a report.
#[tokio::test]
async fn http_run_with_unreachable_endpoint() -> Result<()> {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?.port()
    };

    let dir = tempfile::tempdir()?;
    let config = config_for(format!("http://127.0.0.1:{}/v1", port), &["a", "b"], dir.path());
    let endpoint = Arc::new(OpenAiEndpoint::new(&config.model)?);

    let outcome = Scheduler::new(config.clone(), endpoint).run().await;
    let summary = TestSummary::from_records(&outcome.records);
    let path = ReportWriter::new(dir.path()).write(&config, &outcome, &summary)?;

    assert_eq!(summary.total_requests, 2);
    assert_eq!(summary.failure_count, 2);
    assert_eq!(summary.success_rate_percent, 0.0);
    assert_eq!(summary.avg_latency, Duration::ZERO);
    assert!(outcome
        .records
        .iter()
        .all(|r| r.error_message.starts_with("request failed")));

    let report = std::fs::read_to_string(path)?;
    assert!(report.contains("Success rate: 0.00%"));
    Ok(())
}
