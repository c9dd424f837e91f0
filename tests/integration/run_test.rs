//! End-to-end run tests.
//!
//! Tests the enforce, submit, wait and materialize sequence against the mock service.

use athena_query_runner::error::RunnerError;
use athena_query_runner::output::{self, OutputFormat};
use athena_query_runner::query::{QueryRunner, RunOptions};
use athena_query_runner::service::{
    Cell, ExecutionState, ExecutionStatus, MockQueryService, PageRequest, ResultPage,
    SubmitRequest,
};
use pretty_assertions::assert_eq;

fn request(sql: &str) -> SubmitRequest {
    SubmitRequest {
        sql: sql.to_string(),
        database: "analytics".to_string(),
        catalog: "AwsDataCatalog".to_string(),
        workgroup: "primary".to_string(),
        output_location: None,
    }
}

fn options(row_limit: usize) -> RunOptions {
    RunOptions {
        row_limit,
        ..Default::default()
    }
}

fn row(values: &[&str]) -> Vec<Cell> {
    values.iter().map(|v| Some(v.to_string())).collect()
}

#[tokio::test(start_paused = true)]
async fn test_select_without_limit_gets_one() {
    let service = MockQueryService::new();
    let runner = QueryRunner::new(&service, options(100));

    let outcome = runner.run(&request("SELECT * FROM t")).await.unwrap();

    assert_eq!(service.submitted_sql(), vec!["SELECT * FROM t LIMIT 100"]);
    assert_eq!(outcome.submitted_sql, "SELECT * FROM t LIMIT 100");
}

#[tokio::test(start_paused = true)]
async fn test_larger_limit_is_reduced_keeping_terminator() {
    let service = MockQueryService::new();
    let runner = QueryRunner::new(&service, options(1000));

    runner
        .run(&request("SELECT * FROM t LIMIT 5000;"))
        .await
        .unwrap();

    assert_eq!(service.submitted_sql(), vec!["SELECT * FROM t LIMIT 1000;"]);
}

#[tokio::test(start_paused = true)]
async fn test_non_select_is_submitted_unchanged() {
    let service = MockQueryService::new();
    let runner = QueryRunner::new(&service, options(10));

    runner
        .run(&request("CREATE TABLE x AS SELECT * FROM y"))
        .await
        .unwrap();

    assert_eq!(
        service.submitted_sql(),
        vec!["CREATE TABLE x AS SELECT * FROM y"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_two_pages_stop_at_row_limit() {
    let service = MockQueryService::new().with_pages(vec![
        ResultPage::new(vec![
            row(&["id", "name"]),
            row(&["1", "a"]),
            row(&["2", "b"]),
            row(&["3", "c"]),
        ])
        .with_next_token("page-2"),
        ResultPage::new(vec![row(&["4", "d"]), row(&["5", "e"])]).with_next_token("page-3"),
        ResultPage::new(vec![row(&["6", "f"])]),
    ]);
    let runner = QueryRunner::new(&service, options(4));

    let outcome = runner.run(&request("SELECT id, name FROM t")).await.unwrap();

    assert_eq!(outcome.row_count, 4);
    let ids: Vec<_> = outcome
        .rows
        .iter()
        .map(|r| r.get("id").flatten().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
    assert_eq!(outcome.rows[3].get("name"), Some(Some("d")));

    assert_eq!(
        service.page_requests(),
        vec![
            PageRequest {
                max_results: 5,
                next_token: None
            },
            PageRequest {
                max_results: 1,
                next_token: Some("page-2".to_string())
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_run_after_running_polls_renders_json() {
    let service = MockQueryService::new()
        .with_execution_id("8f1c")
        .with_running_then(3, ExecutionStatus::succeeded(1_048_576, 830))
        .with_pages(vec![ResultPage::new(vec![
            row(&["country", "visits"]),
            vec![Some("NL".to_string()), Some("12".to_string())],
            vec![Some("DE".to_string()), None],
        ])]);
    let runner = QueryRunner::new(&service, options(10));

    let outcome = runner
        .run(&request("SELECT country, visits FROM traffic"))
        .await
        .unwrap();
    assert_eq!(service.status_calls(), 4);

    let doc = output::render(&outcome, OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&doc).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "query_execution_id": "8f1c",
            "state": "SUCCEEDED",
            "submitted_sql": "SELECT country, visits FROM traffic LIMIT 10",
            "data_scanned_bytes": 1048576,
            "execution_time_ms": 830,
            "row_count": 2,
            "rows": [
                {"country": "NL", "visits": "12"},
                {"country": "DE", "visits": null}
            ]
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_result_is_success() {
    let service = MockQueryService::new().with_pages(vec![ResultPage::default()]);
    let runner = QueryRunner::new(&service, options(10));

    let outcome = runner.run(&request("SELECT 1 WHERE false")).await.unwrap();

    assert_eq!(outcome.row_count, 0);
    assert!(outcome.rows.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_execution_reports_reason() {
    let service = MockQueryService::new().with_running_then(
        1,
        ExecutionStatus::failed(
            ExecutionState::Failed,
            "TABLE_NOT_FOUND: line 1:15: Table 'awsdatacatalog.analytics.t' does not exist",
        ),
    );
    let runner = QueryRunner::new(&service, options(10));

    let err = runner.run(&request("SELECT * FROM t")).await.unwrap_err();

    assert_eq!(err.category(), "Execution Failed");
    assert!(err.to_string().contains("TABLE_NOT_FOUND"));
    assert!(service.page_requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_distinct_from_failure() {
    let service =
        MockQueryService::new().with_statuses(vec![ExecutionStatus::new(ExecutionState::Queued)]);
    let runner = QueryRunner::new(
        &service,
        RunOptions {
            timeout: std::time::Duration::from_secs(2),
            ..options(10)
        },
    );

    let err = runner.run(&request("SELECT * FROM t")).await.unwrap_err();

    assert!(matches!(err, RunnerError::WaitTimeout { timeout_secs: 2 }));
    assert!(err.execution_may_continue());
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_aborts_run() {
    let service = MockQueryService::new().failing_transport("dns error");
    let runner = QueryRunner::new(&service, options(10));

    let err = runner.run(&request("SELECT 1")).await.unwrap_err();

    assert!(matches!(err, RunnerError::Transport(_)));
    assert_eq!(service.status_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_independent_runners_share_nothing() {
    let first = MockQueryService::new()
        .with_execution_id("one")
        .with_pages(vec![ResultPage::new(vec![row(&["n"]), row(&["1"])])]);
    let second = MockQueryService::new()
        .with_execution_id("two")
        .with_pages(vec![ResultPage::new(vec![row(&["m"]), row(&["x"]), row(&["y"])])]);

    let (a, b) = tokio::join!(
        async {
            QueryRunner::new(&first, options(10))
                .run(&request("SELECT n FROM a"))
                .await
        },
        async {
            QueryRunner::new(&second, options(10))
                .run(&request("SELECT m FROM b"))
                .await
        },
    );

    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a.query_execution_id.as_str(), "one");
    assert_eq!(a.row_count, 1);
    assert_eq!(b.query_execution_id.as_str(), "two");
    assert_eq!(b.row_count, 2);
}
