//! The full scenario catalogue, driven through the runner

mod support;

use std::time::Duration;

use shopcheck::runner::Selection;
use shopcheck::{HarnessConfig, HarnessError, ScenarioRunner};
use support::{MockBackend, Resource};

fn failures(suite: &shopcheck::SuiteResult) -> Vec<String> {
    suite
        .results
        .iter()
        .filter(|r| !r.success)
        .map(|r| format!("{}: {}", r.name, r.error.as_deref().unwrap_or("?")))
        .collect()
}

#[tokio::test]
async fn test_full_catalogue_passes_and_cleans_up() {
    let backend = MockBackend::start().await;
    let runner = ScenarioRunner::new(&backend.config()).unwrap();
    runner.wait_for_api().await.unwrap();

    let suite = runner.run_all().await;

    assert!(suite.is_success(), "failed scenarios: {:#?}", failures(&suite));
    assert_eq!(suite.total, shopcheck::scenarios::catalogue().len());
    assert_eq!(suite.teardown_failures, 0);

    let store = backend.state.store();
    assert_eq!(store.count(Resource::Products), 0);
    assert_eq!(store.count(Resource::Users), 0);
    assert_eq!(store.count(Resource::Categories), 0);
    let orders = store.all(Resource::Orders);
    assert!(!orders.is_empty());
    assert!(
        orders.iter().all(|o| o["status"] == "cancelled"),
        "orders left open: {:#?}",
        orders
    );
}

#[tokio::test]
async fn test_run_tagged() {
    let backend = MockBackend::start().await;
    let runner = ScenarioRunner::new(&backend.config()).unwrap();

    let suite = runner.run_tagged("cart").await;
    assert!(suite.total > 0);
    assert!(suite.results.iter().all(|r| r.tags.iter().any(|t| t == "cart")));
    assert!(suite.is_success(), "failed scenarios: {:#?}", failures(&suite));
}

#[tokio::test]
async fn test_run_named() {
    let backend = MockBackend::start().await;
    let runner = ScenarioRunner::new(&backend.config()).unwrap();

    let outcome = runner.run_named("confirm an order").await.unwrap();
    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.last_status, Some(200));
    assert_eq!(outcome.teardown.attempted, 4);

    assert!(matches!(
        runner.run_named("no such scenario").await,
        Err(HarnessError::ScenarioNotFound(_))
    ));
}

#[tokio::test]
async fn test_teardown_failure_is_reported_not_fatal() {
    let backend = MockBackend::start().await;
    let runner = ScenarioRunner::new(&backend.config()).unwrap();

    // Category ids are sequential; the first one created by this scenario is cat-1.
    backend.state.store().failing_deletes.insert("cat-1".into());

    let suite = runner
        .run_selection(&Selection::Named(vec!["get a product by id".into()]))
        .await
        .unwrap();
    assert!(suite.is_success(), "failed scenarios: {:#?}", failures(&suite));
    assert_eq!(suite.teardown_failures, 1);
    assert_eq!(suite.results[0].teardown.failures[0].id, "cat-1");
    assert_eq!(backend.state.store().count(Resource::Products), 0);
}

#[tokio::test]
async fn test_failing_scenario_still_tears_down() {
    let backend = MockBackend::start().await;
    let runner = ScenarioRunner::new(&backend.config()).unwrap();

    // The seeded user gets id user-1; a failing DELETE leaves it behind and
    // makes the scenario's own delete assertion fail.
    backend.state.store().failing_deletes.insert("user-1".into());

    let outcome = runner.run_named("delete a user").await.unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.last_status, Some(500));
    assert_eq!(outcome.teardown.attempted, 1);
    assert_eq!(outcome.teardown.failures.len(), 1);
}

#[tokio::test]
async fn test_results_are_written() {
    let backend = MockBackend::start().await;
    let runner = ScenarioRunner::new(&backend.config()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let suite = runner.run_tagged("smoke").await;
    let path = shopcheck::runner::write_results(dir.path(), &suite).unwrap();

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(written["total"], suite.total);
    assert_eq!(written["passed"], suite.passed);
    assert_eq!(written["base_url"], backend.base_url.as_str());
}

#[tokio::test]
async fn test_unreachable_backend() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = HarnessConfig {
        base_url: format!("http://127.0.0.1:{}/v1/api", port),
        timeout_secs: 1,
        ..Default::default()
    };
    let runner = ScenarioRunner::new(&config).unwrap();
    let api = runner.api();
    assert!(api.wait_until_available(Duration::from_millis(300)).await.is_err());

    let outcome = runner.run_named("create a category").await.unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.last_status, Some(0));
    assert_eq!(outcome.teardown.attempted, 0);
}
