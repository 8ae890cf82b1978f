//! Scenario runner: selects scenarios, runs each with guaranteed teardown,
//! and aggregates a JSON-serializable suite result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::api::ApiContext;
use crate::config::HarnessConfig;
use crate::error::HarnessResult;
use crate::registry::DrainReport;
use crate::scenario::ScenarioContext;
use crate::scenarios::{self, ScenarioDef};

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub tags: Vec<String>,
    pub success: bool,
    pub duration_ms: u64,
    /// Status of the last recorded call, if any
    pub last_status: Option<u16>,
    pub error: Option<String>,
    pub teardown: DrainReport,
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize)]
pub struct SuiteResult {
    pub started_at: DateTime<Utc>,
    pub base_url: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Teardown calls that failed across all scenarios
    pub teardown_failures: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioOutcome>,
}

impl SuiteResult {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Selection of scenarios to run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    All,
    Tagged(String),
    Named(Vec<String>),
}

impl Selection {
    pub fn resolve(&self) -> HarnessResult<Vec<ScenarioDef>> {
        match self {
            Selection::All => Ok(scenarios::catalogue()),
            Selection::Tagged(tag) => Ok(scenarios::tagged(tag)),
            Selection::Named(names) => names.iter().map(|n| scenarios::find(n)).collect(),
        }
    }
}

pub struct ScenarioRunner {
    api: Arc<ApiContext>,
    base_url: String,
    output_dir: PathBuf,
    startup_timeout: Duration,
}

impl ScenarioRunner {
    pub fn new(config: &HarnessConfig) -> HarnessResult<Self> {
        let api = ApiContext::new(config)?;
        Ok(Self {
            api: Arc::new(api),
            base_url: config.base_url.clone(),
            output_dir: config.output_dir.clone(),
            startup_timeout: config.startup_timeout(),
        })
    }

    pub fn api(&self) -> Arc<ApiContext> {
        Arc::clone(&self.api)
    }

    /// Block until the backend answers, up to the configured startup timeout.
    pub async fn wait_for_api(&self) -> HarnessResult<()> {
        self.api.wait_until_available(self.startup_timeout).await
    }

    pub async fn run_all(&self) -> SuiteResult {
        self.run_scenarios(&scenarios::catalogue()).await
    }

    pub async fn run_tagged(&self, tag: &str) -> SuiteResult {
        self.run_scenarios(&scenarios::tagged(tag)).await
    }

    pub async fn run_named(&self, name: &str) -> HarnessResult<ScenarioOutcome> {
        let scenario = scenarios::find(name)?;
        Ok(self.run_scenario(&scenario).await)
    }

    pub async fn run_selection(&self, selection: &Selection) -> HarnessResult<SuiteResult> {
        let selected = selection.resolve()?;
        Ok(self.run_scenarios(&selected).await)
    }

    /// Run scenarios one after another; a failing scenario never stops the
    /// rest.
    pub async fn run_scenarios(&self, selected: &[ScenarioDef]) -> SuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::with_capacity(selected.len());

        info!(count = selected.len(), base_url = %self.base_url, "Running scenarios");

        for scenario in selected {
            let outcome = self.run_scenario(scenario).await;
            if outcome.success {
                info!("✓ {} ({} ms)", outcome.name, outcome.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    outcome.name,
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(outcome);
        }

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let teardown_failures = results.iter().map(|r| r.teardown.failures.len()).sum();
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Scenario results: {} passed, {} failed, {} teardown failure(s) ({} ms)",
            passed, failed, teardown_failures, duration_ms
        );

        SuiteResult {
            started_at,
            base_url: self.base_url.clone(),
            total: results.len(),
            passed,
            failed,
            teardown_failures,
            duration_ms,
            results,
        }
    }

    /// begin → steps → drain. The drain runs whatever the steps returned.
    pub async fn run_scenario(&self, scenario: &ScenarioDef) -> ScenarioOutcome {
        let start = Instant::now();
        debug!(scenario = scenario.name, "Running scenario");

        let mut ctx: ScenarioContext = ScenarioContext::new(self.api());
        ctx.begin();

        let result = (scenario.run)(&mut ctx).await;
        let last_status = ctx.world.last_status();
        let teardown = ctx.finish().await;

        if !teardown.is_clean() {
            warn!(
                scenario = scenario.name,
                failed = teardown.failures.len(),
                "teardown left entities behind"
            );
        }

        ScenarioOutcome {
            name: scenario.name.to_string(),
            tags: scenario.tags.iter().map(|t| t.to_string()).collect(),
            success: result.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
            last_status,
            error: result.err().map(|e| e.to_string()),
            teardown,
        }
    }

    /// Write suite results to `<output_dir>/shopcheck-results.json`
    pub fn write_results(&self, results: &SuiteResult) -> HarnessResult<PathBuf> {
        write_results(&self.output_dir, results)
    }
}

pub fn write_results(output_dir: &Path, results: &SuiteResult) -> HarnessResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join("shopcheck-results.json");
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}
