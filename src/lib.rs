//! UI-driven verification of query scripts against a desktop application.
//!
//! This crate drives Power BI Desktop (or anything exposing the same dialog
//! flow through an [`AutomationProvider`]) end-to-end: dismiss the startup
//! dialog, pick a data source, inject a query script into the advanced
//! editor, execute it and check that a results grid shows up. Element
//! lookups go through a bounded retry poller, so dialogs that load
//! asynchronously do not fail the run prematurely.
//!
//! One run drives exactly one freshly launched application instance and
//! closes it on every outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

pub mod element;
pub mod errors;
pub mod provider;
pub mod providers;
pub mod retry;
pub mod script;
pub mod selector;
#[cfg(test)]
mod tests;
pub mod workflow;

pub use element::{UIElement, UIElementImpl};
pub use errors::AutomationError;
pub use provider::{Application, ApplicationImpl, AutomationProvider};
pub use retry::{linear_backoff, BackoffSchedule, RetryPolicy};
pub use script::{resolve_config_path, QueryScript, CONFIG_PATH_TOKEN};
pub use selector::Selector;
pub use workflow::{standard_steps, RunReport, StepAction, WorkflowStep};

/// Tunables for one verification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Binary path handed to the provider's launcher.
    pub application_path: String,
    /// Configuration file substituted for the script's placeholder token,
    /// resolved against the working directory when relative.
    pub config_file: PathBuf,
    /// Data source searched for and selected in the gallery.
    pub data_source: String,
    /// How long the selected gallery item may take to become interactable.
    pub item_ready_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            application_path:
                r"C:\Program Files\Microsoft Power BI Desktop\bin\PBIDesktop.exe".to_string(),
            config_file: PathBuf::from("appsettings.json"),
            data_source: "Blank Query".to_string(),
            item_ready_timeout: Duration::from_secs(30),
        }
    }
}

/// The main entry point: drives one application instance per script run.
pub struct QueryRunner {
    provider: Arc<dyn AutomationProvider>,
    config: RunConfig,
    policy: RetryPolicy,
}

impl QueryRunner {
    pub fn new(provider: Arc<dyn AutomationProvider>) -> Self {
        Self {
            provider,
            config: RunConfig::default(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Load a script file, substitute its configuration placeholder, and run
    /// it through the full dialog flow.
    #[instrument(skip(self, script_path), fields(script = %script_path.as_ref().display()))]
    pub async fn run_script_file(&self, script_path: impl AsRef<Path>) -> RunReport {
        let config_path = script::resolve_config_path(&self.config.config_file);
        let script = QueryScript::load(script_path.as_ref())
            .with_config_path(&config_path.to_string_lossy());
        self.run_script(script).await
    }

    /// Run an in-memory script whose placeholder was already resolved.
    pub async fn run_script(&self, script: QueryScript) -> RunReport {
        let app = match self.provider.launch(&self.config.application_path).await {
            Ok(app) => app,
            Err(err) => {
                error!("could not launch {}: {err}", self.config.application_path);
                return RunReport::failed(workflow::STEP_LAUNCH, &err, 0);
            }
        };

        let steps = workflow::standard_steps(&self.config);
        let outcome = workflow::run_steps(&app, &steps, script.text(), &self.policy).await;

        // Once launch succeeded the application is closed on every path.
        if let Err(err) = app.close() {
            warn!("failed to close application: {err}");
        }

        match outcome {
            Ok(steps_run) => {
                info!(steps_run, "run passed");
                RunReport::success(steps_run)
            }
            Err(failed) => {
                error!(step = failed.step, "run failed: {}", failed.error);
                RunReport::failed(failed.step, &failed.error, failed.steps_run)
            }
        }
    }

    /// The flattened Boolean surface for test-runner callers; step identity
    /// and cause stay in the logs and in [`RunReport`].
    pub async fn verify_script_file(&self, script_path: impl AsRef<Path>) -> bool {
        self.run_script_file(script_path).await.passed
    }
}
