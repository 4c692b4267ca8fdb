//! The dialog-flow sequencer.
//!
//! The flow is a declarative table of ordered steps. Each step locates one
//! element inside a previously registered scope, optionally waits for it to
//! become interactable, performs exactly one action, and may register the
//! element as the scope for later steps. Optional steps absorb their own
//! absence; a required step that never materializes ends the run.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::element::UIElement;
use crate::errors::AutomationError;
use crate::provider::Application;
use crate::retry::RetryPolicy;
use crate::selector::Selector;
use crate::RunConfig;

/// Scopes pre-seeded before the first step runs.
pub const SCOPE_WINDOW: &str = "window";
pub const SCOPE_DESKTOP: &str = "desktop";

const SCOPE_STARTUP_DIALOG: &str = "startup_dialog";
const SCOPE_SOURCE_GALLERY: &str = "source_gallery";
const SCOPE_QUERY_EDITOR: &str = "query_editor";
const SCOPE_FORMULA_DIALOG: &str = "formula_dialog";
const SCOPE_PRIVACY_DIALOG: &str = "privacy_dialog";

/// Step id reported when the application cannot be launched at all.
pub const STEP_LAUNCH: &str = "launch application";
/// Step id reported when the launched application yields no window handles.
pub const STEP_ATTACH: &str = "attach to main window";

/// Where a step's lookup searches, relative to its scope element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchScope {
    Children,
    Descendants,
}

/// Where the text for a [`StepAction::SetText`] comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TextSource {
    Literal(String),
    /// The substituted query script for this run.
    Script,
}

/// The single action a step performs once its element is located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepAction {
    /// Presence of the element is the whole point of the step.
    Locate,
    Invoke,
    Click,
    Toggle,
    SetText(TextSource),
}

/// One entry of the declarative dialog flow.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowStep {
    pub id: &'static str,
    /// Required steps fail the run when their element never appears;
    /// optional steps are skipped instead.
    pub required: bool,
    /// Key of the previously registered element this step searches within.
    pub scope: &'static str,
    pub search: SearchScope,
    pub selector: Selector,
    /// Extra readiness budget: poll the located element until it reports
    /// enabled before acting on it.
    pub await_enabled: Option<Duration>,
    pub action: StepAction,
    /// Register the located element under this key for later steps.
    pub register: Option<&'static str>,
}

impl WorkflowStep {
    fn required(
        id: &'static str,
        scope: &'static str,
        search: SearchScope,
        selector: Selector,
        action: StepAction,
    ) -> Self {
        Self {
            id,
            required: true,
            scope,
            search,
            selector,
            await_enabled: None,
            action,
            register: None,
        }
    }

    fn optional(
        id: &'static str,
        scope: &'static str,
        search: SearchScope,
        selector: Selector,
        action: StepAction,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(id, scope, search, selector, action)
        }
    }

    fn registers(mut self, key: &'static str) -> Self {
        self.register = Some(key);
        self
    }

    fn ready_within(mut self, window: Duration) -> Self {
        self.await_enabled = Some(window);
        self
    }
}

/// The fixed dialog flow, in execution order.
///
/// Scope keys chain the steps together: the data source gallery is searched
/// within the main window, the query editor is a top-level sibling window
/// found under the desktop root, and everything after the editor opens is
/// searched within it.
pub fn standard_steps(config: &RunConfig) -> Vec<WorkflowStep> {
    use SearchScope::{Children, Descendants};

    vec![
        WorkflowStep::optional(
            "startup dialog",
            SCOPE_WINDOW,
            Children,
            Selector::AutomationId("KoStartDialog".to_string()),
            StepAction::Locate,
        )
        .registers(SCOPE_STARTUP_DIALOG),
        WorkflowStep::optional(
            "open data source picker",
            SCOPE_STARTUP_DIALOG,
            Descendants,
            Selector::Name("Get data".to_string()),
            StepAction::Invoke,
        ),
        WorkflowStep::required(
            "data source gallery",
            SCOPE_WINDOW,
            Descendants,
            Selector::AutomationId("DataSourceGalleryDialog".to_string()),
            StepAction::Locate,
        )
        .registers(SCOPE_SOURCE_GALLERY),
        WorkflowStep::required(
            "search data sources",
            SCOPE_SOURCE_GALLERY,
            Descendants,
            Selector::Name("Search".to_string()),
            StepAction::SetText(TextSource::Literal(config.data_source.clone())),
        ),
        WorkflowStep::required(
            "select data source",
            SCOPE_SOURCE_GALLERY,
            Descendants,
            Selector::Name(config.data_source.clone()),
            StepAction::Click,
        )
        .ready_within(config.item_ready_timeout),
        WorkflowStep::required(
            "connect to data source",
            SCOPE_SOURCE_GALLERY,
            Descendants,
            Selector::Name("Connect".to_string()),
            StepAction::Invoke,
        ),
        WorkflowStep::required(
            "query editor window",
            SCOPE_DESKTOP,
            Children,
            Selector::AutomationId("QueriesEditorWindow".to_string()),
            StepAction::Locate,
        )
        .registers(SCOPE_QUERY_EDITOR),
        WorkflowStep::required(
            "open advanced editor",
            SCOPE_QUERY_EDITOR,
            Descendants,
            Selector::Name("Advanced Editor".to_string()),
            StepAction::Invoke,
        ),
        WorkflowStep::required(
            "advanced editor dialog",
            SCOPE_QUERY_EDITOR,
            Descendants,
            Selector::AutomationId("ViewFormulaDialog".to_string()),
            StepAction::Locate,
        )
        .registers(SCOPE_FORMULA_DIALOG),
        WorkflowStep::required(
            "inject script",
            SCOPE_FORMULA_DIALOG,
            Descendants,
            Selector::Role("edit".to_string()),
            StepAction::SetText(TextSource::Script),
        ),
        WorkflowStep::required(
            "confirm script",
            SCOPE_FORMULA_DIALOG,
            Descendants,
            Selector::Name("Done".to_string()),
            StepAction::Invoke,
        ),
        WorkflowStep::required(
            "invoke query function",
            SCOPE_QUERY_EDITOR,
            Descendants,
            Selector::Name("Invoke".to_string()),
            StepAction::Invoke,
        ),
        WorkflowStep::optional(
            "acknowledge privacy prompt",
            SCOPE_QUERY_EDITOR,
            Descendants,
            Selector::Name("Continue".to_string()),
            StepAction::Invoke,
        ),
        WorkflowStep::optional(
            "privacy levels dialog",
            SCOPE_QUERY_EDITOR,
            Descendants,
            Selector::AutomationId("FirewallDialog".to_string()),
            StepAction::Locate,
        )
        .registers(SCOPE_PRIVACY_DIALOG),
        WorkflowStep::optional(
            "toggle privacy level",
            SCOPE_PRIVACY_DIALOG,
            Descendants,
            Selector::Role("checkbox".to_string()),
            StepAction::Toggle,
        ),
        WorkflowStep::optional(
            "save privacy levels",
            SCOPE_PRIVACY_DIALOG,
            Descendants,
            Selector::Name("Save".to_string()),
            StepAction::Invoke,
        ),
        WorkflowStep::required(
            "results grid",
            SCOPE_QUERY_EDITOR,
            Descendants,
            Selector::Role("datagrid".to_string()),
            StepAction::Locate,
        ),
    ]
}

/// Outcome of one full workflow run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub passed: bool,
    /// Steps fully executed before the run ended.
    pub steps_run: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl RunReport {
    pub(crate) fn success(steps_run: usize) -> Self {
        Self {
            passed: true,
            steps_run,
            failed_step: None,
            failure: None,
        }
    }

    pub(crate) fn failed(step: &str, error: &AutomationError, steps_run: usize) -> Self {
        Self {
            passed: false,
            steps_run,
            failed_step: Some(step.to_string()),
            failure: Some(error.to_string()),
        }
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A required step that escalated, with how far the run got first.
pub(crate) struct StepFailure {
    pub step: &'static str,
    pub error: AutomationError,
    pub steps_run: usize,
}

/// Drive `steps` strictly in order against one launched application.
///
/// Every escalated failure is returned, never propagated further; teardown
/// stays with the caller so it runs on both outcomes.
pub(crate) async fn run_steps(
    app: &Application,
    steps: &[WorkflowStep],
    script: &str,
    policy: &RetryPolicy,
) -> Result<usize, StepFailure> {
    let attach = |error| StepFailure {
        step: STEP_ATTACH,
        error,
        steps_run: 0,
    };
    let window = app.main_window().map_err(attach)?;
    let desktop = app.desktop_root().map_err(attach)?;

    let mut scopes: HashMap<&'static str, UIElement> = HashMap::new();
    scopes.insert(SCOPE_WINDOW, window);
    scopes.insert(SCOPE_DESKTOP, desktop);

    info!(steps = steps.len(), "driving dialog flow");
    for (index, step) in steps.iter().enumerate() {
        execute_step(step, &mut scopes, script, policy)
            .await
            .map_err(|error| StepFailure {
                step: step.id,
                error,
                steps_run: index,
            })?;
    }
    info!("dialog flow complete");

    Ok(steps.len())
}

/// Locate, optionally await readiness, act, and register. The uniform
/// executor for every step; required-vs-optional branching lives here and
/// nowhere else.
async fn execute_step(
    step: &WorkflowStep,
    scopes: &mut HashMap<&'static str, UIElement>,
    script: &str,
    policy: &RetryPolicy,
) -> Result<(), AutomationError> {
    let Some(scope) = scopes.get(step.scope).cloned() else {
        if step.required {
            return Err(AutomationError::ElementNotFound(format!(
                "scope '{}' was never registered",
                step.scope
            )));
        }
        debug!(step = step.id, scope = step.scope, "scope absent, skipping optional step");
        return Ok(());
    };

    debug!(step = step.id, selector = %step.selector, "locating");
    let found = policy
        .wait_for(step.id, || match step.search {
            SearchScope::Children => scope.find_child(&step.selector),
            SearchScope::Descendants => scope.find_descendant(&step.selector),
        })
        .await;

    let element = match found {
        Ok(element) => element,
        // Absence of an optional step is swallowed here; everything else
        // escalates to the sequencer.
        Err(err @ AutomationError::Timeout(_)) if !step.required => {
            debug!(step = step.id, "optional step never appeared: {err}");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    if let Some(window) = step.await_enabled {
        policy
            .one_window(window)
            .wait_for(step.id, || Ok(element.is_enabled()?.then_some(())))
            .await
            .map_err(|err| match err {
                AutomationError::Timeout(_) => AutomationError::ElementNotEnabled(format!(
                    "'{}' still not interactable after {window:?}",
                    element.display_name()
                )),
                other => other,
            })?;
    }

    match &step.action {
        StepAction::Locate => {}
        StepAction::Invoke => element.invoke()?,
        StepAction::Click => element.click()?,
        StepAction::Toggle => element.toggle()?,
        StepAction::SetText(source) => {
            let text = match source {
                TextSource::Literal(literal) => literal.as_str(),
                TextSource::Script => script,
            };
            element.set_text(text)?;
        }
    }
    debug!(step = step.id, element = %element.display_name(), "step complete");

    if let Some(key) = step.register {
        scopes.insert(key, element);
    }
    Ok(())
}
