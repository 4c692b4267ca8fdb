//! In-memory automation provider that replays a scripted UI tree.
//!
//! Nodes can be hidden for their first lookups (`appears_after`) and report
//! disabled for their first readiness checks (`enabled_after`), so retry
//! behavior is observable without real dialogs. Every action lands in a
//! shared log for assertions, and launches build a fresh tree so runs stay
//! independent.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;

use crate::element::{UIElement, UIElementImpl};
use crate::errors::AutomationError;
use crate::provider::{Application, ApplicationImpl, AutomationProvider};
use crate::selector::Selector;

/// Blueprint for one node of the scripted tree.
#[derive(Debug, Clone, Default)]
pub struct ScriptedNode {
    role: String,
    name: Option<String>,
    automation_id: Option<String>,
    appears_after: usize,
    enabled_after: usize,
    children: Vec<ScriptedNode>,
}

impl ScriptedNode {
    pub fn new(role: &str) -> Self {
        Self {
            role: role.to_string(),
            ..Default::default()
        }
    }

    pub fn named(role: &str, name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::new(role)
        }
    }

    pub fn with_id(mut self, automation_id: &str) -> Self {
        self.automation_id = Some(automation_id.to_string());
        self
    }

    pub fn with_child(mut self, child: ScriptedNode) -> Self {
        self.children.push(child);
        self
    }

    /// Hide the node from its first `probes` matching lookups.
    pub fn appears_after(mut self, probes: usize) -> Self {
        self.appears_after = probes;
        self
    }

    /// Report "not enabled" for the first `checks` readiness queries.
    pub fn enabled_after(mut self, checks: usize) -> Self {
        self.enabled_after = checks;
        self
    }
}

struct NodeState {
    role: String,
    name: Option<String>,
    automation_id: Option<String>,
    probes_left: AtomicUsize,
    enabled_checks_left: AtomicUsize,
    value: Mutex<String>,
    parent: Weak<NodeState>,
    children: Vec<Arc<NodeState>>,
}

impl fmt::Debug for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeState")
            .field("role", &self.role)
            .field("name", &self.name)
            .field("automation_id", &self.automation_id)
            .field("children", &self.children.len())
            .finish()
    }
}

fn build(node: &ScriptedNode, parent: Weak<NodeState>) -> Arc<NodeState> {
    Arc::new_cyclic(|weak| NodeState {
        role: node.role.clone(),
        name: node.name.clone(),
        automation_id: node.automation_id.clone(),
        probes_left: AtomicUsize::new(node.appears_after),
        enabled_checks_left: AtomicUsize::new(node.enabled_after),
        value: Mutex::new(String::new()),
        parent,
        children: node
            .children
            .iter()
            .map(|child| build(child, weak.clone()))
            .collect(),
    })
}

#[derive(Debug, Default)]
struct RunLog {
    actions: Mutex<Vec<String>>,
    close_calls: AtomicUsize,
}

/// Replays one desktop blueprint for every launch.
pub struct ScriptedProvider {
    desktop: ScriptedNode,
    log: Arc<RunLog>,
    fail_launch: bool,
}

impl ScriptedProvider {
    /// `desktop` is the top-level container; its first `window` child plays
    /// the application main window.
    pub fn new(desktop: ScriptedNode) -> Self {
        Self {
            desktop,
            log: Arc::new(RunLog::default()),
            fail_launch: false,
        }
    }

    /// A provider whose launch always fails, for exercising that path.
    pub fn failing_launch() -> Self {
        Self {
            fail_launch: true,
            ..Self::new(ScriptedNode::new("desktop"))
        }
    }

    /// Everything invoked, clicked, toggled or typed so far, in order.
    pub fn actions(&self) -> Vec<String> {
        self.log.actions.lock().unwrap().clone()
    }

    pub fn close_calls(&self) -> usize {
        self.log.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AutomationProvider for ScriptedProvider {
    async fn launch(&self, application_path: &str) -> Result<Application, AutomationError> {
        if self.fail_launch {
            return Err(AutomationError::ApplicationError(format!(
                "could not start {application_path}"
            )));
        }

        let desktop = build(&self.desktop, Weak::new());
        let window = desktop
            .children
            .iter()
            .find(|child| child.role.eq_ignore_ascii_case("window"))
            .cloned()
            .ok_or_else(|| {
                AutomationError::ApplicationError(
                    "scripted desktop has no window child".to_string(),
                )
            })?;

        Ok(Application::new(Box::new(ScriptedApplication {
            desktop,
            window,
            log: self.log.clone(),
        })))
    }
}

struct ScriptedApplication {
    desktop: Arc<NodeState>,
    window: Arc<NodeState>,
    log: Arc<RunLog>,
}

impl fmt::Debug for ScriptedApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedApplication")
            .field("window", &self.window.name)
            .finish()
    }
}

impl ApplicationImpl for ScriptedApplication {
    fn main_window(&self) -> Result<UIElement, AutomationError> {
        Ok(element(self.window.clone(), self.log.clone()))
    }

    fn desktop_root(&self) -> Result<UIElement, AutomationError> {
        Ok(element(self.desktop.clone(), self.log.clone()))
    }

    fn close(&self) -> Result<(), AutomationError> {
        self.log.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone)]
struct ScriptedElement {
    node: Arc<NodeState>,
    log: Arc<RunLog>,
}

impl fmt::Debug for ScriptedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedElement")
            .field("role", &self.node.role)
            .field("name", &self.node.name)
            .field("automation_id", &self.node.automation_id)
            .finish()
    }
}

fn element(node: Arc<NodeState>, log: Arc<RunLog>) -> UIElement {
    UIElement::new(Box::new(ScriptedElement { node, log }))
}

fn validate(selector: &Selector) -> Result<(), AutomationError> {
    if let Selector::Invalid(reason) = selector {
        return Err(AutomationError::InvalidSelector(reason.clone()));
    }
    Ok(())
}

/// A hidden node consumes one probe per lookup that would otherwise match it.
fn matches_visible(node: &Arc<NodeState>, selector: &Selector) -> bool {
    if !selector.matches(
        &node.role,
        node.name.as_deref(),
        node.automation_id.as_deref(),
    ) {
        return false;
    }
    if node.probes_left.load(Ordering::SeqCst) > 0 {
        node.probes_left.fetch_sub(1, Ordering::SeqCst);
        return false;
    }
    true
}

fn collect_descendants(
    node: &Arc<NodeState>,
    selector: &Selector,
    out: &mut Vec<Arc<NodeState>>,
) {
    for child in &node.children {
        if matches_visible(child, selector) {
            out.push(child.clone());
        }
        collect_descendants(child, selector, out);
    }
}

impl ScriptedElement {
    fn label(&self) -> String {
        self.node
            .name
            .clone()
            .or_else(|| self.node.automation_id.clone())
            .unwrap_or_else(|| self.node.role.clone())
    }

    fn record(&self, entry: String) {
        self.log.actions.lock().unwrap().push(entry);
    }
}

impl UIElementImpl for ScriptedElement {
    fn role(&self) -> String {
        self.node.role.clone()
    }

    fn name(&self) -> Option<String> {
        self.node.name.clone()
    }

    fn automation_id(&self) -> Option<String> {
        self.node.automation_id.clone()
    }

    fn parent(&self) -> Result<Option<UIElement>, AutomationError> {
        Ok(self
            .node
            .parent
            .upgrade()
            .map(|parent| element(parent, self.log.clone())))
    }

    fn find_children(&self, selector: &Selector) -> Result<Vec<UIElement>, AutomationError> {
        validate(selector)?;
        Ok(self
            .node
            .children
            .iter()
            .filter(|child| matches_visible(child, selector))
            .map(|child| element(child.clone(), self.log.clone()))
            .collect())
    }

    fn find_descendants(&self, selector: &Selector) -> Result<Vec<UIElement>, AutomationError> {
        validate(selector)?;
        let mut matches = Vec::new();
        collect_descendants(&self.node, selector, &mut matches);
        Ok(matches
            .into_iter()
            .map(|node| element(node, self.log.clone()))
            .collect())
    }

    fn invoke(&self) -> Result<(), AutomationError> {
        self.record(format!("invoke:{}", self.label()));
        Ok(())
    }

    fn click(&self) -> Result<(), AutomationError> {
        self.record(format!("click:{}", self.label()));
        Ok(())
    }

    fn set_text(&self, text: &str) -> Result<(), AutomationError> {
        *self.node.value.lock().unwrap() = text.to_string();
        self.record(format!("set_text:{}={text}", self.label()));
        Ok(())
    }

    fn toggle(&self) -> Result<(), AutomationError> {
        self.record(format!("toggle:{}", self.label()));
        Ok(())
    }

    fn is_enabled(&self) -> Result<bool, AutomationError> {
        if self.node.enabled_checks_left.load(Ordering::SeqCst) > 0 {
            self.node.enabled_checks_left.fetch_sub(1, Ordering::SeqCst);
            return Ok(false);
        }
        Ok(true)
    }

    fn clone_box(&self) -> Box<dyn UIElementImpl> {
        Box::new(self.clone())
    }
}
