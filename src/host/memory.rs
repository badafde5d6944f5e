//! In-memory host for running the panel outside a browser.
//!
//! Each type records what the behaviors did to it so tests can assert on
//! the resulting page, storage and network traffic.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use async_trait::async_trait;

use super::{
    ChartBackend, DeleteTrigger, Dialog, HttpClient, HttpResponse, KeyValueStore, Surface,
    ToggleMount,
};
use crate::app::chart::ChartConfig;
use crate::error::{PanelError, Result};

// =============================================================================
// Page
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
struct ToggleNode {
    class: String,
    icon: String,
}

#[derive(Default)]
pub struct MemoryPage {
    markers: RefCell<HashSet<String>>,
    inputs: RefCell<HashMap<String, String>>,
    class_counts: RefCell<HashMap<String, usize>>,
    body_classes: RefCell<BTreeSet<String>>,
    toggles: RefCell<Vec<ToggleNode>>,
    blobs: RefCell<HashMap<String, String>>,
    fail_mount: Cell<bool>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(&self, name: &str, value: &str) {
        self.inputs
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_input(&self, name: &str) {
        self.inputs.borrow_mut().remove(name);
    }

    /// Add one element carrying `class` (e.g. a delete button).
    pub fn add_class_element(&self, class: &str) {
        *self
            .class_counts
            .borrow_mut()
            .entry(class.to_string())
            .or_default() += 1;
    }

    pub fn add_config_blob(&self, element_id: &str, text: &str) {
        self.blobs
            .borrow_mut()
            .insert(element_id.to_string(), text.to_string());
    }

    pub fn body_has_class(&self, class: &str) -> bool {
        self.body_classes.borrow().contains(class)
    }

    pub fn toggle_count(&self) -> usize {
        self.toggles.borrow().len()
    }

    pub fn toggle_icon(&self) -> Option<String> {
        self.toggles.borrow().first().map(|t| t.icon.clone())
    }

    /// Make mounting the toggle fail, as when the body is missing.
    pub fn fail_mount(&self, fail: bool) {
        self.fail_mount.set(fail);
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.markers.borrow().contains(marker)
    }
}

impl Surface for MemoryPage {
    fn claim_init(&self, marker: &str) -> bool {
        self.markers.borrow_mut().insert(marker.to_string())
    }

    fn release_init(&self, marker: &str) {
        self.markers.borrow_mut().remove(marker);
    }

    fn input_value(&self, name: &str) -> Option<String> {
        self.inputs.borrow().get(name).cloned()
    }

    fn count_with_class(&self, class: &str) -> usize {
        let elements = self.class_counts.borrow().get(class).copied().unwrap_or(0);
        let toggles = self
            .toggles
            .borrow()
            .iter()
            .filter(|t| t.class == class)
            .count();
        elements + toggles
    }

    fn set_body_class(&self, class: &str, present: bool) {
        let mut classes = self.body_classes.borrow_mut();
        if present {
            classes.insert(class.to_string());
        } else {
            classes.remove(class);
        }
    }

    fn mount_toggle(&self, class: &str) -> Result<ToggleMount> {
        if self.fail_mount.get() {
            return Err(PanelError::MissingElement("body".into()));
        }
        let mut toggles = self.toggles.borrow_mut();
        if toggles.iter().any(|t| t.class == class) {
            return Ok(ToggleMount::Existing);
        }
        toggles.push(ToggleNode {
            class: class.to_string(),
            icon: String::new(),
        });
        Ok(ToggleMount::Created)
    }

    fn set_toggle_icon(&self, class: &str, glyph: &str) {
        for toggle in self
            .toggles
            .borrow_mut()
            .iter_mut()
            .filter(|t| t.class == class)
        {
            toggle.icon = glyph.to_string();
        }
    }

    fn config_blob(&self, element_id: &str) -> Option<String> {
        self.blobs.borrow().get(element_id).cloned()
    }
}

// =============================================================================
// Storage
// =============================================================================

#[derive(Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        store
    }

    /// Make reads fail, as when storage is disabled.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    /// Make writes fail, as when the quota is exceeded.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.get() {
            return Err(PanelError::Storage("storage disabled".into()));
        }
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(PanelError::Storage("quota exceeded".into()));
        }
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// HTTP
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub fields: Vec<(String, String)>,
}

/// Records every POST. Answers queued responses in order, then
/// `200 {"success": true}` once the queue is empty.
#[derive(Default)]
pub struct RecordingHttp {
    requests: RefCell<Vec<RecordedRequest>>,
    replies: RefCell<VecDeque<Result<HttpResponse>>>,
}

impl RecordingHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: HttpResponse) {
        self.replies.borrow_mut().push_back(Ok(response));
    }

    pub fn fail_next(&self, error: PanelError) {
        self.replies.borrow_mut().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl HttpClient for RecordingHttp {
    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(RecordedRequest {
            url: url.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        let reply = self.replies.borrow_mut().pop_front();
        reply.unwrap_or_else(|| {
            Ok(HttpResponse {
                status: 200,
                body: r#"{"success": true}"#.to_string(),
            })
        })
    }
}

// =============================================================================
// Dialog
// =============================================================================

/// Answers confirm prompts from a script; declines once it runs out.
#[derive(Default)]
pub struct ScriptedDialog {
    answers: RefCell<VecDeque<bool>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedDialog {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().copied().collect()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl Dialog for ScriptedDialog {
    fn confirm(&self, message: &str) -> bool {
        self.prompts.borrow_mut().push(message.to_string());
        self.answers.borrow_mut().pop_front().unwrap_or(false)
    }
}

// =============================================================================
// Charts
// =============================================================================

#[derive(Default)]
pub struct RecordingCharts {
    canvases: HashSet<String>,
    rendered: RefCell<Vec<(String, ChartConfig)>>,
}

impl RecordingCharts {
    /// A page with no canvases at all.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_canvas(canvas_id: &str) -> Self {
        let mut charts = Self::default();
        charts.canvases.insert(canvas_id.to_string());
        charts
    }

    pub fn rendered(&self) -> Vec<(String, ChartConfig)> {
        self.rendered.borrow().clone()
    }
}

impl ChartBackend for RecordingCharts {
    fn render(&self, canvas_id: &str, config: &ChartConfig) -> Result<()> {
        if !self.canvases.contains(canvas_id) {
            return Err(PanelError::MissingElement(format!("#{}", canvas_id)));
        }
        self.rendered
            .borrow_mut()
            .push((canvas_id.to_string(), config.clone()));
        Ok(())
    }
}

// =============================================================================
// Delete trigger
// =============================================================================

/// A delete button inside a changelist row.
pub struct MemoryRow {
    attrs: HashMap<String, String>,
    in_row: bool,
    default_suppressed: Cell<bool>,
    removed: Cell<bool>,
    failure: RefCell<Option<String>>,
}

impl MemoryRow {
    pub fn new(model: &str, id: &str) -> Self {
        Self::without_attrs()
            .with_attr("model", model)
            .with_attr("id", id)
    }

    pub fn without_attrs() -> Self {
        Self {
            attrs: HashMap::new(),
            in_row: true,
            default_suppressed: Cell::new(false),
            removed: Cell::new(false),
            failure: RefCell::new(None),
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    /// The button sits outside any `<tr>`.
    pub fn detached(mut self) -> Self {
        self.in_row = false;
        self
    }

    pub fn default_suppressed(&self) -> bool {
        self.default_suppressed.get()
    }

    pub fn removed(&self) -> bool {
        self.removed.get()
    }

    pub fn failure(&self) -> Option<String> {
        self.failure.borrow().clone()
    }
}

impl DeleteTrigger for MemoryRow {
    fn data_attr(&self, name: &str) -> Option<String> {
        self.attrs.get(name).cloned()
    }

    fn in_table_row(&self) -> bool {
        self.in_row
    }

    fn suppress_default(&self) {
        self.default_suppressed.set(true);
    }

    fn remove_row(&self) {
        self.removed.set(true);
    }

    fn flag_failure(&self, message: &str) {
        *self.failure.borrow_mut() = Some(message.to_string());
    }
}
