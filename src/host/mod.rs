//! Host seams between the panel behaviors and the page they run in.
//!
//! Every behavior talks to the browser through these traits. `web` backs
//! them with `web-sys` (wasm32 only); `memory` backs them with plain
//! in-memory state so the behaviors run natively under test.

use std::rc::Rc;

use async_trait::async_trait;

use crate::app::chart::ChartConfig;
use crate::error::Result;

pub mod memory;
#[cfg(target_arch = "wasm32")]
pub mod web;

/// Result of asking the page to mount the theme toggle control
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleMount {
    /// A new control was appended to the end of the body
    Created,
    /// A control with the toggle class was already present
    Existing,
}

/// The hosting page.
pub trait Surface {
    /// Claim the one-shot init marker. Returns false if it was already set.
    fn claim_init(&self, marker: &str) -> bool;

    /// Give the marker back so a later init can retry.
    fn release_init(&self, marker: &str);

    /// Value of the first `<input name=...>` on the page.
    fn input_value(&self, name: &str) -> Option<String>;

    /// Number of elements carrying `class`.
    fn count_with_class(&self, class: &str) -> usize;

    fn set_body_class(&self, class: &str, present: bool);

    fn mount_toggle(&self, class: &str) -> Result<ToggleMount>;

    fn set_toggle_icon(&self, class: &str, glyph: &str);

    /// Text content of the element with the given id, if present.
    fn config_blob(&self, element_id: &str) -> Option<String>;
}

/// Browser-local persistent storage (localStorage).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait(?Send)]
pub trait HttpClient {
    /// POST `fields` as an `application/x-www-form-urlencoded` body.
    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<HttpResponse>;
}

/// Blocking confirmation prompt.
pub trait Dialog {
    fn confirm(&self, message: &str) -> bool;
}

pub trait ChartBackend {
    fn render(&self, canvas_id: &str, config: &ChartConfig) -> Result<()>;
}

/// The element a delete click landed on.
pub trait DeleteTrigger {
    /// Value of `data-{name}`.
    fn data_attr(&self, name: &str) -> Option<String>;

    fn in_table_row(&self) -> bool;

    /// Stop the click from following the link or submitting a form.
    fn suppress_default(&self);

    /// Fade out and remove the enclosing table row.
    fn remove_row(&self);

    /// Mark the enclosing row as failed, with `message` as its tooltip.
    fn flag_failure(&self, message: &str);
}

/// Everything a panel needs from its host, injected at init.
#[derive(Clone)]
pub struct PanelHost {
    pub surface: Rc<dyn Surface>,
    pub store: Rc<dyn KeyValueStore>,
    pub http: Rc<dyn HttpClient>,
    pub dialog: Rc<dyn Dialog>,
    pub charts: Rc<dyn ChartBackend>,
}
