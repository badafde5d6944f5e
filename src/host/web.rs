//! Browser host: web-sys backed seams, event binding and the wasm entry point.

use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Array, Function, Reflect};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, Element, Event, HtmlElement, HtmlInputElement};

use super::{
    ChartBackend, DeleteTrigger, Dialog, HttpClient, HttpResponse, KeyValueStore, PanelHost,
    Surface, ToggleMount,
};
use crate::app::chart::ChartConfig;
use crate::app::delete::{self, DeleteAction};
use crate::app::theme::ThemeController;
use crate::app::AdminPanel;
use crate::config::{PanelConfig, CONFIG_ELEMENT_ID, DEFAULT_LOG_LEVEL};
use crate::error::{PanelError, Result};

/// Row fade-out duration before the row leaves the DOM
const FADE_MS: i32 = 400;

/// Class added to a row whose deletion failed
const FAILED_ROW_CLASS: &str = "delete-failed";

fn describe(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

// ============ Page ============

pub struct WebPage {
    document: Document,
    body: HtmlElement,
}

impl WebPage {
    pub fn from_window() -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| PanelError::MissingElement("document".into()))?;
        let body = document
            .body()
            .ok_or_else(|| PanelError::MissingElement("body".into()))?;
        Ok(Self { document, body })
    }

    fn find_by_class(&self, class: &str) -> Option<Element> {
        self.document
            .query_selector(&format!(".{}", class))
            .ok()
            .flatten()
    }
}

impl Surface for WebPage {
    fn claim_init(&self, marker: &str) -> bool {
        let Some(root) = self.document.document_element() else {
            return false;
        };
        if root.has_attribute(marker) {
            return false;
        }
        root.set_attribute(marker, "").is_ok()
    }

    fn release_init(&self, marker: &str) {
        if let Some(root) = self.document.document_element() {
            let _ = root.remove_attribute(marker);
        }
    }

    fn input_value(&self, name: &str) -> Option<String> {
        self.document
            .query_selector(&format!("input[name={}]", name))
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.value())
    }

    fn count_with_class(&self, class: &str) -> usize {
        self.document
            .query_selector_all(&format!(".{}", class))
            .map(|list| list.length() as usize)
            .unwrap_or(0)
    }

    fn set_body_class(&self, class: &str, present: bool) {
        let list = self.body.class_list();
        let _ = if present {
            list.add_1(class)
        } else {
            list.remove_1(class)
        };
    }

    fn mount_toggle(&self, class: &str) -> Result<ToggleMount> {
        if self.find_by_class(class).is_some() {
            return Ok(ToggleMount::Existing);
        }
        let toggle = self
            .document
            .create_element("div")
            .map_err(|e| PanelError::MissingElement(describe(e)))?;
        toggle.set_class_name(class);
        let _ = toggle.set_attribute("role", "button");
        let _ = toggle.set_attribute("aria-label", "Toggle theme");
        self.body
            .append_child(&toggle)
            .map_err(|e| PanelError::MissingElement(describe(e)))?;
        Ok(ToggleMount::Created)
    }

    fn set_toggle_icon(&self, class: &str, glyph: &str) {
        if let Some(toggle) = self.find_by_class(class) {
            toggle.set_text_content(Some(glyph));
        }
    }

    fn config_blob(&self, element_id: &str) -> Option<String> {
        self.document
            .get_element_by_id(element_id)
            .and_then(|el| el.text_content())
    }
}

// ============ localStorage ============

pub struct WebStorage;

impl WebStorage {
    fn storage() -> Result<web_sys::Storage> {
        let window = web_sys::window().ok_or_else(|| PanelError::Storage("no window".into()))?;
        window
            .local_storage()
            .map_err(|e| PanelError::Storage(describe(e)))?
            .ok_or_else(|| PanelError::Storage("localStorage not available".into()))
    }
}

impl KeyValueStore for WebStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| PanelError::Storage(describe(e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| PanelError::Storage(describe(e)))
    }
}

// ============ fetch ============

pub struct FetchClient;

#[async_trait(?Send)]
impl HttpClient for FetchClient {
    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<HttpResponse> {
        use web_sys::{Headers, Request, RequestInit, Response};

        let window = web_sys::window().ok_or_else(|| PanelError::Network("no window".into()))?;

        let headers = Headers::new().map_err(|e| PanelError::Network(describe(e)))?;
        headers
            .set(
                "Content-Type",
                "application/x-www-form-urlencoded; charset=UTF-8",
            )
            .map_err(|e| PanelError::Network(describe(e)))?;
        headers
            .set("X-Requested-With", "XMLHttpRequest")
            .map_err(|e| PanelError::Network(describe(e)))?;

        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter())
            .finish();

        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_headers(&headers);
        opts.set_body(&JsValue::from_str(&body));

        let request = Request::new_with_str_and_init(url, &opts)
            .map_err(|e| PanelError::Network(describe(e)))?;

        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| PanelError::Network(describe(e)))?;

        let resp: Response = resp_value
            .dyn_into()
            .map_err(|_| PanelError::Network("Not a Response".into()))?;

        let text = JsFuture::from(resp.text().map_err(|e| PanelError::Network(describe(e)))?)
            .await
            .map_err(|e| PanelError::Network(describe(e)))?;

        // fetch follows redirects; an expired admin session lands on the login page
        if resp.redirected() {
            return Err(PanelError::Redirected(resp.url()));
        }

        Ok(HttpResponse {
            status: resp.status(),
            body: text.as_string().unwrap_or_default(),
        })
    }
}

// ============ confirm() ============

pub struct BrowserDialog;

impl Dialog for BrowserDialog {
    fn confirm(&self, message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }
}

// ============ Chart.js ============

pub struct ChartJs {
    document: Document,
}

impl ChartBackend for ChartJs {
    fn render(&self, canvas_id: &str, config: &ChartConfig) -> Result<()> {
        let canvas = self
            .document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| PanelError::MissingElement(format!("#{}", canvas_id)))?;

        let ctor: Function = Reflect::get(&js_sys::global(), &JsValue::from_str("Chart"))
            .ok()
            .and_then(|v| v.dyn_into().ok())
            .ok_or_else(|| PanelError::Chart("Chart.js is not loaded".into()))?;

        let config =
            serde_wasm_bindgen::to_value(config).map_err(|e| PanelError::Chart(e.to_string()))?;

        Reflect::construct(&ctor, &Array::of2(&canvas, &config))
            .map_err(|e| PanelError::Chart(describe(e)))?;
        Ok(())
    }
}

// ============ Delete trigger ============

struct WebTrigger {
    event: Event,
    button: Element,
}

impl WebTrigger {
    fn row(&self) -> Option<Element> {
        self.button.closest("tr").ok().flatten()
    }
}

impl DeleteTrigger for WebTrigger {
    fn data_attr(&self, name: &str) -> Option<String> {
        self.button.get_attribute(&format!("data-{}", name))
    }

    fn in_table_row(&self) -> bool {
        self.row().is_some()
    }

    fn suppress_default(&self) {
        self.event.prevent_default();
    }

    fn remove_row(&self) {
        let Some(row) = self.row() else {
            return;
        };
        if let Some(html) = row.dyn_ref::<HtmlElement>() {
            let style = html.style();
            let _ = style.set_property("transition", &format!("opacity {}ms", FADE_MS));
            let _ = style.set_property("opacity", "0");
        }
        let remove = Closure::once_into_js(move || row.remove());
        let scheduled = web_sys::window().map(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(
                remove.unchecked_ref(),
                FADE_MS,
            )
        });
        if !matches!(scheduled, Some(Ok(_))) {
            tracing::warn!("Could not schedule row removal");
        }
    }

    fn flag_failure(&self, message: &str) {
        if let Some(row) = self.row() {
            let _ = row.class_list().add_1(FAILED_ROW_CLASS);
            let _ = row.set_attribute("title", message);
        }
    }
}

// ============ Event binding ============

/// `action` is None when delete is disabled; clicks still must not navigate.
fn bind_delete_clicks(
    document: &Document,
    action: Option<Rc<DeleteAction>>,
    delete_class: &str,
) -> Result<()> {
    let selector = format!(".{}", delete_class);
    let closure = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |event: Event| {
        let button = event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.closest(&selector).ok().flatten());
        let Some(button) = button else {
            return;
        };

        let trigger = WebTrigger { event, button };
        let Some(action) = action.clone() else {
            delete::disabled_click(&trigger);
            return;
        };
        // Must happen during dispatch; the spawned task runs after it
        trigger.suppress_default();

        spawn_local(async move {
            action.handle_click(&trigger).await;
        });
    }));
    document
        .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
        .map_err(|e| PanelError::MissingElement(describe(e)))?;
    closure.forget();
    Ok(())
}

fn bind_toggle_clicks(page: &WebPage, theme: Rc<ThemeController>, toggle_class: &str) -> Result<()> {
    let toggle = page
        .find_by_class(toggle_class)
        .ok_or_else(|| PanelError::MissingElement(format!(".{}", toggle_class)))?;
    let closure = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_event: Event| {
        theme.toggle();
    }));
    toggle
        .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
        .map_err(|e| PanelError::MissingElement(describe(e)))?;
    closure.forget();
    Ok(())
}

// ============ Logging ============

/// Buffers one formatted event and hands it to the devtools console on drop.
struct ConsoleWriter {
    buf: Vec<u8>,
}

impl std::io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        web_sys::console::log_1(&JsValue::from_str(line.trim_end()));
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    // Already installed on a re-run
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .without_time()
                .with_target(false)
                .with_writer(|| ConsoleWriter { buf: Vec::new() }),
        )
        .try_init();
}

// ============ Entry point ============

fn boot() -> Result<()> {
    let page = Rc::new(WebPage::from_window()?);
    let config = PanelConfig::load(page.config_blob(CONFIG_ELEMENT_ID).as_deref())?;
    init_logging(&config.log_level);

    let host = PanelHost {
        surface: page.clone(),
        store: Rc::new(WebStorage),
        http: Rc::new(FetchClient),
        dialog: Rc::new(BrowserDialog),
        charts: Rc::new(ChartJs {
            document: page.document.clone(),
        }),
    };

    let Some(panel) = AdminPanel::init(host, &config)? else {
        return Ok(());
    };

    bind_delete_clicks(&page.document, panel.delete, &config.delete_class)?;
    bind_toggle_clicks(&page, panel.theme, &config.toggle_class)?;
    Ok(())
}

fn report(error: &PanelError) -> JsValue {
    let message = format!("admin panel: {}", error);
    web_sys::console::error_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

/// Runs at module load; defers to DOMContentLoaded while the page is parsing.
#[wasm_bindgen(start)]
pub fn start() -> std::result::Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("admin panel: no document"))?;

    if document.ready_state() == "loading" {
        let on_ready = Closure::once_into_js(|| {
            if let Err(e) = boot() {
                report(&e);
            }
        });
        document.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref())?;
        return Ok(());
    }

    boot().map_err(|e| report(&e))
}

/// Re-run initialization by hand (e.g. after a partial page swap). No-op
/// if the page is already initialized.
#[wasm_bindgen(js_name = initAdminPanel)]
pub fn init_admin_panel() -> std::result::Result<(), JsValue> {
    boot().map_err(|e| report(&e))
}
