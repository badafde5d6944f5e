//! Panel configuration
//!
//! Built-in defaults match what the Django admin renders. A page may
//! override any of them through a JSON blob embedded as
//! `<script type="application/json" id="admin-ui-config">`.

use serde::Deserialize;

use crate::error::Result;

/// Id of the element whose text holds the optional JSON overrides.
pub const CONFIG_ELEMENT_ID: &str = "admin-ui-config";

/// Attribute set on `<html>` once the panel has initialized.
pub const INIT_MARKER: &str = "data-admin-ui";

pub const DEFAULT_DELETE_ENDPOINT: &str = "/admin/api/delete/";
pub const DEFAULT_DELETE_CLASS: &str = "delete-btn";
pub const DEFAULT_CSRF_FIELD: &str = "csrfmiddlewaretoken";
pub const DEFAULT_CONFIRM_MESSAGE: &str = "Delete this record?";
pub const DEFAULT_STORAGE_KEY: &str = "admin-theme";
pub const DEFAULT_LIGHT_CLASS: &str = "light-mode";
pub const DEFAULT_TOGGLE_CLASS: &str = "theme-toggle";
pub const DEFAULT_CANVAS_ID: &str = "usersChart";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PanelConfig {
    #[serde(default = "default_delete_endpoint")]
    pub delete_endpoint: String,

    /// Marker class carried by delete triggers
    #[serde(default = "default_delete_class")]
    pub delete_class: String,

    /// `name` of the hidden input holding the CSRF token
    #[serde(default = "default_csrf_field")]
    pub csrf_field: String,

    #[serde(default = "default_confirm_message")]
    pub confirm_message: String,

    /// localStorage key for the theme preference
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Body class present while the light theme is active
    #[serde(default = "default_light_class")]
    pub light_class: String,

    #[serde(default = "default_toggle_class")]
    pub toggle_class: String,

    #[serde(default = "default_canvas_id")]
    pub canvas_id: String,

    /// `EnvFilter` directive for the console logger
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_delete_endpoint() -> String {
    DEFAULT_DELETE_ENDPOINT.to_string()
}

fn default_delete_class() -> String {
    DEFAULT_DELETE_CLASS.to_string()
}

fn default_csrf_field() -> String {
    DEFAULT_CSRF_FIELD.to_string()
}

fn default_confirm_message() -> String {
    DEFAULT_CONFIRM_MESSAGE.to_string()
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_light_class() -> String {
    DEFAULT_LIGHT_CLASS.to_string()
}

fn default_toggle_class() -> String {
    DEFAULT_TOGGLE_CLASS.to_string()
}

fn default_canvas_id() -> String {
    DEFAULT_CANVAS_ID.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            delete_endpoint: default_delete_endpoint(),
            delete_class: default_delete_class(),
            csrf_field: default_csrf_field(),
            confirm_message: default_confirm_message(),
            storage_key: default_storage_key(),
            light_class: default_light_class(),
            toggle_class: default_toggle_class(),
            canvas_id: default_canvas_id(),
            log_level: default_log_level(),
        }
    }
}

impl PanelConfig {
    /// Load configuration: defaults, then the page's JSON overrides if any.
    pub fn load(overrides: Option<&str>) -> Result<Self> {
        let mut builder = ::config::Config::builder()
            .set_default("delete_endpoint", DEFAULT_DELETE_ENDPOINT)?
            .set_default("delete_class", DEFAULT_DELETE_CLASS)?
            .set_default("csrf_field", DEFAULT_CSRF_FIELD)?
            .set_default("confirm_message", DEFAULT_CONFIRM_MESSAGE)?
            .set_default("storage_key", DEFAULT_STORAGE_KEY)?
            .set_default("light_class", DEFAULT_LIGHT_CLASS)?
            .set_default("toggle_class", DEFAULT_TOGGLE_CLASS)?
            .set_default("canvas_id", DEFAULT_CANVAS_ID)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?;

        // A blank blob (empty <script> tag) means no overrides
        if let Some(json) = overrides.map(str::trim).filter(|s| !s.is_empty()) {
            builder = builder.add_source(::config::File::from_str(
                json,
                ::config::FileFormat::Json,
            ));
        }

        let config: PanelConfig = builder.build()?.try_deserialize()?;
        tracing::debug!(
            "Panel config loaded (endpoint {}, storage key {})",
            config.delete_endpoint,
            config.storage_key
        );
        Ok(config)
    }
}
