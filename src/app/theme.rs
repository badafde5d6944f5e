//! Dark/light theme toggle with localStorage persistence.
//!
//! `ThemeController` owns the current theme. The body class and the toggle
//! icon are only ever written by `project`, so the page always mirrors the
//! controller's state.

use std::cell::Cell;
use std::rc::Rc;

use crate::config::PanelConfig;
use crate::error::Result;
use crate::host::{KeyValueStore, Surface, ToggleMount};

/// Theme options
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Parse a stored preference. Anything but `"light"` is dark.
    pub fn parse(s: &str) -> Self {
        match s {
            "light" => Theme::Light,
            _ => Theme::Dark,
        }
    }

    /// Glyph shown on the toggle control
    pub fn icon(&self) -> &'static str {
        match self {
            Theme::Dark => "\u{1F319}",
            Theme::Light => "\u{2600}\u{FE0F}",
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

pub struct ThemeController {
    current: Cell<Theme>,
    surface: Rc<dyn Surface>,
    store: Rc<dyn KeyValueStore>,
    storage_key: String,
    light_class: String,
    toggle_class: String,
}

impl ThemeController {
    /// Mount the toggle control, restore the saved preference and apply it.
    pub fn mount(
        surface: Rc<dyn Surface>,
        store: Rc<dyn KeyValueStore>,
        config: &PanelConfig,
    ) -> Result<Self> {
        if surface.mount_toggle(&config.toggle_class)? == ToggleMount::Existing {
            tracing::debug!("Theme toggle already on page, reusing it");
        }

        let saved = load_theme_from_storage(store.as_ref(), &config.storage_key);
        let controller = Self {
            current: Cell::new(saved),
            surface,
            store,
            storage_key: config.storage_key.clone(),
            light_class: config.light_class.clone(),
            toggle_class: config.toggle_class.clone(),
        };
        controller.project();
        tracing::debug!("Theme restored: {}", saved.as_str());
        Ok(controller)
    }

    /// Get current theme
    pub fn get(&self) -> Theme {
        self.current.get()
    }

    /// Flip the theme, persist it and re-apply it. Returns the new theme.
    pub fn toggle(&self) -> Theme {
        let next = self.current.get().flipped();
        self.current.set(next);

        if let Err(e) = self.store.set(&self.storage_key, next.as_str()) {
            tracing::warn!("Failed to save theme preference: {}", e);
        }

        self.project();
        next
    }

    fn project(&self) {
        let theme = self.current.get();
        self.surface
            .set_body_class(&self.light_class, theme == Theme::Light);
        self.surface
            .set_toggle_icon(&self.toggle_class, theme.icon());
    }
}

fn load_theme_from_storage(store: &dyn KeyValueStore, key: &str) -> Theme {
    match store.get(key) {
        Ok(Some(value)) => Theme::parse(&value),
        Ok(None) => Theme::default(),
        Err(e) => {
            tracing::warn!("Theme preference unreadable, using dark: {}", e);
            Theme::default()
        }
    }
}
