//! Admin panel behaviors and the controller that wires them to a page.

use std::rc::Rc;

pub mod chart;
pub mod delete;
pub mod theme;

use chart::DashboardChart;
use delete::DeleteAction;
use theme::ThemeController;

use crate::config::{PanelConfig, INIT_MARKER};
use crate::error::Result;
use crate::host::PanelHost;

/// The behaviors attached to one page load.
pub struct AdminPanel {
    pub theme: Rc<ThemeController>,
    /// None when the page has delete buttons but no CSRF field
    pub delete: Option<Rc<DeleteAction>>,
    pub chart_rendered: bool,
}

impl AdminPanel {
    /// Attach every behavior to the page.
    ///
    /// Returns `Ok(None)` if the page was already initialized, so running
    /// init twice never mounts a second toggle or a second set of
    /// listeners. Only a failure to mount the theme toggle is fatal; the
    /// delete action and chart degrade to disabled with a logged
    /// diagnostic.
    pub fn init(host: PanelHost, config: &PanelConfig) -> Result<Option<Self>> {
        if !host.surface.claim_init(INIT_MARKER) {
            tracing::debug!("Admin panel already initialized on this page");
            return Ok(None);
        }

        let theme = match ThemeController::mount(host.surface.clone(), host.store.clone(), config)
        {
            Ok(theme) => Rc::new(theme),
            Err(e) => {
                // Let a later initAdminPanel() retry
                host.surface.release_init(INIT_MARKER);
                return Err(e);
            }
        };

        let delete = match DeleteAction::bind(
            host.surface.clone(),
            host.http.clone(),
            host.dialog.clone(),
            config,
        ) {
            Ok(action) => Some(Rc::new(action)),
            Err(e) => {
                tracing::error!("Delete buttons disabled: {}", e);
                None
            }
        };

        let chart_rendered = match DashboardChart::new(config.canvas_id.as_str())
            .render(host.charts.as_ref())
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Dashboard chart not rendered: {}", e);
                false
            }
        };

        tracing::info!(
            "Admin panel ready (theme {}, delete {}, chart {})",
            theme.get().as_str(),
            if delete.is_some() { "on" } else { "off" },
            if chart_rendered { "on" } else { "off" }
        );

        Ok(Some(Self {
            theme,
            delete,
            chart_rendered,
        }))
    }
}
