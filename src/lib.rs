//! ChargeNow Admin UI
//!
//! Browser-side behaviors for the ChargeNow admin panel, compiled to
//! WebAssembly and attached to the server-rendered admin pages:
//! - AJAX record deletion with confirmation and row fade-out
//! - Users vs Operators pie chart on the dashboard
//! - Dark/light theme toggle persisted to localStorage
//!
//! All page access goes through the traits in [`host`], so the behaviors
//! also run natively against [`host::memory`].

pub mod app;
pub mod config;
pub mod error;
pub mod host;

pub use app::AdminPanel;
pub use config::PanelConfig;
pub use error::PanelError;
