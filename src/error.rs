//! Error type shared by every admin panel behavior.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    /// A page element the behavior needs is not in the document.
    #[error("required page element is missing: {0}")]
    MissingElement(String),

    #[error("delete trigger has no data-{0} attribute")]
    MissingAttribute(&'static str),

    /// localStorage disabled, blocked by privacy settings, or over quota
    #[error("local storage unavailable: {0}")]
    Storage(String),

    #[error("request failed: {0}")]
    Network(String),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("server rejected the deletion")]
    Rejected,

    /// Usually the admin session expired and the endpoint bounced to login
    #[error("request was redirected to {0}")]
    Redirected(String),

    #[error("server did not acknowledge the deletion")]
    UnexpectedBody,

    #[error("chart rendering failed: {0}")]
    Chart(String),

    #[error("invalid panel configuration: {0}")]
    Config(#[from] ::config::ConfigError),
}

pub type Result<T> = std::result::Result<T, PanelError>;
