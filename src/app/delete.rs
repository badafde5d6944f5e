//! AJAX delete for admin changelist rows.
//!
//! Each row's trigger carries `data-model` / `data-id`. A confirmed click
//! POSTs them with the page's CSRF token and fades the row out on success.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use serde::Deserialize;

use crate::config::PanelConfig;
use crate::error::{PanelError, Result};
use crate::host::{DeleteTrigger, Dialog, HttpClient, HttpResponse, Surface};

/// Models the admin delete endpoint knows how to remove
pub const KNOWN_MODELS: &[&str] = &[
    "user",
    "operator",
    "van",
    "uservehicle",
    "request",
    "booking",
    "payment",
    "feedback",
];

/// The record a click asks to delete
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeleteTarget {
    pub model: String,
    pub id: String,
}

impl DeleteTarget {
    pub fn from_trigger(trigger: &dyn DeleteTrigger) -> Result<Self> {
        let model = trigger
            .data_attr("model")
            .filter(|m| !m.is_empty())
            .ok_or(PanelError::MissingAttribute("model"))?;
        let id = trigger
            .data_attr("id")
            .filter(|i| !i.is_empty())
            .ok_or(PanelError::MissingAttribute("id"))?;
        Ok(Self { model, id })
    }
}

/// Form body sent to the delete endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteRequest {
    pub model: String,
    pub id: String,
    pub csrfmiddlewaretoken: String,
}

impl DeleteRequest {
    pub fn fields(&self) -> [(&'static str, &str); 3] {
        [
            ("model", self.model.as_str()),
            ("id", self.id.as_str()),
            ("csrfmiddlewaretoken", self.csrfmiddlewaretoken.as_str()),
        ]
    }
}

/// `{"success": bool}` as answered by the admin endpoint
#[derive(Debug, Deserialize)]
struct DeleteAck {
    success: bool,
}

/// What a single click ended up doing
#[derive(Debug)]
pub enum DeleteOutcome {
    /// Row removed after a successful request
    Deleted(DeleteTarget),
    /// The user said no; nothing was sent
    Declined,
    /// A request for the same record is still in flight
    AlreadyPending,
    /// The trigger is not inside a table row
    Ignored,
    /// Delete is turned off on this page; the click only had its default stopped
    Disabled,
    Failed(PanelError),
}

/// Handle a click that landed on a delete trigger while delete is off.
///
/// The triggers are `href="#"` anchors, so the default still has to be
/// stopped or the click scrolls the page to the top.
pub fn disabled_click(trigger: &dyn DeleteTrigger) -> DeleteOutcome {
    trigger.suppress_default();
    tracing::warn!("Delete is disabled on this page (missing CSRF field)");
    DeleteOutcome::Disabled
}

pub struct DeleteAction {
    surface: Rc<dyn Surface>,
    http: Rc<dyn HttpClient>,
    dialog: Rc<dyn Dialog>,
    endpoint: String,
    csrf_field: String,
    confirm_message: String,
    in_flight: RefCell<HashSet<DeleteTarget>>,
}

impl DeleteAction {
    /// Bind to the page. Fails if it shows delete buttons but no CSRF field.
    pub fn bind(
        surface: Rc<dyn Surface>,
        http: Rc<dyn HttpClient>,
        dialog: Rc<dyn Dialog>,
        config: &PanelConfig,
    ) -> Result<Self> {
        let buttons = surface.count_with_class(&config.delete_class);
        if buttons > 0 && surface.input_value(&config.csrf_field).is_none() {
            return Err(PanelError::MissingElement(format!(
                "input[name={}]",
                config.csrf_field
            )));
        }
        tracing::debug!("Delete action bound ({} buttons on page)", buttons);

        Ok(Self {
            surface,
            http,
            dialog,
            endpoint: config.delete_endpoint.clone(),
            csrf_field: config.csrf_field.clone(),
            confirm_message: config.confirm_message.clone(),
            in_flight: RefCell::new(HashSet::new()),
        })
    }

    /// Handle one click on a delete trigger.
    pub async fn handle_click(&self, trigger: &dyn DeleteTrigger) -> DeleteOutcome {
        trigger.suppress_default();

        if !trigger.in_table_row() {
            tracing::debug!("Delete trigger outside a table row, ignoring");
            return DeleteOutcome::Ignored;
        }

        let target = match DeleteTarget::from_trigger(trigger) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("Malformed delete trigger: {}", e);
                return DeleteOutcome::Failed(e);
            }
        };

        if self.in_flight.borrow().contains(&target) {
            tracing::debug!("Delete of {} {} already in flight", target.model, target.id);
            return DeleteOutcome::AlreadyPending;
        }

        if !self.dialog.confirm(&self.confirm_message) {
            return DeleteOutcome::Declined;
        }

        let Some(token) = self.surface.input_value(&self.csrf_field) else {
            let e = PanelError::MissingElement(format!("input[name={}]", self.csrf_field));
            tracing::error!("Cannot delete {} {}: {}", target.model, target.id, e);
            trigger.flag_failure(&e.to_string());
            return DeleteOutcome::Failed(e);
        };

        if !KNOWN_MODELS.contains(&target.model.as_str()) {
            tracing::warn!("Deleting unrecognised model {:?}", target.model);
        }

        let request = DeleteRequest {
            model: target.model.clone(),
            id: target.id.clone(),
            csrfmiddlewaretoken: token,
        };

        self.in_flight.borrow_mut().insert(target.clone());
        let result = self.submit(&request).await;
        self.in_flight.borrow_mut().remove(&target);

        match result {
            Ok(()) => {
                tracing::info!("Deleted {} {}", target.model, target.id);
                trigger.remove_row();
                DeleteOutcome::Deleted(target)
            }
            Err(e) => {
                tracing::error!("Delete of {} {} failed: {}", target.model, target.id, e);
                trigger.flag_failure(&e.to_string());
                DeleteOutcome::Failed(e)
            }
        }
    }

    async fn submit(&self, request: &DeleteRequest) -> Result<()> {
        let response = self.http.post_form(&self.endpoint, &request.fields()).await?;
        check_response(&response)
    }
}

fn check_response(response: &HttpResponse) -> Result<()> {
    if !response.is_success() {
        return Err(PanelError::Status(response.status));
    }
    if response.body.trim().is_empty() {
        return Ok(());
    }
    // A login page served with 200 is not an acknowledgement
    match serde_json::from_str::<DeleteAck>(&response.body) {
        Ok(DeleteAck { success: true }) => Ok(()),
        Ok(DeleteAck { success: false }) => Err(PanelError::Rejected),
        Err(_) => Err(PanelError::UnexpectedBody),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{MemoryPage, MemoryRow, RecordingHttp, ScriptedDialog};

    struct Fixture {
        page: Rc<MemoryPage>,
        http: Rc<RecordingHttp>,
        dialog: Rc<ScriptedDialog>,
        action: DeleteAction,
    }

    fn fixture(answers: &[bool]) -> Fixture {
        let page = Rc::new(MemoryPage::new());
        page.add_input("csrfmiddlewaretoken", "tok-123");
        page.add_class_element("delete-btn");
        let http = Rc::new(RecordingHttp::new());
        let dialog = Rc::new(ScriptedDialog::new(answers));
        let action = DeleteAction::bind(
            page.clone(),
            http.clone(),
            dialog.clone(),
            &PanelConfig::default(),
        )
        .expect("bind delete action");
        Fixture {
            page,
            http,
            dialog,
            action,
        }
    }

    #[test]
    fn test_bind_requires_csrf_field_when_buttons_present() {
        let page = Rc::new(MemoryPage::new());
        page.add_class_element("delete-btn");
        let result = DeleteAction::bind(
            page,
            Rc::new(RecordingHttp::new()),
            Rc::new(ScriptedDialog::new(&[])),
            &PanelConfig::default(),
        );

        match result {
            Err(PanelError::MissingElement(what)) => {
                assert_eq!(what, "input[name=csrfmiddlewaretoken]")
            }
            Err(other) => panic!("unexpected error {:?}", other),
            Ok(_) => panic!("bind should fail without a CSRF field"),
        }
    }

    #[test]
    fn test_bind_without_buttons_needs_no_csrf_field() {
        let result = DeleteAction::bind(
            Rc::new(MemoryPage::new()),
            Rc::new(RecordingHttp::new()),
            Rc::new(ScriptedDialog::new(&[])),
            &PanelConfig::default(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_confirmed_click_posts_and_removes_row() {
        let f = fixture(&[true]);
        let row = MemoryRow::new("user", "42");

        let outcome = tokio_test::block_on(f.action.handle_click(&row));

        assert!(matches!(outcome, DeleteOutcome::Deleted(ref t) if t.model == "user" && t.id == "42"));
        assert!(row.default_suppressed());
        assert!(row.removed());

        let requests = f.http.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "/admin/api/delete/");
        assert_eq!(
            requests[0].fields,
            vec![
                ("model".to_string(), "user".to_string()),
                ("id".to_string(), "42".to_string()),
                ("csrfmiddlewaretoken".to_string(), "tok-123".to_string()),
            ]
        );
        assert_eq!(f.dialog.prompts(), vec!["Delete this record?".to_string()]);
    }

    #[test]
    fn test_declined_click_sends_nothing() {
        let f = fixture(&[false]);
        let row = MemoryRow::new("user", "42");

        let outcome = tokio_test::block_on(f.action.handle_click(&row));

        assert!(matches!(outcome, DeleteOutcome::Declined));
        assert!(f.http.requests().is_empty());
        assert!(!row.removed());
        assert!(row.default_suppressed());
    }

    #[test]
    fn test_error_status_flags_row() {
        let f = fixture(&[true]);
        f.http.respond(HttpResponse {
            status: 403,
            body: "CSRF verification failed".into(),
        });
        let row = MemoryRow::new("booking", "7");

        let outcome = tokio_test::block_on(f.action.handle_click(&row));

        assert!(matches!(outcome, DeleteOutcome::Failed(PanelError::Status(403))));
        assert!(!row.removed());
        assert_eq!(
            row.failure().as_deref(),
            Some("server responded with status 403")
        );
    }

    #[test]
    fn test_explicit_refusal_is_failure() {
        let f = fixture(&[true]);
        f.http.respond(HttpResponse {
            status: 200,
            body: r#"{"success": false}"#.into(),
        });
        let row = MemoryRow::new("van", "3");

        let outcome = tokio_test::block_on(f.action.handle_click(&row));

        assert!(matches!(outcome, DeleteOutcome::Failed(PanelError::Rejected)));
        assert!(!row.removed());
    }

    #[test]
    fn test_network_error_flags_row() {
        let f = fixture(&[true]);
        f.http
            .fail_next(PanelError::Network("connection reset".into()));
        let row = MemoryRow::new("payment", "11");

        let outcome = tokio_test::block_on(f.action.handle_click(&row));

        assert!(matches!(outcome, DeleteOutcome::Failed(PanelError::Network(_))));
        assert!(row.failure().is_some());
        assert!(!row.removed());
    }

    #[test]
    fn test_login_page_body_is_not_success() {
        let f = fixture(&[true]);
        f.http.respond(HttpResponse {
            status: 200,
            body: r#"<!DOCTYPE html><html><body><form id="login-form" method="post"></form></body></html>"#.into(),
        });
        let row = MemoryRow::new("operator", "9");

        let outcome = tokio_test::block_on(f.action.handle_click(&row));

        assert!(matches!(outcome, DeleteOutcome::Failed(PanelError::UnexpectedBody)));
        assert!(!row.removed());
        assert_eq!(
            row.failure().as_deref(),
            Some("server did not acknowledge the deletion")
        );
    }

    #[test]
    fn test_redirected_request_flags_row() {
        let f = fixture(&[true]);
        f.http.fail_next(PanelError::Redirected(
            "/admin/login/?next=/admin/api/delete/".into(),
        ));
        let row = MemoryRow::new("user", "42");

        let outcome = tokio_test::block_on(f.action.handle_click(&row));

        assert!(matches!(outcome, DeleteOutcome::Failed(PanelError::Redirected(_))));
        assert!(!row.removed());
        assert!(row.failure().is_some());
    }

    #[test]
    fn test_disabled_click_stops_navigation_and_sends_nothing() {
        let row = MemoryRow::new("user", "42");

        let outcome = disabled_click(&row);

        assert!(matches!(outcome, DeleteOutcome::Disabled));
        assert!(row.default_suppressed());
        assert!(!row.removed());
        assert!(row.failure().is_none());
    }

    #[test]
    fn test_empty_success_body_counts_as_success() {
        let f = fixture(&[true]);
        f.http.respond(HttpResponse {
            status: 204,
            body: String::new(),
        });
        let row = MemoryRow::new("feedback", "5");

        let outcome = tokio_test::block_on(f.action.handle_click(&row));

        assert!(matches!(outcome, DeleteOutcome::Deleted(_)));
        assert!(row.removed());
    }

    #[test]
    fn test_trigger_outside_row_is_ignored() {
        let f = fixture(&[true]);
        let row = MemoryRow::new("user", "42").detached();

        let outcome = tokio_test::block_on(f.action.handle_click(&row));

        assert!(matches!(outcome, DeleteOutcome::Ignored));
        assert!(f.dialog.prompts().is_empty());
        assert!(f.http.requests().is_empty());
    }

    #[test]
    fn test_missing_data_id_fails_before_prompt() {
        let f = fixture(&[true]);
        let row = MemoryRow::without_attrs().with_attr("model", "user");

        let outcome = tokio_test::block_on(f.action.handle_click(&row));

        assert!(matches!(
            outcome,
            DeleteOutcome::Failed(PanelError::MissingAttribute("id"))
        ));
        assert!(f.dialog.prompts().is_empty());
    }

    #[test]
    fn test_csrf_field_removed_after_bind() {
        let f = fixture(&[true]);
        f.page.remove_input("csrfmiddlewaretoken");
        let row = MemoryRow::new("user", "42");

        let outcome = tokio_test::block_on(f.action.handle_click(&row));

        assert!(matches!(outcome, DeleteOutcome::Failed(PanelError::MissingElement(_))));
        assert!(f.http.requests().is_empty());
        assert!(row.failure().is_some());
    }

    #[test]
    fn test_check_response_accepts_any_2xx() {
        for status in [200, 201, 204, 299] {
            let response = HttpResponse {
                status,
                body: r#"{"success": true}"#.into(),
            };
            assert!(check_response(&response).is_ok(), "status {}", status);
        }
        let not_json = HttpResponse {
            status: 200,
            body: "OK".into(),
        };
        assert!(matches!(
            check_response(&not_json),
            Err(PanelError::UnexpectedBody)
        ));
        let redirect = HttpResponse {
            status: 302,
            body: String::new(),
        };
        assert!(matches!(
            check_response(&redirect),
            Err(PanelError::Status(302))
        ));
    }
}
