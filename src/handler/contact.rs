use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{service::email::ContactSubmission, state::AppState};

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            code: code.to_string(),
            message: message.into(),
        }),
    )
        .into_response()
}

#[derive(Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ContactResponse {
    pub status: String,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/contact", post(submit_contact))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message relayed", body = ContactResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 502, description = "Mail relay failed", body = ErrorResponse)
    ),
    tag = "contact"
)]
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ContactRequest>,
) -> Response {
    let missing = [
        ("name", &payload.name),
        ("email", &payload.email),
        ("subject", &payload.subject),
        ("message", &payload.message),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty());
    if let Some((field, _)) = missing {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_payload",
            format!("{} is required", field),
        );
    }

    let submission = ContactSubmission {
        recipient_address: state.config().values().contact_recipient.clone(),
        subject: payload.subject,
        submitter_name: payload.name,
        submitter_address: payload.email,
        body: payload.message,
    };

    // The cause is already logged by the mailer; callers only get a generic notice.
    if !state.mailer().send(&submission).await {
        return error_response(
            StatusCode::BAD_GATEWAY,
            "delivery_failed",
            "your message could not be sent, please try again later",
        );
    }

    (
        StatusCode::OK,
        Json(ContactResponse {
            status: "sent".to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::service::{
        config::ConfigServiceImpl,
        email::{MailDeliveryError, Mailer},
    };

    struct FakeMailer {
        succeed: bool,
        seen: Mutex<Vec<ContactSubmission>>,
    }

    #[async_trait]
    impl Mailer for FakeMailer {
        async fn deliver(&self, submission: &ContactSubmission) -> Result<(), MailDeliveryError> {
            self.seen.lock().unwrap().push(submission.clone());
            if self.succeed {
                Ok(())
            } else {
                Err(MailDeliveryError::Auth("535 authentication failed".into()))
            }
        }
    }

    fn app(succeed: bool) -> (Router, Arc<FakeMailer>) {
        let config = ConfigServiceImpl::from_lookup(|key| {
            let value = match key {
                "SMTP_SERVER" => "smtp.example.com",
                "SENDER_NAME" => "Acme",
                "SENDER_EMAIL" => "noreply@acme.test",
                "SMTP_USERNAME" => "mailer",
                "SMTP_PASSWORD" => "hunter2",
                "CONTACT_RECIPIENT" => "inbox@acme.test",
                _ => return None,
            };
            Some(value.to_string())
        })
        .unwrap();
        let mailer = Arc::new(FakeMailer {
            succeed,
            seen: Mutex::new(Vec::new()),
        });
        let state = AppState::with_mailer(Arc::new(config), mailer.clone());
        (routes(state), mailer)
    }

    async fn post_contact(app: Router, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri("/api/v1/contact")
            .method("POST")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn form() -> Value {
        json!({
            "name": "Jane",
            "email": "jane@example.com",
            "subject": "Hello",
            "message": "line1\nline2",
        })
    }

    #[tokio::test]
    async fn relays_submission_to_configured_recipient() {
        let (app, mailer) = app(true);

        let (status, body) = post_contact(app, form()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "sent");

        let seen = mailer.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].recipient_address, "inbox@acme.test");
        assert_eq!(seen[0].submitter_name, "Jane");
        assert_eq!(seen[0].submitter_address, "jane@example.com");
        assert_eq!(seen[0].subject, "Hello");
        assert_eq!(seen[0].body, "line1\nline2");
    }

    #[tokio::test]
    async fn rejects_blank_fields_without_sending() {
        let (app, mailer) = app(true);
        let mut body = form();
        body["subject"] = json!("   ");

        let (status, body) = post_contact(app, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_payload");
        assert_eq!(body["message"], "subject is required");
        assert!(mailer.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_is_reported_generically() {
        let (app, _mailer) = app(false);

        let (status, body) = post_contact(app, form()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "delivery_failed");
        assert!(!body["message"].as_str().unwrap().contains("535"));
    }
}
