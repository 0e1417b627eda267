use crate::services::EmailMessage;
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SendEmailRequest {
    #[validate(email)]
    pub to: String,
    #[validate(length(min = 1, message = "subject must not be empty"))]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// `POST /send-email`: relay a plain-text message, typically a copy of the
/// generated solutions.
pub async fn send_email(
    State(state): State<AppState>,
    payload: Result<Json<SendEmailRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_request(rejection.body_text()),
    };

    if let Err(errors) = request.validate() {
        return invalid_request(errors.to_string());
    }

    let message = EmailMessage {
        to: request.to,
        subject: request.subject,
        body: request.body,
    };

    match state.email_provider.send(&message).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Email sent successfully" })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(to = %message.to, error = %e, "Error sending email");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Failed to send email", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "message": "Method not allowed" })),
    )
        .into_response()
}

fn invalid_request(details: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": "Invalid email request", "error": details })),
    )
        .into_response()
}
