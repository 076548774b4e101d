use crate::{auth::auth::AuthUser, error::ApiError};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct BroadcastMessage {
    #[schema(example = "Office closed on Friday")]
    pub message: String,
}

/// Broadcast a message to all employees. Acknowledgement only: there is
/// no delivery channel and no state behind this endpoint.
#[utoipa::path(
    post,
    path = "/api/employees/message",
    request_body = BroadcastMessage,
    responses(
        (status = 200, description = "Acknowledged"),
        (status = 422, description = "Empty message"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Message"
)]
pub async fn broadcast_message(
    auth: AuthUser,
    payload: web::Json<BroadcastMessage>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    if payload.message.trim().is_empty() {
        return Err(ApiError::Validation("Message must not be empty".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Message sent to all employees"
    })))
}
