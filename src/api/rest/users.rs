use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use axum::Router;
use tracing::info;

use crate::api::rest::extract::ApiJson;
use crate::directory::{RegisterUserRequest, Registration};
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/users", post(register_user))
}

async fn register_user(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RegisterUserRequest>,
) -> Result<(StatusCode, Json<Registration>), AppError> {
    let registration = state.directory.register(payload)?;
    info!(
        user_id = %registration.user.id,
        role = %registration.user.role,
        "user registered"
    );
    Ok((StatusCode::CREATED, Json(registration)))
}
