use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use uuid::Uuid;

use crate::api::rest::extract::ApiJson;
use crate::error::AppError;
use crate::models::parcel::{BookingRequest, Parcel};
use crate::models::user::Principal;
use crate::models::view::ParcelView;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/parcels", post(book_parcel))
        .route("/api/parcels/history", get(booking_history))
        .route("/api/parcels/track/:id", get(track_parcel))
}

/// Malformed ids can't name a parcel, so they read as "not found".
pub(crate) fn parse_parcel_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Parcel not found".to_string()))
}

async fn book_parcel(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ApiJson(payload): ApiJson<BookingRequest>,
) -> Result<(StatusCode, Json<Parcel>), AppError> {
    let parcel = state.engine.book(&principal, payload)?;
    Ok((StatusCode::CREATED, Json(parcel)))
}

async fn booking_history(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<Vec<ParcelView>>, AppError> {
    Ok(Json(state.engine.history(&principal)?))
}

async fn track_parcel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ParcelView>, AppError> {
    let id = parse_parcel_id(&id)?;
    Ok(Json(state.engine.track(id)?))
}
