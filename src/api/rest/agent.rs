use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::api::rest::extract::ApiJson;
use crate::api::rest::parcels::parse_parcel_id;
use crate::error::AppError;
use crate::models::parcel::Parcel;
use crate::models::user::Principal;
use crate::models::view::ParcelView;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/agent/parcels", get(assigned_parcels))
        .route("/api/agent/parcels/:id/status", put(update_parcel_status))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    pub location: Option<String>,
}

async fn assigned_parcels(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<Vec<ParcelView>>, AppError> {
    Ok(Json(state.engine.assigned(&principal)?))
}

async fn update_parcel_status(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Parcel>, AppError> {
    let id = parse_parcel_id(&id)?;
    // A missing status is rejected by the engine after the ownership check.
    let status = payload.status.unwrap_or_default();

    let parcel = state
        .engine
        .update_status(&principal, id, &status, payload.location)?;
    Ok(Json(parcel))
}
