use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::Json;
use axum::Router;
use chrono::Local;
use serde::Deserialize;
use uuid::Uuid;

use crate::access::{authorize, Intent};
use crate::api::rest::extract::{ApiJson, ApiQuery};
use crate::api::rest::parcels::parse_parcel_id;
use crate::error::AppError;
use crate::models::parcel::{Parcel, ParcelStatus};
use crate::models::user::{Principal, User};
use crate::models::view::ParcelView;
use crate::reports::{self, DashboardMetrics};
use crate::state::AppState;
use crate::store::ParcelFilter;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/parcels", get(list_parcels))
        .route("/api/admin/parcels/:id/assign", put(assign_agent))
        .route("/api/admin/dashboard", get(dashboard))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/reports/csv", get(export_csv))
        .route("/api/admin/reports/pdf", get(export_pdf))
}

#[derive(Deserialize)]
pub struct ListParcelsQuery {
    pub status: Option<String>,
    pub agent: Option<String>,
    pub customer: Option<String>,
}

impl ListParcelsQuery {
    fn into_filter(self) -> Result<ParcelFilter, AppError> {
        Ok(ParcelFilter {
            status: self
                .status
                .map(|raw| raw.parse::<ParcelStatus>().map_err(AppError::Validation))
                .transpose()?,
            agent: self.agent.as_deref().map(|raw| parse_uuid(raw, "agent")).transpose()?,
            customer: self
                .customer
                .as_deref()
                .map(|raw| parse_uuid(raw, "customer"))
                .transpose()?,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub agent_id: Option<String>,
}

fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|err| AppError::Validation(format!("invalid {field} id {raw}: {err}")))
}

async fn list_parcels(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ApiQuery(query): ApiQuery<ListParcelsQuery>,
) -> Result<Json<Vec<ParcelView>>, AppError> {
    let filter = query.into_filter()?;
    Ok(Json(state.engine.list_all(&principal, &filter)?))
}

async fn assign_agent(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<AssignRequest>,
) -> Result<Json<Parcel>, AppError> {
    authorize(Some(&principal), Intent::Assign, None)?;
    let parcel_id = parse_parcel_id(&id)?;
    let agent_id = payload
        .agent_id
        .ok_or_else(|| AppError::Validation("agentId is required".to_string()))
        .and_then(|raw| parse_uuid(&raw, "agent"))?;

    let parcel = state.engine.assign(&principal, parcel_id, agent_id)?;
    Ok(Json(parcel))
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<DashboardMetrics>, AppError> {
    authorize(Some(&principal), Intent::Metrics, None)?;
    let day_start = reports::local_day_start(&Local::now());
    Ok(Json(reports::dashboard(state.store.as_ref(), day_start)?))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<Vec<User>>, AppError> {
    authorize(Some(&principal), Intent::ListUsers, None)?;
    Ok(Json(state.directory.list()))
}

async fn export_csv(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&principal), Intent::Export, None)?;
    let rows = reports::report_rows(state.store.as_ref(), &state.directory, &Local)?;
    let body = reports::render_csv(&rows)?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv"),
            (CONTENT_DISPOSITION, "attachment; filename=\"parcels-report.csv\""),
        ],
        body,
    ))
}

async fn export_pdf(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&principal), Intent::Export, None)?;
    let rows = reports::report_rows(state.store.as_ref(), &state.directory, &Local)?;
    let body = reports::render_pdf(&rows)?;

    Ok((
        [
            (CONTENT_TYPE, "application/pdf"),
            (CONTENT_DISPOSITION, "attachment; filename=\"parcels-report.pdf\""),
        ],
        body,
    ))
}
