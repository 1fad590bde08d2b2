// HTTP request handlers
use crate::application::configuration_reconciler::{CatalogSource, DraftView};
use crate::application::error::IncubatorError;
use crate::domain::actuators::{Actuator, ActuatorStateSet, AutoControlSet, AutoSubsystem};
use crate::domain::configuration::DraftEdit;
use crate::domain::control_mode::ControlMode;
use crate::domain::egg_type::{EggTypeProfile, EggTypeUpdate};
use crate::domain::settings::{ConnectionStatus, ControllerSettings};
use crate::domain::telemetry::SensorReading;
use crate::infrastructure::http_response::error_body;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

pub enum ApiError {
    NotFound(String),
    Incubator(IncubatorError),
}

impl From<IncubatorError> for ApiError {
    fn from(error: IncubatorError) -> Self {
        ApiError::Incubator(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "not_found", "message": message })),
            )
                .into_response(),
            ApiError::Incubator(error) => error.into_response(),
        }
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn parse_segment<T: FromStr<Err = String>>(raw: &str) -> Result<T, ApiError> {
    raw.parse().map_err(ApiError::NotFound)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EggTypesResponse {
    pub profiles: Vec<EggTypeProfile>,
    pub selected_id: String,
}

#[derive(Deserialize)]
pub struct SelectRequest {
    pub id: String,
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub source: CatalogSource,
}

#[derive(Serialize, Deserialize)]
pub struct ModeBody {
    pub mode: ControlMode,
}

/// State after a change whose local persistence may have failed
#[derive(Serialize)]
pub struct Changed<T> {
    #[serde(flatten)]
    pub value: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Deserialize)]
pub struct ToggleRequest {
    pub on: bool,
}

#[derive(Deserialize)]
pub struct AutoControlRequest {
    pub enabled: bool,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: ConnectionStatus,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_egg_types(State(state): State<Arc<AppState>>) -> Json<EggTypesResponse> {
    Json(EggTypesResponse {
        profiles: state.egg_types.list_profiles(),
        selected_id: state.egg_types.selected_id(),
    })
}

pub async fn get_selected_egg_type(State(state): State<Arc<AppState>>) -> Json<EggTypeProfile> {
    Json(state.egg_types.selected())
}

pub async fn select_egg_type(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Json<EggTypeProfile> {
    Json(state.egg_types.select(&request.id))
}

pub async fn update_selected_egg_type(
    State(state): State<Arc<AppState>>,
    Json(update): Json<EggTypeUpdate>,
) -> Json<EggTypeProfile> {
    Json(state.egg_types.update_selected(&update))
}

pub async fn update_egg_type(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<EggTypeUpdate>,
) -> ApiResult<EggTypeProfile> {
    if !state.egg_types.update_by_id(&id, &update) {
        return Err(ApiError::NotFound(format!("unknown egg type '{}'", id)));
    }
    state
        .egg_types
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("unknown egg type '{}'", id)))
}

pub async fn refresh_egg_types(State(state): State<Arc<AppState>>) -> ApiResult<CatalogResponse> {
    let source = state.reconciler.refresh_catalog().await?;
    Ok(Json(CatalogResponse { source }))
}

pub async fn get_draft(State(state): State<Arc<AppState>>) -> Json<DraftView> {
    Json(state.reconciler.current_draft().await)
}

pub async fn edit_draft(
    State(state): State<Arc<AppState>>,
    Json(edit): Json<DraftEdit>,
) -> Json<DraftView> {
    Json(state.reconciler.edit_draft(&edit).await)
}

/// Commit the live draft to the profile store
pub async fn save_configuration(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.reconciler.save_current().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Commit the live draft to the controller
pub async fn send_configuration(State(state): State<Arc<AppState>>) -> ApiResult<EggTypeProfile> {
    Ok(Json(state.reconciler.send_current().await?))
}

/// Store write and controller push together; each half reports its own result
pub async fn apply_configuration(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let outcome = state.reconciler.save_and_send_current().await;

    let store = match &outcome.store {
        Ok(()) => json!({ "ok": true }),
        Err(e) => json!({ "ok": false, "failure": error_body(e) }),
    };
    let controller = match &outcome.controller {
        Ok(profile) => json!({ "ok": true, "profile": profile }),
        Err(e) => json!({ "ok": false, "failure": error_body(e) }),
    };
    Json(json!({ "store": store, "controller": controller }))
}

pub async fn get_mode(State(state): State<Arc<AppState>>) -> Json<ModeBody> {
    Json(ModeBody {
        mode: state.mode.get_mode(),
    })
}

pub async fn set_mode(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ModeBody>,
) -> Json<Changed<ModeBody>> {
    let result = state.mode.set_mode(body.mode);
    Json(Changed {
        value: ModeBody { mode: result.value },
        warning: result.warning,
    })
}

pub async fn get_actuators(State(state): State<Arc<AppState>>) -> Json<ActuatorStateSet> {
    Json(state.actuators.states())
}

pub async fn toggle_actuator(
    Path(actuator): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ToggleRequest>,
) -> ApiResult<Changed<ActuatorStateSet>> {
    let actuator: Actuator = parse_segment(&actuator)?;
    let result = state.actuators.toggle(actuator, request.on)?;
    Ok(Json(Changed {
        value: result.value,
        warning: result.warning,
    }))
}

pub async fn stop_all_actuators(
    State(state): State<Arc<AppState>>,
) -> Json<Changed<ActuatorStateSet>> {
    let result = state.actuators.stop_all();
    Json(Changed {
        value: result.value,
        warning: result.warning,
    })
}

pub async fn get_auto_controls(State(state): State<Arc<AppState>>) -> Json<AutoControlSet> {
    Json(state.actuators.auto_controls())
}

pub async fn set_auto_control(
    Path(subsystem): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<AutoControlRequest>,
) -> ApiResult<Changed<AutoControlSet>> {
    let subsystem: AutoSubsystem = parse_segment(&subsystem)?;
    let result = state.actuators.set_auto_control(subsystem, request.enabled)?;
    Ok(Json(Changed {
        value: result.value,
        warning: result.warning,
    }))
}

pub async fn enable_all_auto_controls(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Changed<AutoControlSet>> {
    let result = state.actuators.enable_all_auto_controls()?;
    Ok(Json(Changed {
        value: result.value,
        warning: result.warning,
    }))
}

/// `null` until the first successful poll
pub async fn latest_reading(State(state): State<Arc<AppState>>) -> Json<Option<SensorReading>> {
    Json(state.poller.latest())
}

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<ControllerSettings> {
    Json(state.connection.settings())
}

pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<ControllerSettings>,
) -> ApiResult<ControllerSettings> {
    Ok(Json(state.connection.save_settings(settings).await?))
}

pub async fn test_connection(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    let status = state.connection.test_connection().await?;
    Ok(Json(StatusResponse { status }))
}
