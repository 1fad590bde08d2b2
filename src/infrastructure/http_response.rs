// HTTP response mapping for application errors
use crate::application::error::{IncubatorError, StoreError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

pub fn status_for(error: &IncubatorError) -> StatusCode {
    match error {
        IncubatorError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        IncubatorError::ActuatorLocked(_) | IncubatorError::AutoControlLocked(_) => {
            StatusCode::CONFLICT
        }
        IncubatorError::Store(StoreError::Permission { .. }) => StatusCode::FORBIDDEN,
        IncubatorError::Store(StoreError::Access(_)) => StatusCode::BAD_GATEWAY,
        IncubatorError::ControllerUnreachable(_) => StatusCode::BAD_GATEWAY,
        IncubatorError::LocalPersistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `{ "error": kind, "message": text }`, plus `violations` for invalid drafts
pub fn error_body(error: &IncubatorError) -> serde_json::Value {
    let mut body = json!({
        "error": error.kind(),
        "message": error.to_string(),
    });
    if let IncubatorError::Validation(violations) = error {
        body["violations"] = json!(violations);
    }
    body
}

impl IntoResponse for IncubatorError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, Json(error_body(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actuators::Actuator;
    use crate::domain::configuration::DraftViolation;

    #[test]
    fn test_status_codes() {
        let permission = IncubatorError::from(StoreError::Permission {
            table: "egg_info".to_string(),
            detail: String::new(),
        });
        assert_eq!(status_for(&permission), StatusCode::FORBIDDEN);
        assert_eq!(
            status_for(&IncubatorError::ActuatorLocked(Actuator::Fan)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&IncubatorError::ControllerUnreachable("refused".to_string())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&IncubatorError::local_persistence("controlMode", "disk full")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_body_lists_violations() {
        let err = IncubatorError::Validation(vec![DraftViolation::HeaterPowerOutOfRange]);
        let body = error_body(&err);

        assert_eq!(body["error"], "validation");
        assert_eq!(body["violations"], json!(["heaterPowerOutOfRange"]));
        assert_eq!(status_for(&err), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_into_response_sets_status() {
        let response = IncubatorError::Store(StoreError::Access("timeout".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
