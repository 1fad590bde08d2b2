// Error taxonomy shared by the application services
use crate::domain::actuators::{Actuator, AutoSubsystem};
use crate::domain::configuration::DraftViolation;

pub type Result<T> = std::result::Result<T, IncubatorError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum IncubatorError {
    /// Draft failed the bounds predicate; never reaches the network
    #[error("configuration is invalid: {}", join_violations(.0))]
    Validation(Vec<DraftViolation>),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("controller endpoint unreachable: {0}")]
    ControllerUnreachable(String),

    #[error("failed to persist local state '{key}': {message}")]
    LocalPersistence { key: String, message: String },

    #[error("cannot control {0:?} in automatic mode, switch to manual mode first")]
    ActuatorLocked(Actuator),

    /// `None` when the refused change covers every subsystem
    #[error("{}", auto_control_locked_message(.0))]
    AutoControlLocked(Option<AutoSubsystem>),
}

/// Profile store failures. `Permission` is the distinguished access failure
/// caused by row-level security rejecting the request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("profile store request failed: {0}")]
    Access(String),

    #[error(
        "permission denied by the profile store on table '{table}'. \
         Disable row-level security on the {table} table or contact your administrator"
    )]
    Permission { table: String, detail: String },
}

impl StoreError {
    pub fn is_permission(&self) -> bool {
        matches!(self, StoreError::Permission { .. })
    }
}

impl IncubatorError {
    pub fn local_persistence(key: &str, message: impl ToString) -> Self {
        IncubatorError::LocalPersistence {
            key: key.to_string(),
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            IncubatorError::Validation(_) => "validation",
            IncubatorError::Store(StoreError::Access(_)) => "store_access",
            IncubatorError::Store(StoreError::Permission { .. }) => "store_permission",
            IncubatorError::ControllerUnreachable(_) => "controller_unreachable",
            IncubatorError::LocalPersistence { .. } => "local_persistence",
            IncubatorError::ActuatorLocked(_) => "actuator_locked",
            IncubatorError::AutoControlLocked(_) => "auto_control_locked",
        }
    }
}

fn auto_control_locked_message(subsystem: &Option<AutoSubsystem>) -> String {
    match subsystem {
        Some(subsystem) => format!("cannot change {:?} outside automatic mode", subsystem),
        None => "cannot enable automatic controls outside automatic mode".to_string(),
    }
}

fn join_violations(violations: &[DraftViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_message_is_actionable() {
        let err = IncubatorError::from(StoreError::Permission {
            table: "egg_info".to_string(),
            detail: "new row violates row-level security policy".to_string(),
        });
        assert_eq!(err.kind(), "store_permission");
        assert!(err.to_string().contains("row-level security"));
        assert!(err.to_string().contains("egg_info"));
    }

    #[test]
    fn test_validation_message_lists_rules() {
        let err = IncubatorError::Validation(vec![
            DraftViolation::TemperatureRangeInverted,
            DraftViolation::FanRunTimeNotPositive,
        ]);
        assert_eq!(
            err.to_string(),
            "configuration is invalid: minimum temperature must be below maximum temperature; \
             fan run time must be positive"
        );
    }

    #[test]
    fn test_auto_control_lock_messages() {
        let single = IncubatorError::AutoControlLocked(Some(AutoSubsystem::HumidityControl));
        assert_eq!(
            single.to_string(),
            "cannot change HumidityControl outside automatic mode"
        );

        let all = IncubatorError::AutoControlLocked(None);
        assert_eq!(
            all.to_string(),
            "cannot enable automatic controls outside automatic mode"
        );
        assert_eq!(all.kind(), "auto_control_locked");
    }
}
