use uuid::Uuid;

use atrium_core::{AppError, PrincipalId};

pub mod directory;
pub mod health;
pub mod security;
pub mod targets;

pub(crate) fn parse_uuid(value: &str, label: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value)
        .map_err(|error| AppError::Validation(format!("invalid {label} '{value}': {error}")))
}

pub(crate) fn parse_principal_id(value: &str) -> Result<PrincipalId, AppError> {
    parse_uuid(value, "principal id").map(PrincipalId::from_uuid)
}
