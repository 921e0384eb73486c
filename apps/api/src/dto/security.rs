use serde::{Deserialize, Serialize};
use ts_rs::TS;

use atrium_domain::EffectivePermission;

/// API representation of one resolved permission decision.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/effective-permission-response.ts"
)]
pub struct EffectivePermissionResponse {
    pub permission_id: String,
    pub resource: String,
    pub action: String,
    pub allowed: bool,
    pub source: String,
    pub details: String,
}

/// One staged override-editor change.
///
/// A missing or null `effect` clears the override so the permission
/// defers back to role rules.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/override-change-request.ts"
)]
pub struct OverrideChangeRequest {
    pub permission_id: String,
    pub effect: Option<String>,
}

/// Incoming payload for the override-editor batch commit.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/save-overrides-request.ts"
)]
pub struct SaveOverridesRequest {
    pub changes: Vec<OverrideChangeRequest>,
}

impl From<EffectivePermission> for EffectivePermissionResponse {
    fn from(value: EffectivePermission) -> Self {
        Self {
            permission_id: value.permission_id.to_string(),
            resource: value.resource,
            action: value.action,
            allowed: value.allowed,
            source: value.source.as_str().to_owned(),
            details: value.details,
        }
    }
}
