use async_trait::async_trait;
use uuid::Uuid;

use atrium_core::{AppResult, PrincipalId};
use atrium_domain::{PermissionDefinition, RolePermissionRule, UserPermissionOverride};

/// Repository port for permission catalog and grant lookups.
#[async_trait]
pub trait AccessRepository: Send + Sync {
    /// Lists the full permission catalog ordered by (resource, action).
    async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionDefinition>>;

    /// Lists the principal's explicit overrides.
    async fn list_overrides_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<UserPermissionOverride>>;

    /// Lists the role rules attached to the principal's assigned roles.
    async fn list_role_rules_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<RolePermissionRule>>;

    /// Creates or replaces one override row.
    async fn upsert_override(&self, override_row: UserPermissionOverride) -> AppResult<()>;

    /// Deletes one override row, if present.
    async fn delete_override(
        &self,
        principal_id: PrincipalId,
        permission_id: Uuid,
    ) -> AppResult<()>;
}
