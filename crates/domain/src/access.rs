use std::str::FromStr;

use atrium_core::{AppError, AppResult, NonEmptyString, PrincipalId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Allow/deny outcome attached to a rule or override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionEffect {
    /// Grants the capability.
    Allow,
    /// Forbids the capability.
    Deny,
}

impl PermissionEffect {
    /// Returns a stable storage value for this effect.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }

    /// Returns whether this effect grants access.
    #[must_use]
    pub fn allows(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Parses a transport value into an effect.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for PermissionEffect {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            _ => Err(AppError::Validation(format!(
                "unknown permission effect '{value}'"
            ))),
        }
    }
}

/// One (resource, action) capability from the permission catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    permission_id: Uuid,
    resource: NonEmptyString,
    action: NonEmptyString,
    description: Option<String>,
}

impl PermissionDefinition {
    /// Creates a catalog entry with validated fields.
    pub fn new(
        permission_id: Uuid,
        resource: impl Into<String>,
        action: impl Into<String>,
        description: Option<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            permission_id,
            resource: NonEmptyString::new(resource)?,
            action: NonEmptyString::new(action)?,
            description,
        })
    }

    /// Returns the stable catalog identifier.
    #[must_use]
    pub fn permission_id(&self) -> Uuid {
        self.permission_id
    }

    /// Returns the protected resource name.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }

    /// Returns the action name on the resource.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the optional human-readable description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether this entry names the given capability pair.
    #[must_use]
    pub fn matches(&self, resource: &str, action: &str) -> bool {
        self.resource.as_str() == resource && self.action.as_str() == action
    }
}

/// Role-level effect for one catalog permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissionRule {
    /// Owning role identifier.
    pub role_id: Uuid,
    /// Owning role display name, carried for decision details.
    pub role_name: String,
    /// Catalog permission the rule applies to.
    pub permission_id: Uuid,
    /// Effect granted or withheld by the role.
    pub effect: PermissionEffect,
}

/// Principal-level effect superseding every role-derived effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissionOverride {
    /// Principal the override applies to.
    pub principal_id: PrincipalId,
    /// Catalog permission the override applies to.
    pub permission_id: Uuid,
    /// Explicit effect chosen by an administrator.
    pub effect: PermissionEffect,
}

/// Origin of a resolved permission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionSource {
    /// Decided by an explicit user override.
    UserOverride,
    /// Decided by a role rule.
    Role,
    /// No matching rule existed; denied by default.
    Denied,
}

impl PermissionSource {
    /// Returns a stable storage value for this source.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserOverride => "user_override",
            Self::Role => "role",
            Self::Denied => "denied",
        }
    }
}

/// Resolved decision for one catalog permission and one principal.
///
/// Recomputed on demand; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermission {
    /// Catalog permission identifier.
    pub permission_id: Uuid,
    /// Protected resource name.
    pub resource: String,
    /// Action name on the resource.
    pub action: String,
    /// Whether the principal may perform the action.
    pub allowed: bool,
    /// Origin of the decision.
    pub source: PermissionSource,
    /// Human-readable explanation of the decision.
    pub details: String,
}

/// Staged override-editor change for one catalog permission.
///
/// `None` clears the override row; `Some(effect)` upserts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideChange {
    /// Catalog permission the change applies to.
    pub permission_id: Uuid,
    /// New explicit effect, or `None` to defer back to roles.
    pub effect: Option<PermissionEffect>,
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when an administrator commits override-editor changes.
    SecurityOverridesCommitted,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SecurityOverridesCommitted => "security.overrides.committed",
        }
    }
}

/// Capabilities gating Atrium's own administrative surfaces.
///
/// Each variant names a (resource, action) pair expected in the
/// permission catalog; a pair absent from the catalog denies by
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminCapability {
    /// Allows viewing effective permissions and editing overrides.
    ManageAccess,
    /// Allows updating modality targets.
    ManageTargets,
    /// Allows reading the target audit trail.
    ViewTargetAudit,
    /// Allows listing the staff directory.
    ViewDirectory,
}

impl AdminCapability {
    /// Returns the catalog resource name for this capability.
    #[must_use]
    pub fn resource(&self) -> &'static str {
        match self {
            Self::ManageAccess => "security",
            Self::ManageTargets => "mlo_targets",
            Self::ViewTargetAudit => "mlo_targets",
            Self::ViewDirectory => "directory",
        }
    }

    /// Returns the catalog action name for this capability.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::ManageAccess => "manage_access",
            Self::ManageTargets => "manage",
            Self::ViewTargetAudit => "view_audit",
            Self::ViewDirectory => "view",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use uuid::Uuid;

    use super::{PermissionDefinition, PermissionEffect};

    #[test]
    fn effect_roundtrip_storage_value() {
        let effect = PermissionEffect::Deny;
        let restored = PermissionEffect::from_str(effect.as_str());
        assert!(restored.is_ok());
        assert_eq!(restored.unwrap_or(PermissionEffect::Allow), effect);
    }

    #[test]
    fn unknown_effect_is_rejected() {
        let parsed = PermissionEffect::from_str("revoke");
        assert!(parsed.is_err());
    }

    #[test]
    fn catalog_entry_rejects_blank_resource() {
        let result = PermissionDefinition::new(Uuid::new_v4(), "  ", "view", None);
        assert!(result.is_err());
    }

    #[test]
    fn catalog_entry_matches_capability_pair() {
        let entry = PermissionDefinition::new(Uuid::new_v4(), "patients", "view", None);
        assert!(entry.is_ok());
        if let Ok(entry) = entry {
            assert!(entry.matches("patients", "view"));
            assert!(!entry.matches("patients", "edit"));
        }
    }
}
