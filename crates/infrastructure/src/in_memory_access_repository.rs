use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use atrium_application::{AccessRepository, AuditEvent, AuditRepository};
use atrium_core::{AppResult, PrincipalId};
use atrium_domain::{
    PermissionDefinition, PermissionEffect, RolePermissionRule, UserPermissionOverride,
};

/// In-memory access repository implementation.
///
/// Backs tests and local development; also stores the audit events
/// appended through the [`AuditRepository`] port.
#[derive(Debug, Default)]
pub struct InMemoryAccessRepository {
    permissions: RwLock<Vec<PermissionDefinition>>,
    overrides: RwLock<HashMap<(PrincipalId, Uuid), PermissionEffect>>,
    role_rules: RwLock<HashMap<PrincipalId, Vec<RolePermissionRule>>>,
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAccessRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a catalog entry.
    pub async fn insert_permission(&self, permission: PermissionDefinition) {
        self.permissions.write().await.push(permission);
    }

    /// Attaches role rules to a principal's assignments.
    pub async fn assign_role_rules(
        &self,
        principal_id: PrincipalId,
        rules: Vec<RolePermissionRule>,
    ) {
        self.role_rules
            .write()
            .await
            .entry(principal_id)
            .or_default()
            .extend(rules);
    }

    /// Returns the audit events appended so far.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AccessRepository for InMemoryAccessRepository {
    async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionDefinition>> {
        let mut catalog = self.permissions.read().await.clone();
        catalog.sort_by(|left, right| {
            (left.resource(), left.action()).cmp(&(right.resource(), right.action()))
        });
        Ok(catalog)
    }

    async fn list_overrides_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<UserPermissionOverride>> {
        Ok(self
            .overrides
            .read()
            .await
            .iter()
            .filter_map(|((stored_principal_id, permission_id), effect)| {
                (stored_principal_id == &principal_id).then_some(UserPermissionOverride {
                    principal_id,
                    permission_id: *permission_id,
                    effect: *effect,
                })
            })
            .collect())
    }

    async fn list_role_rules_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<RolePermissionRule>> {
        Ok(self
            .role_rules
            .read()
            .await
            .get(&principal_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_override(&self, override_row: UserPermissionOverride) -> AppResult<()> {
        self.overrides.write().await.insert(
            (override_row.principal_id, override_row.permission_id),
            override_row.effect,
        );
        Ok(())
    }

    async fn delete_override(
        &self,
        principal_id: PrincipalId,
        permission_id: Uuid,
    ) -> AppResult<()> {
        self.overrides
            .write()
            .await
            .remove(&(principal_id, permission_id));
        Ok(())
    }
}

#[async_trait]
impl AuditRepository for InMemoryAccessRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use atrium_application::{AccessRepository, AuditEvent, AuditRepository};
    use atrium_core::PrincipalId;
    use atrium_domain::{
        AuditAction, PermissionDefinition, PermissionEffect, UserPermissionOverride,
    };

    use super::InMemoryAccessRepository;

    fn permission(resource: &str, action: &str) -> PermissionDefinition {
        match PermissionDefinition::new(Uuid::new_v4(), resource, action, None) {
            Ok(value) => value,
            Err(error) => panic!("invalid test permission: {error}"),
        }
    }

    #[tokio::test]
    async fn catalog_is_ordered_by_resource_then_action() {
        let repository = InMemoryAccessRepository::new();
        repository.insert_permission(permission("reports", "view")).await;
        repository.insert_permission(permission("patients", "view")).await;
        repository.insert_permission(permission("patients", "edit")).await;

        let catalog = repository.list_permission_catalog().await;

        assert!(catalog.is_ok());
        let pairs: Vec<(String, String)> = catalog
            .unwrap_or_default()
            .iter()
            .map(|entry| (entry.resource().to_owned(), entry.action().to_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("patients".to_owned(), "edit".to_owned()),
                ("patients".to_owned(), "view".to_owned()),
                ("reports".to_owned(), "view".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn override_upsert_and_delete_roundtrip() {
        let repository = InMemoryAccessRepository::new();
        let principal_id = PrincipalId::new();
        let permission_id = Uuid::new_v4();

        let result = repository
            .upsert_override(UserPermissionOverride {
                principal_id,
                permission_id,
                effect: PermissionEffect::Deny,
            })
            .await;
        assert!(result.is_ok());

        let overrides = repository.list_overrides_for_principal(principal_id).await;
        assert!(overrides.is_ok_and(|rows| rows.len() == 1));

        let result = repository.delete_override(principal_id, permission_id).await;
        assert!(result.is_ok());

        let overrides = repository.list_overrides_for_principal(principal_id).await;
        assert!(overrides.is_ok_and(|rows| rows.is_empty()));
    }

    #[tokio::test]
    async fn appended_events_are_retained_in_order() {
        let repository = InMemoryAccessRepository::new();
        let subject = PrincipalId::new();

        let result = repository
            .append_event(AuditEvent {
                subject,
                action: AuditAction::SecurityOverridesCommitted,
                resource_type: "user_permission_overrides".to_owned(),
                resource_id: subject.to_string(),
                detail: None,
            })
            .await;
        assert!(result.is_ok());

        let events = repository.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].subject, subject);
    }

    #[tokio::test]
    async fn replacing_an_override_keeps_one_row() {
        let repository = InMemoryAccessRepository::new();
        let principal_id = PrincipalId::new();
        let permission_id = Uuid::new_v4();

        for effect in [PermissionEffect::Allow, PermissionEffect::Deny] {
            let result = repository
                .upsert_override(UserPermissionOverride {
                    principal_id,
                    permission_id,
                    effect,
                })
                .await;
            assert!(result.is_ok());
        }

        let overrides = repository.list_overrides_for_principal(principal_id).await;
        assert!(overrides.is_ok_and(|rows| {
            rows.len() == 1 && rows[0].effect == PermissionEffect::Deny
        }));
    }
}
