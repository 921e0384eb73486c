use std::sync::Arc;

use atrium_core::{AppError, AppResult, PrincipalId, UserIdentity};
use atrium_domain::{
    AdminCapability, AuditAction, EffectivePermission, OverrideChange, PermissionDefinition,
    PermissionEffect, PermissionSource, RolePermissionRule, UserPermissionOverride,
};

use crate::{AccessRepository, AuditEvent, AuditRepository};

/// Computes every catalog decision for one principal.
///
/// Pure and deterministic: no I/O, no clock, output order equals
/// catalog order. Rules referencing permissions absent from the catalog
/// never match because iteration is driven by the catalog.
#[must_use]
pub fn resolve_effective_permissions(
    catalog: &[PermissionDefinition],
    overrides: &[UserPermissionOverride],
    role_rules: &[RolePermissionRule],
) -> Vec<EffectivePermission> {
    // Role attribution must not depend on fetch order.
    let mut sorted_rules: Vec<&RolePermissionRule> = role_rules.iter().collect();
    sorted_rules.sort_by(|left, right| {
        left.role_name
            .cmp(&right.role_name)
            .then_with(|| left.role_id.cmp(&right.role_id))
    });

    catalog
        .iter()
        .map(|permission| resolve_one(permission, overrides, &sorted_rules))
        .collect()
}

fn resolve_one(
    permission: &PermissionDefinition,
    overrides: &[UserPermissionOverride],
    sorted_rules: &[&RolePermissionRule],
) -> EffectivePermission {
    let decision = |allowed: bool, source: PermissionSource, details: String| EffectivePermission {
        permission_id: permission.permission_id(),
        resource: permission.resource().to_owned(),
        action: permission.action().to_owned(),
        allowed,
        source,
        details,
    };

    // An explicit override settles the permission; roles are not consulted.
    if let Some(override_row) = overrides
        .iter()
        .find(|row| row.permission_id == permission.permission_id())
    {
        return decision(
            override_row.effect.allows(),
            PermissionSource::UserOverride,
            format!("User override: {}", override_row.effect.as_str()),
        );
    }

    let mut first_allow: Option<&RolePermissionRule> = None;
    for rule in sorted_rules
        .iter()
        .copied()
        .filter(|rule| rule.permission_id == permission.permission_id())
    {
        match rule.effect {
            // Deny wins over allow across the principal's roles.
            PermissionEffect::Deny => {
                return decision(
                    false,
                    PermissionSource::Role,
                    format!("Denied by role '{}'", rule.role_name),
                );
            }
            PermissionEffect::Allow => {
                first_allow.get_or_insert(rule);
            }
        }
    }

    if let Some(rule) = first_allow {
        return decision(
            true,
            PermissionSource::Role,
            format!("Granted by role '{}'", rule.role_name),
        );
    }

    decision(
        false,
        PermissionSource::Denied,
        "Default deny (no matching rules)".to_owned(),
    )
}

/// Application service for effective-permission resolution and the
/// override editor.
#[derive(Clone)]
pub struct AccessService {
    repository: Arc<dyn AccessRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl AccessService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AccessRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            repository,
            audit_repository,
        }
    }

    /// Returns the full effective-permission report for a principal.
    pub async fn effective_permissions(
        &self,
        actor: &UserIdentity,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<EffectivePermission>> {
        self.require_capability(actor.principal_id(), AdminCapability::ManageAccess)
            .await?;

        self.resolve_for(principal_id).await
    }

    /// Returns whether the principal currently holds the capability.
    ///
    /// A capability whose (resource, action) pair is absent from the
    /// catalog is a default deny.
    pub async fn check_capability(
        &self,
        principal_id: PrincipalId,
        capability: AdminCapability,
    ) -> AppResult<bool> {
        let resolved = self.resolve_for(principal_id).await?;

        Ok(resolved
            .iter()
            .find(|entry| {
                entry.resource == capability.resource() && entry.action == capability.action()
            })
            .is_some_and(|entry| entry.allowed))
    }

    /// Ensures the principal holds the capability.
    pub async fn require_capability(
        &self,
        principal_id: PrincipalId,
        capability: AdminCapability,
    ) -> AppResult<()> {
        if self.check_capability(principal_id, capability).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "principal '{principal_id}' is missing permission '{}.{}'",
            capability.resource(),
            capability.action()
        )))
    }

    /// Commits a batch of staged override-editor changes.
    ///
    /// `None` clears the override row, `Some(effect)` upserts it.
    /// Concurrent commits from two admin sessions are last-write-wins.
    pub async fn commit_override_changes(
        &self,
        actor: &UserIdentity,
        principal_id: PrincipalId,
        changes: Vec<OverrideChange>,
    ) -> AppResult<()> {
        self.require_capability(actor.principal_id(), AdminCapability::ManageAccess)
            .await?;

        if changes.is_empty() {
            return Ok(());
        }

        let catalog = self.repository.list_permission_catalog().await?;
        for change in &changes {
            if !catalog
                .iter()
                .any(|permission| permission.permission_id() == change.permission_id)
            {
                return Err(AppError::Validation(format!(
                    "permission '{}' is not in the catalog",
                    change.permission_id
                )));
            }
        }

        let mut set_count = 0usize;
        let mut cleared_count = 0usize;

        for change in changes {
            match change.effect {
                Some(effect) => {
                    self.repository
                        .upsert_override(UserPermissionOverride {
                            principal_id,
                            permission_id: change.permission_id,
                            effect,
                        })
                        .await?;
                    set_count += 1;
                }
                None => {
                    self.repository
                        .delete_override(principal_id, change.permission_id)
                        .await?;
                    cleared_count += 1;
                }
            }
        }

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.principal_id(),
                action: AuditAction::SecurityOverridesCommitted,
                resource_type: "user_permission_overrides".to_owned(),
                resource_id: principal_id.to_string(),
                detail: Some(format!(
                    "committed {set_count} override(s) and cleared {cleared_count} for principal '{principal_id}'"
                )),
            })
            .await
    }

    async fn resolve_for(&self, principal_id: PrincipalId) -> AppResult<Vec<EffectivePermission>> {
        let catalog = self.repository.list_permission_catalog().await?;
        let overrides = self
            .repository
            .list_overrides_for_principal(principal_id)
            .await?;
        let role_rules = self
            .repository
            .list_role_rules_for_principal(principal_id)
            .await?;

        Ok(resolve_effective_permissions(
            &catalog, &overrides, &role_rules,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use atrium_core::{AppError, AppResult, PrincipalId, UserIdentity};
    use atrium_domain::{
        AdminCapability, EffectivePermission, OverrideChange, PermissionDefinition,
        PermissionEffect, PermissionSource, RolePermissionRule, UserPermissionOverride,
    };

    use crate::{AuditEvent, AuditRepository};

    use super::{AccessRepository, AccessService, resolve_effective_permissions};

    fn permission(id: Uuid, resource: &str, action: &str) -> PermissionDefinition {
        match PermissionDefinition::new(id, resource, action, None) {
            Ok(value) => value,
            Err(error) => panic!("invalid test permission: {error}"),
        }
    }

    fn rule(role_name: &str, permission_id: Uuid, effect: PermissionEffect) -> RolePermissionRule {
        RolePermissionRule {
            role_id: Uuid::new_v4(),
            role_name: role_name.to_owned(),
            permission_id,
            effect,
        }
    }

    #[test]
    fn every_catalog_permission_gets_exactly_one_decision() {
        let catalog = vec![
            permission(Uuid::new_v4(), "patients", "view"),
            permission(Uuid::new_v4(), "patients", "edit"),
            permission(Uuid::new_v4(), "reports", "view"),
        ];

        let resolved = resolve_effective_permissions(&catalog, &[], &[]);

        assert_eq!(resolved.len(), catalog.len());
        for (entry, expected) in resolved.iter().zip(catalog.iter()) {
            assert_eq!(entry.permission_id, expected.permission_id());
            assert_eq!(entry.resource, expected.resource());
            assert_eq!(entry.action, expected.action());
        }
    }

    #[test]
    fn override_wins_over_role_rules() {
        let principal_id = PrincipalId::new();
        let permission_id = Uuid::new_v4();
        let catalog = vec![permission(permission_id, "patients", "view")];
        let overrides = vec![UserPermissionOverride {
            principal_id,
            permission_id,
            effect: PermissionEffect::Allow,
        }];
        let rules = vec![rule("Trainee", permission_id, PermissionEffect::Deny)];

        let resolved = resolve_effective_permissions(&catalog, &overrides, &rules);

        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].allowed);
        assert_eq!(resolved[0].source, PermissionSource::UserOverride);
        assert_eq!(resolved[0].details, "User override: allow");
    }

    #[test]
    fn deny_wins_across_roles() {
        let permission_id = Uuid::new_v4();
        let catalog = vec![permission(permission_id, "patients", "view")];
        let rules = vec![
            rule("Clinician", permission_id, PermissionEffect::Allow),
            rule("Trainee", permission_id, PermissionEffect::Deny),
        ];

        let resolved = resolve_effective_permissions(&catalog, &[], &rules);

        assert_eq!(resolved.len(), 1);
        assert!(!resolved[0].allowed);
        assert_eq!(resolved[0].source, PermissionSource::Role);
        assert_eq!(resolved[0].details, "Denied by role 'Trainee'");
    }

    #[test]
    fn principal_without_roles_or_overrides_is_denied_everywhere() {
        let catalog = vec![
            permission(Uuid::new_v4(), "patients", "view"),
            permission(Uuid::new_v4(), "reports", "view"),
        ];

        let resolved = resolve_effective_permissions(&catalog, &[], &[]);

        for entry in &resolved {
            assert!(!entry.allowed);
            assert_eq!(entry.source, PermissionSource::Denied);
            assert_eq!(entry.details, "Default deny (no matching rules)");
        }
    }

    #[test]
    fn allow_from_any_role_grants_when_no_deny_exists() {
        let permission_id = Uuid::new_v4();
        let catalog = vec![permission(permission_id, "reports", "view")];
        let rules = vec![rule("Clinician", permission_id, PermissionEffect::Allow)];

        let resolved = resolve_effective_permissions(&catalog, &[], &rules);

        assert!(resolved[0].allowed);
        assert_eq!(resolved[0].source, PermissionSource::Role);
        assert_eq!(resolved[0].details, "Granted by role 'Clinician'");
    }

    #[test]
    fn rule_order_does_not_change_decisions_or_details() {
        let permission_id = Uuid::new_v4();
        let catalog = vec![permission(permission_id, "patients", "view")];
        let first = rule("Radiology Lead", permission_id, PermissionEffect::Deny);
        let second = rule("Admissions", permission_id, PermissionEffect::Deny);
        let third = rule("Clinician", permission_id, PermissionEffect::Allow);

        let forward = resolve_effective_permissions(
            &catalog,
            &[],
            &[first.clone(), second.clone(), third.clone()],
        );
        let reversed = resolve_effective_permissions(&catalog, &[], &[third, second, first]);

        assert_eq!(forward, reversed);
        assert_eq!(forward[0].details, "Denied by role 'Admissions'");
    }

    #[test]
    fn rules_for_unknown_permissions_are_ignored() {
        let catalog = vec![permission(Uuid::new_v4(), "patients", "view")];
        let rules = vec![rule("Clinician", Uuid::new_v4(), PermissionEffect::Allow)];

        let resolved = resolve_effective_permissions(&catalog, &[], &rules);

        assert_eq!(resolved.len(), 1);
        assert!(!resolved[0].allowed);
        assert_eq!(resolved[0].source, PermissionSource::Denied);
    }

    struct FakeAccessRepository {
        catalog: Vec<PermissionDefinition>,
        overrides: HashMap<PrincipalId, Vec<UserPermissionOverride>>,
        rules: HashMap<PrincipalId, Vec<RolePermissionRule>>,
        upserted: Mutex<Vec<UserPermissionOverride>>,
        deleted: Mutex<Vec<(PrincipalId, Uuid)>>,
    }

    impl FakeAccessRepository {
        fn new(
            catalog: Vec<PermissionDefinition>,
            overrides: HashMap<PrincipalId, Vec<UserPermissionOverride>>,
            rules: HashMap<PrincipalId, Vec<RolePermissionRule>>,
        ) -> Self {
            Self {
                catalog,
                overrides,
                rules,
                upserted: Mutex::new(Vec::new()),
                deleted: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AccessRepository for FakeAccessRepository {
        async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionDefinition>> {
            Ok(self.catalog.clone())
        }

        async fn list_overrides_for_principal(
            &self,
            principal_id: PrincipalId,
        ) -> AppResult<Vec<UserPermissionOverride>> {
            Ok(self
                .overrides
                .get(&principal_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn list_role_rules_for_principal(
            &self,
            principal_id: PrincipalId,
        ) -> AppResult<Vec<RolePermissionRule>> {
            Ok(self.rules.get(&principal_id).cloned().unwrap_or_default())
        }

        async fn upsert_override(&self, override_row: UserPermissionOverride) -> AppResult<()> {
            self.upserted.lock().await.push(override_row);
            Ok(())
        }

        async fn delete_override(
            &self,
            principal_id: PrincipalId,
            permission_id: Uuid,
        ) -> AppResult<()> {
            self.deleted.lock().await.push((principal_id, permission_id));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeAuditRepository {
        events: Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl AuditRepository for FakeAuditRepository {
        async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
            self.events.lock().await.push(event);
            Ok(())
        }
    }

    fn admin_catalog_entry() -> (Uuid, PermissionDefinition) {
        let permission_id = Uuid::new_v4();
        let capability = AdminCapability::ManageAccess;
        (
            permission_id,
            permission(permission_id, capability.resource(), capability.action()),
        )
    }

    fn admin_service(
        actor_id: PrincipalId,
        extra_catalog: Vec<PermissionDefinition>,
    ) -> (AccessService, Arc<FakeAccessRepository>, Arc<FakeAuditRepository>) {
        let (manage_access_id, manage_access) = admin_catalog_entry();
        let mut catalog = vec![manage_access];
        catalog.extend(extra_catalog);

        let rules = HashMap::from([(
            actor_id,
            vec![rule("Administrator", manage_access_id, PermissionEffect::Allow)],
        )]);

        let repository = Arc::new(FakeAccessRepository::new(catalog, HashMap::new(), rules));
        let audit_repository = Arc::new(FakeAuditRepository::default());
        let service = AccessService::new(repository.clone(), audit_repository.clone());
        (service, repository, audit_repository)
    }

    fn actor(principal_id: PrincipalId) -> UserIdentity {
        UserIdentity::new(principal_id, "Alice Admin", None)
    }

    #[tokio::test]
    async fn effective_permissions_requires_manage_access() {
        let actor_id = PrincipalId::new();
        let (_, manage_access) = admin_catalog_entry();
        let repository = Arc::new(FakeAccessRepository::new(
            vec![manage_access],
            HashMap::new(),
            HashMap::new(),
        ));
        let service = AccessService::new(repository, Arc::new(FakeAuditRepository::default()));

        let result = service
            .effective_permissions(&actor(actor_id), PrincipalId::new())
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn capability_missing_from_catalog_is_default_deny() {
        let actor_id = PrincipalId::new();
        let repository = Arc::new(FakeAccessRepository::new(
            Vec::new(),
            HashMap::new(),
            HashMap::new(),
        ));
        let service = AccessService::new(repository, Arc::new(FakeAuditRepository::default()));

        let allowed = service
            .check_capability(actor_id, AdminCapability::ManageTargets)
            .await;

        assert!(matches!(allowed, Ok(false)));
    }

    #[tokio::test]
    async fn commit_upserts_and_deletes_staged_changes() {
        let actor_id = PrincipalId::new();
        let subject_id = PrincipalId::new();
        let view_id = Uuid::new_v4();
        let edit_id = Uuid::new_v4();
        let (service, repository, audit_repository) = admin_service(
            actor_id,
            vec![
                permission(view_id, "patients", "view"),
                permission(edit_id, "patients", "edit"),
            ],
        );

        let result = service
            .commit_override_changes(
                &actor(actor_id),
                subject_id,
                vec![
                    OverrideChange {
                        permission_id: view_id,
                        effect: Some(PermissionEffect::Deny),
                    },
                    OverrideChange {
                        permission_id: edit_id,
                        effect: None,
                    },
                ],
            )
            .await;

        assert!(result.is_ok());

        let upserted = repository.upserted.lock().await;
        assert_eq!(upserted.len(), 1);
        assert_eq!(upserted[0].permission_id, view_id);
        assert_eq!(upserted[0].effect, PermissionEffect::Deny);

        let deleted = repository.deleted.lock().await;
        assert_eq!(deleted.as_slice(), &[(subject_id, edit_id)]);

        assert_eq!(audit_repository.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn commit_rejects_unknown_permission() {
        let actor_id = PrincipalId::new();
        let (service, _, audit_repository) = admin_service(actor_id, Vec::new());

        let result = service
            .commit_override_changes(
                &actor(actor_id),
                PrincipalId::new(),
                vec![OverrideChange {
                    permission_id: Uuid::new_v4(),
                    effect: Some(PermissionEffect::Allow),
                }],
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(audit_repository.events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn report_reflects_override_and_role_layers() {
        let actor_id = PrincipalId::new();
        let subject_id = PrincipalId::new();
        let view_id = Uuid::new_v4();
        let edit_id = Uuid::new_v4();

        let (manage_access_id, manage_access) = admin_catalog_entry();
        let catalog = vec![
            manage_access,
            permission(view_id, "patients", "view"),
            permission(edit_id, "patients", "edit"),
        ];
        let overrides = HashMap::from([(
            subject_id,
            vec![UserPermissionOverride {
                principal_id: subject_id,
                permission_id: edit_id,
                effect: PermissionEffect::Allow,
            }],
        )]);
        let rules = HashMap::from([
            (
                actor_id,
                vec![rule("Administrator", manage_access_id, PermissionEffect::Allow)],
            ),
            (
                subject_id,
                vec![
                    rule("Clinician", view_id, PermissionEffect::Allow),
                    rule("Trainee", view_id, PermissionEffect::Deny),
                ],
            ),
        ]);

        let repository = Arc::new(FakeAccessRepository::new(catalog, overrides, rules));
        let service = AccessService::new(repository, Arc::new(FakeAuditRepository::default()));

        let resolved = service
            .effective_permissions(&actor(actor_id), subject_id)
            .await;

        assert!(resolved.is_ok());
        let resolved: Vec<EffectivePermission> = resolved.unwrap_or_default();
        assert_eq!(resolved.len(), 3);

        let view = resolved.iter().find(|entry| entry.permission_id == view_id);
        assert!(view.is_some_and(|entry| {
            !entry.allowed
                && entry.source == PermissionSource::Role
                && entry.details == "Denied by role 'Trainee'"
        }));

        let edit = resolved.iter().find(|entry| entry.permission_id == edit_id);
        assert!(edit.is_some_and(|entry| {
            entry.allowed && entry.source == PermissionSource::UserOverride
        }));
    }
}
