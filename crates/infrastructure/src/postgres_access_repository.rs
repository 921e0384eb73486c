use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use atrium_application::AccessRepository;
use atrium_core::{AppError, AppResult, PrincipalId};
use atrium_domain::{
    PermissionDefinition, PermissionEffect, RolePermissionRule, UserPermissionOverride,
};

/// PostgreSQL-backed repository for permission catalog and grant lookups.
#[derive(Clone)]
pub struct PostgresAccessRepository {
    pool: PgPool,
}

impl PostgresAccessRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: Uuid,
    resource: String,
    action: String,
    description: Option<String>,
}

#[derive(Debug, FromRow)]
struct OverrideRow {
    principal_id: Uuid,
    permission_id: Uuid,
    effect: String,
}

#[derive(Debug, FromRow)]
struct RoleRuleRow {
    role_id: Uuid,
    role_name: String,
    permission_id: Uuid,
    effect: String,
}

#[async_trait]
impl AccessRepository for PostgresAccessRepository {
    async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionDefinition>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, resource, action, description
            FROM permissions
            ORDER BY resource, action
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permission catalog: {error}"))
        })?;

        rows.into_iter()
            .map(|row| {
                PermissionDefinition::new(row.id, row.resource, row.action, row.description)
                    .map_err(|error| {
                        AppError::Internal(format!(
                            "invalid stored permission '{}': {error}",
                            row.id
                        ))
                    })
            })
            .collect()
    }

    async fn list_overrides_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<UserPermissionOverride>> {
        let rows = sqlx::query_as::<_, OverrideRow>(
            r#"
            SELECT principal_id, permission_id, effect
            FROM user_permission_overrides
            WHERE principal_id = $1
            "#,
        )
        .bind(principal_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list overrides: {error}")))?;

        rows.into_iter()
            .map(|row| {
                Ok(UserPermissionOverride {
                    principal_id: PrincipalId::from_uuid(row.principal_id),
                    permission_id: row.permission_id,
                    effect: parse_effect(&row.effect, row.permission_id)?,
                })
            })
            .collect()
    }

    async fn list_role_rules_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<RolePermissionRule>> {
        let rows = sqlx::query_as::<_, RoleRuleRow>(
            r#"
            SELECT
                rules.role_id,
                roles.name AS role_name,
                rules.permission_id,
                rules.effect
            FROM role_permission_rules AS rules
            INNER JOIN roles
                ON roles.id = rules.role_id
            INNER JOIN principal_roles AS assignments
                ON assignments.role_id = rules.role_id
            WHERE assignments.principal_id = $1
            ORDER BY roles.name, rules.permission_id
            "#,
        )
        .bind(principal_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role rules: {error}")))?;

        rows.into_iter()
            .map(|row| {
                Ok(RolePermissionRule {
                    role_id: row.role_id,
                    role_name: row.role_name,
                    permission_id: row.permission_id,
                    effect: parse_effect(&row.effect, row.permission_id)?,
                })
            })
            .collect()
    }

    async fn upsert_override(&self, override_row: UserPermissionOverride) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_permission_overrides (principal_id, permission_id, effect)
            VALUES ($1, $2, $3)
            ON CONFLICT (principal_id, permission_id)
            DO UPDATE
            SET effect = EXCLUDED.effect,
                updated_at = now()
            "#,
        )
        .bind(override_row.principal_id.as_uuid())
        .bind(override_row.permission_id)
        .bind(override_row.effect.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to upsert override: {error}")))?;

        Ok(())
    }

    async fn delete_override(
        &self,
        principal_id: PrincipalId,
        permission_id: Uuid,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM user_permission_overrides
            WHERE principal_id = $1
              AND permission_id = $2
            "#,
        )
        .bind(principal_id.as_uuid())
        .bind(permission_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete override: {error}")))?;

        Ok(())
    }
}

fn parse_effect(value: &str, permission_id: Uuid) -> AppResult<PermissionEffect> {
    PermissionEffect::from_str(value).map_err(|error| {
        AppError::Internal(format!(
            "invalid stored effect for permission '{permission_id}': {error}"
        ))
    })
}
