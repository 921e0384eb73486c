use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use atrium_application::{NewTargetAuditRecord, TargetAuditQuery, TargetAuditRepository};
use atrium_core::{AppError, AppResult, PrincipalId};
use atrium_domain::{TargetAuditAction, TargetAuditRecord};

/// PostgreSQL-backed repository for the append-only target audit trail.
#[derive(Clone)]
pub struct PostgresTargetAuditRepository {
    pool: PgPool,
}

impl PostgresTargetAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditRecordRow {
    audit_id: Uuid,
    target_id: Uuid,
    principal_id: Uuid,
    action: String,
    changed_by: Uuid,
    old_values: Value,
    new_values: Value,
    notes: Option<String>,
    created_at: String,
}

#[async_trait]
impl TargetAuditRepository for PostgresTargetAuditRepository {
    async fn append_record(&self, record: NewTargetAuditRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO target_audit_records (
                target_id,
                principal_id,
                action,
                changed_by,
                old_values,
                new_values,
                notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.target_id)
        .bind(record.principal_id.as_uuid())
        .bind(record.action.as_str())
        .bind(record.changed_by.as_uuid())
        .bind(record.old_values)
        .bind(record.new_values)
        .bind(record.notes)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to append target audit record: {error}"))
        })?;

        Ok(())
    }

    async fn list_recent_records(
        &self,
        query: TargetAuditQuery,
    ) -> AppResult<Vec<TargetAuditRecord>> {
        let capped_limit = query.limit.clamp(1, 100) as i64;
        let rows = sqlx::query_as::<_, AuditRecordRow>(
            r#"
            SELECT
                id AS audit_id,
                target_id,
                principal_id,
                action,
                changed_by,
                old_values,
                new_values,
                notes,
                to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
            FROM target_audit_records
            WHERE ($1::UUID IS NULL OR target_id = $1)
              AND ($2::UUID IS NULL OR principal_id = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(query.target_id)
        .bind(query.principal_id.map(|principal_id| principal_id.as_uuid()))
        .bind(capped_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list target audit records: {error}"))
        })?;

        rows.into_iter()
            .map(|row| {
                let action = TargetAuditAction::from_str(row.action.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "invalid stored audit action for record '{}': {error}",
                        row.audit_id
                    ))
                })?;

                Ok(TargetAuditRecord {
                    audit_id: row.audit_id,
                    target_id: row.target_id,
                    principal_id: PrincipalId::from_uuid(row.principal_id),
                    action,
                    changed_by: PrincipalId::from_uuid(row.changed_by),
                    old_values: row.old_values,
                    new_values: row.new_values,
                    notes: row.notes,
                    created_at: row.created_at,
                })
            })
            .collect()
    }
}
