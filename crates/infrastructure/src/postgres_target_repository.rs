use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use atrium_application::{NewTargetVersion, TargetRepository};
use atrium_core::{AppError, AppResult, PrincipalId};
use atrium_domain::{ModalityTarget, TargetChanges};

/// PostgreSQL-backed repository for modality target persistence.
#[derive(Clone)]
pub struct PostgresTargetRepository {
    pool: PgPool,
}

impl PostgresTargetRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TargetRow {
    id: Uuid,
    principal_id: Uuid,
    location_id: Uuid,
    modality_type_id: Uuid,
    target_period: String,
    period_start: NaiveDate,
    period_end: NaiveDate,
    target_scans: i64,
    target_referrals: i64,
    target_revenue: f64,
    version: i32,
    is_current: bool,
    superseded_by: Option<Uuid>,
    superseded_at: Option<String>,
}

impl From<TargetRow> for ModalityTarget {
    fn from(row: TargetRow) -> Self {
        Self {
            target_id: row.id,
            principal_id: PrincipalId::from_uuid(row.principal_id),
            location_id: row.location_id,
            modality_type_id: row.modality_type_id,
            target_period: row.target_period,
            period_start: row.period_start,
            period_end: row.period_end,
            target_scans: row.target_scans,
            target_referrals: row.target_referrals,
            target_revenue: row.target_revenue,
            version: row.version,
            is_current: row.is_current,
            superseded_by: row.superseded_by,
            superseded_at: row.superseded_at,
        }
    }
}

const TARGET_COLUMNS: &str = r#"
    id,
    principal_id,
    location_id,
    modality_type_id,
    target_period,
    period_start,
    period_end,
    target_scans,
    target_referrals,
    target_revenue,
    version,
    is_current,
    superseded_by,
    to_char(superseded_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS superseded_at
"#;

#[async_trait]
impl TargetRepository for PostgresTargetRepository {
    async fn find_target(&self, target_id: Uuid) -> AppResult<Option<ModalityTarget>> {
        let row = sqlx::query_as::<_, TargetRow>(&format!(
            r#"
            SELECT {TARGET_COLUMNS}
            FROM modality_targets
            WHERE id = $1
            "#
        ))
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load target: {error}")))?;

        Ok(row.map(ModalityTarget::from))
    }

    async fn update_target_values(
        &self,
        target_id: Uuid,
        changes: &TargetChanges,
    ) -> AppResult<ModalityTarget> {
        let row = sqlx::query_as::<_, TargetRow>(&format!(
            r#"
            UPDATE modality_targets
            SET target_scans = COALESCE($2, target_scans),
                target_referrals = COALESCE($3, target_referrals),
                target_revenue = COALESCE($4, target_revenue),
                updated_at = now()
            WHERE id = $1
            RETURNING {TARGET_COLUMNS}
            "#
        ))
        .bind(target_id)
        .bind(changes.target_scans)
        .bind(changes.target_referrals)
        .bind(changes.target_revenue)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update target: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("modality target '{target_id}' was not found")))?;

        Ok(ModalityTarget::from(row))
    }

    async fn supersede_target(
        &self,
        target_id: Uuid,
        truncated_end: NaiveDate,
        successor: NewTargetVersion,
    ) -> AppResult<ModalityTarget> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let current = sqlx::query_as::<_, TargetRow>(&format!(
            r#"
            SELECT {TARGET_COLUMNS}
            FROM modality_targets
            WHERE id = $1
            FOR UPDATE
            "#
        ))
        .bind(target_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock target: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("modality target '{target_id}' was not found")))?;

        if !current.is_current {
            return Err(AppError::Conflict(format!(
                "modality target '{target_id}' has already been superseded"
            )));
        }

        let new_id = Uuid::new_v4();

        // Retire first: the partial unique index allows only one
        // current row per (principal, location, modality) key.
        sqlx::query(
            r#"
            UPDATE modality_targets
            SET period_end = $2,
                is_current = false,
                superseded_at = now(),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(target_id)
        .bind(truncated_end)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to retire superseded version: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO modality_targets (
                id,
                principal_id,
                location_id,
                modality_type_id,
                target_period,
                period_start,
                period_end,
                target_scans,
                target_referrals,
                target_revenue,
                version,
                is_current
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, true)
            "#,
        )
        .bind(new_id)
        .bind(current.principal_id)
        .bind(current.location_id)
        .bind(current.modality_type_id)
        .bind(current.target_period.as_str())
        .bind(successor.period_start)
        .bind(successor.period_end)
        .bind(successor.target_scans)
        .bind(successor.target_referrals)
        .bind(successor.target_revenue)
        .bind(successor.version)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to insert successor version: {error}"))
        })?;

        sqlx::query(
            r#"
            UPDATE modality_targets
            SET superseded_by = $2
            WHERE id = $1
            "#,
        )
        .bind(target_id)
        .bind(new_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to back-link superseded version: {error}"))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(ModalityTarget {
            target_id: new_id,
            principal_id: PrincipalId::from_uuid(current.principal_id),
            location_id: current.location_id,
            modality_type_id: current.modality_type_id,
            target_period: current.target_period,
            period_start: successor.period_start,
            period_end: successor.period_end,
            target_scans: successor.target_scans,
            target_referrals: successor.target_referrals,
            target_revenue: successor.target_revenue,
            version: successor.version,
            is_current: true,
            superseded_by: None,
            superseded_at: None,
        })
    }
}
