use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use atrium_application::{DirectoryCredential, DirectoryRepository};
use atrium_core::{AppError, AppResult, PrincipalId};
use atrium_domain::DirectoryMember;

/// PostgreSQL-backed repository for the staff directory.
#[derive(Clone)]
pub struct PostgresDirectoryRepository {
    pool: PgPool,
}

impl PostgresDirectoryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct MemberRow {
    id: Uuid,
    display_name: String,
    email: String,
    extension: Option<String>,
    department: Option<String>,
}

#[derive(Debug, FromRow)]
struct CredentialRow {
    id: Uuid,
    display_name: String,
    email: String,
    extension: Option<String>,
    department: Option<String>,
    password_hash: String,
}

#[async_trait]
impl DirectoryRepository for PostgresDirectoryRepository {
    async fn list_members(&self) -> AppResult<Vec<DirectoryMember>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, display_name, email, extension, department
            FROM directory_members
            ORDER BY display_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list directory members: {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| DirectoryMember {
                principal_id: PrincipalId::from_uuid(row.id),
                display_name: row.display_name,
                email: row.email,
                extension: row.extension,
                department: row.department,
            })
            .collect())
    }

    async fn find_credential_by_email(
        &self,
        email: &str,
    ) -> AppResult<Option<DirectoryCredential>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, display_name, email, extension, department, password_hash
            FROM directory_members
            WHERE lower(email) = lower($1)
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to look up directory credential: {error}"))
        })?;

        Ok(row.map(|row| DirectoryCredential {
            member: DirectoryMember {
                principal_id: PrincipalId::from_uuid(row.id),
                display_name: row.display_name,
                email: row.email,
                extension: row.extension,
                department: row.department,
            },
            password_hash: row.password_hash,
        }))
    }
}
