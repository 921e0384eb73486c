use async_trait::async_trait;

use atrium_core::AppResult;
use atrium_domain::DirectoryMember;

/// Directory row joined with its stored credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryCredential {
    /// The directory entry.
    pub member: DirectoryMember,
    /// Argon2id password hash.
    pub password_hash: String,
}

/// Repository port for the staff directory.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// Lists all directory members ordered by display name.
    async fn list_members(&self) -> AppResult<Vec<DirectoryMember>>;

    /// Finds a member and credential by email (case-insensitive).
    async fn find_credential_by_email(
        &self,
        email: &str,
    ) -> AppResult<Option<DirectoryCredential>>;
}

/// Port for password hashing and verification.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password for storage.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}
