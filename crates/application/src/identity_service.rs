use std::sync::Arc;

use atrium_core::{AppError, AppResult, UserIdentity};

use crate::{DirectoryRepository, PasswordHasher};

/// Application service for email/password authentication against the
/// staff directory.
///
/// Failures are reported with one generic message (unknown email and
/// wrong password are indistinguishable) to prevent enumeration.
#[derive(Clone)]
pub struct IdentityService {
    repository: Arc<dyn DirectoryRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl IdentityService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn DirectoryRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            repository,
            password_hasher,
        }
    }

    /// Authenticates a directory member and returns their identity.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<UserIdentity> {
        let credential = self.repository.find_credential_by_email(email).await?;

        let Some(credential) = credential else {
            // Always hash to keep unknown-email timing in line.
            let _ = self.password_hasher.hash_password(password);
            return Err(invalid_credentials());
        };

        if !self
            .password_hasher
            .verify_password(password, &credential.password_hash)?
        {
            return Err(invalid_credentials());
        }

        Ok(UserIdentity::new(
            credential.member.principal_id,
            credential.member.display_name,
            Some(credential.member.email),
        ))
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("invalid email or password".to_owned())
}
