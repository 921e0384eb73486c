use std::sync::Arc;

use atrium_core::{AppResult, UserIdentity};
use atrium_domain::{AdminCapability, DirectoryMember};

use crate::{AccessService, DirectoryRepository};

/// Application service for the staff directory.
#[derive(Clone)]
pub struct DirectoryService {
    access_service: AccessService,
    repository: Arc<dyn DirectoryRepository>,
}

impl DirectoryService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(access_service: AccessService, repository: Arc<dyn DirectoryRepository>) -> Self {
        Self {
            access_service,
            repository,
        }
    }

    /// Returns all directory members ordered by display name.
    pub async fn list_members(&self, actor: &UserIdentity) -> AppResult<Vec<DirectoryMember>> {
        self.access_service
            .require_capability(actor.principal_id(), AdminCapability::ViewDirectory)
            .await?;

        self.repository.list_members().await
    }
}
