use atrium_application::{AccessService, DirectoryService, IdentityService, TargetService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub access_service: AccessService,
    pub target_service: TargetService,
    pub directory_service: DirectoryService,
    pub identity_service: IdentityService,
    pub frontend_url: String,
}
