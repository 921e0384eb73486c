use serde::{Deserialize, Serialize};

use crate::PrincipalId;

/// User information persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    principal_id: PrincipalId,
    display_name: String,
    email: Option<String>,
}

impl UserIdentity {
    /// Creates a user identity from directory data.
    #[must_use]
    pub fn new(
        principal_id: PrincipalId,
        display_name: impl Into<String>,
        email: Option<String>,
    ) -> Self {
        Self {
            principal_id,
            display_name: display_name.into(),
            email,
        }
    }

    /// Returns the stable principal identifier.
    #[must_use]
    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if the directory holds one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}
