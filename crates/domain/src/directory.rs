use atrium_core::PrincipalId;
use serde::{Deserialize, Serialize};

/// One staff directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryMember {
    /// Stable principal identifier.
    pub principal_id: PrincipalId,
    /// Full display name.
    pub display_name: String,
    /// Work email address.
    pub email: String,
    /// Internal phone extension, if assigned.
    pub extension: Option<String>,
    /// Department label, if assigned.
    pub department: Option<String>,
}
