use serde::Serialize;
use ts_rs::TS;

use atrium_domain::DirectoryMember;

/// API representation of one staff directory entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/directory-member-response.ts"
)]
pub struct DirectoryMemberResponse {
    pub principal_id: String,
    pub display_name: String,
    pub email: String,
    pub extension: Option<String>,
    pub department: Option<String>,
}

impl From<DirectoryMember> for DirectoryMemberResponse {
    fn from(value: DirectoryMember) -> Self {
        Self {
            principal_id: value.principal_id.to_string(),
            display_name: value.display_name,
            email: value.email,
            extension: value.extension,
            department: value.department,
        }
    }
}
