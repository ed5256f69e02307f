use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// -- User statuses --

pub const USER_STATUS_ACTIVE: &str = "Active";
pub const USER_STATUS_SUSPENDED: &str = "Suspended";
pub const USER_STATUS_DELETED: &str = "Deleted";

// -- Role permissions --

pub const PERM_PUBLISH: &str = "Publish";
pub const PERM_EDIT: &str = "Edit";
pub const PERM_WRITE: &str = "Write";
pub const PERM_ADD_USER: &str = "Add-User";
pub const PERM_READ: &str = "Read";
pub const PERM_COMMENT: &str = "Comment";

/// Every permission a role can carry, in seed order.
pub const ALL_PERMISSIONS: [&str; 6] = [
    PERM_PUBLISH,
    PERM_EDIT,
    PERM_WRITE,
    PERM_ADD_USER,
    PERM_READ,
    PERM_COMMENT,
];

/// Story workflow state. Stored lowercase, matching the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    Editing,
    Reviewed,
    Private,
    Published,
}

impl Default for StoryStatus {
    fn default() -> Self {
        StoryStatus::Editing
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StoryStatus::Editing => "editing",
            StoryStatus::Reviewed => "reviewed",
            StoryStatus::Private => "private",
            StoryStatus::Published => "published",
        };
        f.write_str(s)
    }
}

impl FromStr for StoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "editing" => Ok(StoryStatus::Editing),
            "reviewed" => Ok(StoryStatus::Reviewed),
            "private" => Ok(StoryStatus::Private),
            "published" => Ok(StoryStatus::Published),
            other => Err(format!("unknown story status '{}'", other)),
        }
    }
}

/// A site this instance serves content for. Only used to build absolute URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Website {
    pub id: i64,
    pub name: String,
    pub domain_name: String,
    pub is_secure: bool,
}

impl Website {
    pub fn base_url(&self, path: &str) -> String {
        if self.domain_name.is_empty() {
            return path.to_string();
        }
        let scheme = if self.is_secure { "https" } else { "http" };
        format!("{}://{}/{}", scheme, self.domain_name, path)
    }
}
