use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::StoryStatus;

// -- JWT claims --

/// Claims shared by login tokens and email verification tokens. The payload
/// mirrors the public subset of the user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User id (md5 hex of the user's uuid).
    pub sub: String,
    pub user_name: String,
    pub email: String,
    /// Role type name, e.g. "Admin".
    pub role: String,
    pub exp: usize,
}

// -- Pagination --

/// Pagination block attached to every list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub count: u64,
    pub limit: u32,
    pub next: Option<u32>,
    pub prev: Option<u32>,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
    pub password: String,
    /// Role id; defaults to none.
    #[serde(default)]
    pub role: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<i64>,
    pub status: Option<String>,
}

/// Outgoing user shape. The uuid, password hash and both tokens never leave
/// the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
    pub role: Option<i64>,
    pub email_is_verified: bool,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

// -- Roles --

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    #[serde(rename = "type")]
    pub role_type: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRoleRequest {
    #[serde(rename = "type")]
    pub role_type: Option<String>,
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub role_type: String,
    pub permissions: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

// -- Stories --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoryRequest {
    pub title: String,
    pub markdown: String,
    /// Author user id.
    pub author: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub status: Option<StoryStatus>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub primary_image_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoryRequest {
    pub title: Option<String>,
    pub markdown: Option<String>,
    pub publisher: Option<String>,
    pub status: Option<StoryStatus>,
    pub language: Option<String>,
    pub is_featured: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub primary_image_path: Option<String>,
    pub metas: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub is_featured: bool,
    pub status: StoryStatus,
    pub language: String,
    pub metas: Value,
    pub author: String,
    pub publisher: Option<String>,
    pub markdown: String,
    /// Rendered from markdown; backed by the per-story cache file.
    pub html: String,
    pub primary_image_path: Option<String>,
    pub tags: Vec<String>,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
