/// Database row types — these map directly to SQLite rows.
/// Distinct from the typewrite-types API models to keep the DB layer
/// independent of the wire format.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub uuid: String,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
    pub role_id: Option<i64>,
    pub email_is_verified: bool,
    pub email_verify_token: Option<String>,
    pub password: String,
    pub password_reset_token: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct RoleRow {
    pub id: i64,
    pub role_type: String,
    /// JSON array of permission constants.
    pub permissions: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct StoryRow {
    pub id: String,
    pub uuid: String,
    pub title: String,
    pub slug: String,
    pub is_featured: bool,
    pub status: String,
    pub language: String,
    /// JSON object of site meta key/values.
    pub metas: String,
    pub author_id: String,
    pub publisher_id: Option<String>,
    pub markdown: String,
    pub primary_image_path: Option<String>,
    /// JSON array of tag strings.
    pub tags: String,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct WebsiteRow {
    pub id: i64,
    pub name: String,
    pub domain_name: String,
    pub is_secure: bool,
}
