use crate::Database;
use crate::models::{RoleRow, StoryRow, UserRow, WebsiteRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &UserRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, uuid, first_name, last_name, user_name, email, role_id,
                                    email_is_verified, email_verify_token, password, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    user.id,
                    user.uuid,
                    user.first_name,
                    user.last_name,
                    user.user_name,
                    user.email,
                    user.role_id,
                    user.email_is_verified,
                    user.email_verify_token,
                    user.password,
                    user.status,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(&format!("SELECT {USER_COLS} FROM users WHERE id = ?1"))?
                .query_row([id], user_from_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(&format!("SELECT {USER_COLS} FROM users WHERE email = ?1"))?
                .query_row([email], user_from_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_users(&self, limit: u32, offset: u64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLS} FROM users ORDER BY created_at LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt
                .query_map(params![limit, offset as i64], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_users(&self) -> Result<u64> {
        self.with_conn(|conn| count_rows(conn, "users"))
    }

    pub fn update_user(&self, user: &UserRow) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users
                 SET first_name = ?2, last_name = ?3, user_name = ?4, email = ?5, role_id = ?6,
                     email_is_verified = ?7, email_verify_token = ?8, password = ?9,
                     password_reset_token = ?10, status = ?11, updated_at = datetime('now')
                 WHERE id = ?1",
                params![
                    user.id,
                    user.first_name,
                    user.last_name,
                    user.user_name,
                    user.email,
                    user.role_id,
                    user.email_is_verified,
                    user.email_verify_token,
                    user.password,
                    user.password_reset_token,
                    user.status,
                ],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_user_status(&self, id: &str, status: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
                params![id, status],
            )?;
            Ok(changed > 0)
        })
    }

    /// Marks the email verified and burns the verification token.
    pub fn set_email_verified(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users
                 SET email_is_verified = 1, email_verify_token = NULL, updated_at = datetime('now')
                 WHERE id = ?1",
                [id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Roles --

    pub fn create_role(&self, role_type: &str, permissions_json: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO roles (type, permissions) VALUES (?1, ?2)",
                params![role_type, permissions_json],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_role(&self, id: i64) -> Result<Option<RoleRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(&format!("SELECT {ROLE_COLS} FROM roles WHERE id = ?1"))?
                .query_row([id], role_from_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_role_by_type(&self, role_type: &str) -> Result<Option<RoleRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(&format!("SELECT {ROLE_COLS} FROM roles WHERE type = ?1"))?
                .query_row([role_type], role_from_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_roles(&self, limit: u32, offset: u64) -> Result<Vec<RoleRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ROLE_COLS} FROM roles ORDER BY id LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt
                .query_map(params![limit, offset as i64], role_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_roles(&self) -> Result<u64> {
        self.with_conn(|conn| count_rows(conn, "roles"))
    }

    pub fn update_role(&self, id: i64, role_type: &str, permissions_json: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE roles
                 SET type = ?2, permissions = ?3, updated_at = datetime('now')
                 WHERE id = ?1",
                params![id, role_type, permissions_json],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_role(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM roles WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Stories --

    pub fn create_story(&self, story: &StoryRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO stories (id, uuid, title, slug, is_featured, status, language, metas,
                                      author_id, publisher_id, markdown, primary_image_path, tags,
                                      published_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    story.id,
                    story.uuid,
                    story.title,
                    story.slug,
                    story.is_featured,
                    story.status,
                    story.language,
                    story.metas,
                    story.author_id,
                    story.publisher_id,
                    story.markdown,
                    story.primary_image_path,
                    story.tags,
                    story.published_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_story(&self, id: &str) -> Result<Option<StoryRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(&format!("SELECT {STORY_COLS} FROM stories WHERE id = ?1"))?
                .query_row([id], story_from_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_stories(&self, limit: u32, offset: u64) -> Result<Vec<StoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {STORY_COLS} FROM stories ORDER BY created_at DESC LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt
                .query_map(params![limit, offset as i64], story_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_stories(&self) -> Result<u64> {
        self.with_conn(|conn| count_rows(conn, "stories"))
    }

    pub fn update_story(&self, story: &StoryRow) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE stories
                 SET title = ?2, slug = ?3, is_featured = ?4, status = ?5, language = ?6,
                     metas = ?7, publisher_id = ?8, markdown = ?9, primary_image_path = ?10,
                     tags = ?11, published_at = ?12, updated_at = datetime('now')
                 WHERE id = ?1",
                params![
                    story.id,
                    story.title,
                    story.slug,
                    story.is_featured,
                    story.status,
                    story.language,
                    story.metas,
                    story.publisher_id,
                    story.markdown,
                    story.primary_image_path,
                    story.tags,
                    story.published_at,
                ],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_story(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM stories WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Websites --

    pub fn first_website(&self) -> Result<Option<WebsiteRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare("SELECT id, name, domain_name, is_secure FROM websites ORDER BY id LIMIT 1")?
                .query_row([], |row| {
                    Ok(WebsiteRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        domain_name: row.get(2)?,
                        is_secure: row.get(3)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }
}

const USER_COLS: &str = "id, uuid, first_name, last_name, user_name, email, role_id, \
                         email_is_verified, email_verify_token, password, password_reset_token, \
                         status, created_at, updated_at";

const ROLE_COLS: &str = "id, type, permissions, created_at, updated_at";

const STORY_COLS: &str = "id, uuid, title, slug, is_featured, status, language, metas, author_id, \
                          publisher_id, markdown, primary_image_path, tags, published_at, \
                          created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        uuid: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        user_name: row.get(4)?,
        email: row.get(5)?,
        role_id: row.get(6)?,
        email_is_verified: row.get(7)?,
        email_verify_token: row.get(8)?,
        password: row.get(9)?,
        password_reset_token: row.get(10)?,
        status: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn role_from_row(row: &Row<'_>) -> rusqlite::Result<RoleRow> {
    Ok(RoleRow {
        id: row.get(0)?,
        role_type: row.get(1)?,
        permissions: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn story_from_row(row: &Row<'_>) -> rusqlite::Result<StoryRow> {
    Ok(StoryRow {
        id: row.get(0)?,
        uuid: row.get(1)?,
        title: row.get(2)?,
        slug: row.get(3)?,
        is_featured: row.get(4)?,
        status: row.get(5)?,
        language: row.get(6)?,
        metas: row.get(7)?,
        author_id: row.get(8)?,
        publisher_id: row.get(9)?,
        markdown: row.get(10)?,
        primary_image_path: row.get(11)?,
        tags: row.get(12)?,
        published_at: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

fn count_rows(conn: &Connection, table: &str) -> Result<u64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    Ok(count as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, user_name: &str, email: &str) -> UserRow {
        UserRow {
            id: id.into(),
            uuid: format!("uuid-{id}"),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            user_name: user_name.into(),
            email: email.into(),
            role_id: None,
            email_is_verified: false,
            email_verify_token: None,
            password: "$argon2id$stub".into(),
            password_reset_token: None,
            status: "Active".into(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn seeds_admin_role() {
        let db = Database::open_in_memory().unwrap();
        let admin = db.get_role_by_type("Admin").unwrap().unwrap();
        let perms: Vec<String> = serde_json::from_str(&admin.permissions).unwrap();
        assert_eq!(perms.len(), 6);
        assert!(perms.contains(&"Add-User".to_string()));
    }

    #[test]
    fn user_crud_round_trip() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&user("u1", "ada", "ada@example.com")).unwrap();

        let mut stored = db.get_user("u1").unwrap().unwrap();
        assert_eq!(stored.user_name, "ada");
        assert_eq!(stored.status, "Active");
        assert!(!stored.created_at.is_empty());

        stored.first_name = "Augusta".into();
        assert!(db.update_user(&stored).unwrap());
        assert_eq!(db.get_user("u1").unwrap().unwrap().first_name, "Augusta");

        assert!(db.set_user_status("u1", "Deleted").unwrap());
        assert_eq!(db.get_user("u1").unwrap().unwrap().status, "Deleted");

        assert!(db.delete_user("u1").unwrap());
        assert!(db.get_user("u1").unwrap().is_none());
        assert!(!db.delete_user("u1").unwrap());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&user("u1", "ada", "ada@example.com")).unwrap();
        assert!(db.create_user(&user("u2", "ada2", "ada@example.com")).is_err());
    }

    #[test]
    fn role_listing_and_count() {
        let db = Database::open_in_memory().unwrap();
        db.create_role("Author", r#"["Write","Read"]"#).unwrap();
        db.create_role("Guest", r#"["Read","Comment"]"#).unwrap();

        // Admin seed + the two above
        assert_eq!(db.count_roles().unwrap(), 3);
        let page = db.list_roles(2, 0).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].role_type, "Admin");

        let rest = db.list_roles(2, 2).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].role_type, "Guest");
    }

    #[test]
    fn story_belongs_to_existing_author() {
        let db = Database::open_in_memory().unwrap();
        let story = StoryRow {
            id: "s1".into(),
            uuid: "uuid-s1".into(),
            title: "Hello".into(),
            slug: "hello".into(),
            is_featured: false,
            status: "editing".into(),
            language: "en".into(),
            metas: "{}".into(),
            author_id: "missing".into(),
            publisher_id: None,
            markdown: "# Hello".into(),
            primary_image_path: None,
            tags: "[]".into(),
            published_at: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        // No such user — foreign key must reject
        assert!(db.create_story(&story).is_err());

        db.create_user(&user("a1", "ada", "ada@example.com")).unwrap();
        let story = StoryRow { author_id: "a1".into(), ..story };
        db.create_story(&story).unwrap();
        assert_eq!(db.count_stories().unwrap(), 1);
        assert!(db.delete_story("s1").unwrap());
    }
}
