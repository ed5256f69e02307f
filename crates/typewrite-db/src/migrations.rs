use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS roles (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            type        TEXT NOT NULL UNIQUE,
            permissions TEXT NOT NULL DEFAULT '[]',
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS users (
            id                   TEXT PRIMARY KEY,
            uuid                 TEXT NOT NULL,
            first_name           TEXT NOT NULL,
            last_name            TEXT NOT NULL,
            user_name            TEXT NOT NULL UNIQUE,
            email                TEXT NOT NULL UNIQUE,
            role_id              INTEGER REFERENCES roles(id),
            email_is_verified    INTEGER NOT NULL DEFAULT 0,
            email_verify_token   TEXT,
            password             TEXT NOT NULL,
            password_reset_token TEXT,
            status               TEXT NOT NULL DEFAULT 'Active',
            created_at           TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at           TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS stories (
            id                 TEXT PRIMARY KEY,
            uuid               TEXT NOT NULL,
            title              TEXT NOT NULL,
            slug               TEXT NOT NULL,
            is_featured        INTEGER NOT NULL DEFAULT 0,
            status             TEXT NOT NULL DEFAULT 'editing',
            language           TEXT NOT NULL DEFAULT 'en',
            metas              TEXT NOT NULL DEFAULT '{}',
            author_id          TEXT NOT NULL REFERENCES users(id),
            publisher_id       TEXT REFERENCES users(id),
            markdown           TEXT NOT NULL,
            primary_image_path TEXT,
            tags               TEXT NOT NULL DEFAULT '[]',
            published_at       TEXT,
            created_at         TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at         TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_stories_author
            ON stories(author_id, created_at);

        CREATE TABLE IF NOT EXISTS websites (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            domain_name TEXT NOT NULL,
            is_secure   INTEGER NOT NULL DEFAULT 0
        );

        -- Seed the default Admin role with every permission
        INSERT OR IGNORE INTO roles (type, permissions)
            VALUES ('Admin', '["Publish","Edit","Write","Add-User","Read","Comment"]');
        "#,
    )?;

    info!("Database migrations complete");
    Ok(())
}
