use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;

/// SMTP settings for the verification mailer. Absent settings disable mail
/// delivery entirely.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// Application configuration, merged from environment variables (the `.env`
/// file is loaded by the binary before this runs) and an optional JSON
/// override file named by `APP_CONFIG_FILE`. Environment wins over JSON.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub story_cache_dir: PathBuf,
    pub jwt_secret: String,
    pub token_expiry_days: i64,
    /// Fallback base URL for links when no website row exists.
    pub app_url: String,
    /// Role types allowed to hard-delete users.
    pub admin_roles: Vec<String>,
    pub smtp: Option<SmtpConfig>,
    overrides: Value,
}

pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".into(),
            host: "0.0.0.0".into(),
            port: 3000,
            db_path: PathBuf::from("typewrite.db"),
            story_cache_dir: PathBuf::from("storage/stories"),
            jwt_secret: DEFAULT_JWT_SECRET.into(),
            token_expiry_days: 7,
            app_url: "http://localhost:3000".into(),
            admin_roles: vec!["Admin".into()],
            smtp: None,
            overrides: Value::Null,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let overrides = match std::env::var("APP_CONFIG_FILE") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {path}"))?;
                serde_json::from_str(&raw).with_context(|| format!("parsing config file {path}"))?
            }
            Err(_) => Value::Null,
        };

        let environment =
            lookup(&overrides, "APP_ENV", "app.environment").unwrap_or_else(|| "development".into());
        let host = lookup(&overrides, "APP_HOST", "app.host").unwrap_or_else(|| "0.0.0.0".into());
        let port = lookup(&overrides, "APP_PORT", "app.port")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("APP_PORT must be a port number")?;
        let db_path =
            lookup(&overrides, "APP_DB_PATH", "app.dbPath").unwrap_or_else(|| "typewrite.db".into());
        let story_cache_dir = lookup(&overrides, "STORY_CACHE_DIR", "app.storyFilePath")
            .unwrap_or_else(|| "storage/stories".into());
        let jwt_secret =
            lookup(&overrides, "APP_SECRET", "app.secret").unwrap_or_else(|| DEFAULT_JWT_SECRET.into());
        let token_expiry_days = lookup(&overrides, "APP_TOKEN_EXPIRY", "app.tokenExpiryDays")
            .unwrap_or_else(|| "7".into())
            .parse()
            .context("APP_TOKEN_EXPIRY must be a day count")?;
        let app_url =
            lookup(&overrides, "APP_URL", "app.url").unwrap_or_else(|| "http://localhost:3000".into());
        let admin_roles = lookup(&overrides, "APP_ADMIN_ROLES", "app.adminRoles")
            .unwrap_or_else(|| "Admin".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let smtp = match (
            lookup(&overrides, "SMTP_HOST", "smtp.host"),
            lookup(&overrides, "SMTP_FROM", "smtp.from"),
        ) {
            (Some(host), Some(from)) => Some(SmtpConfig {
                host,
                port: lookup(&overrides, "SMTP_PORT", "smtp.port")
                    .unwrap_or_else(|| "587".into())
                    .parse()
                    .context("SMTP_PORT must be a port number")?,
                username: lookup(&overrides, "SMTP_USER", "smtp.username").unwrap_or_default(),
                password: lookup(&overrides, "SMTP_PASS", "smtp.password").unwrap_or_default(),
                from,
            }),
            _ => None,
        };

        Ok(Self {
            environment,
            host,
            port,
            db_path: PathBuf::from(db_path),
            story_cache_dir: PathBuf::from(story_cache_dir),
            jwt_secret,
            token_expiry_days,
            app_url,
            admin_roles,
            smtp,
            overrides,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Dotted-path access into the JSON override file, for settings the typed
    /// fields do not cover.
    pub fn get(&self, path: &str) -> Option<&Value> {
        dot_get(&self.overrides, path)
    }
}

/// Environment wins; the JSON override file fills the gaps.
fn lookup(overrides: &Value, env_key: &str, json_path: &str) -> Option<String> {
    std::env::var(env_key)
        .ok()
        .or_else(|| dot_get(overrides, json_path).and_then(value_to_string))
}

fn dot_get<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for key in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
