use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use typewrite_api::auth::{AppState, AppStateInner};
use typewrite_api::config::Config;
use typewrite_db::Database;

struct TestApp {
    router: Router,
    state: AppState,
    cache_dir: TempDir,
}

fn test_app() -> TestApp {
    test_app_with(Config::default())
}

fn test_app_with(mut config: Config) -> TestApp {
    let cache_dir = tempfile::tempdir().unwrap();
    config.story_cache_dir = cache_dir.path().to_path_buf();
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        config,
    });
    TestApp {
        router: typewrite_server::app(state.clone()),
        state,
        cache_dir,
    }
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_user(app: &Router, user_name: &str, email: &str, role: Option<i64>) -> Value {
    let (status, body) = request(
        app,
        "POST",
        "/api/v1/user",
        Some(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "userName": user_name,
            "email": email,
            "password": "s3cret-pass",
            "role": role,
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "user creation failed: {body}");
    body["user"].clone()
}

#[tokio::test]
async fn root_route_responds() {
    let app = test_app();
    let (status, body) = request(&app.router, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Connection Successful" }));
}

#[tokio::test]
async fn roles_list_has_pagination_contract() {
    let app = test_app();
    let (status, body) = request(&app.router, "GET", "/api/v1/roles", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let roles = body["roles"].as_array().unwrap();
    assert!(!roles.is_empty());
    let role = roles[0].as_object().unwrap();
    for key in ["id", "type", "permissions", "createdAt", "updatedAt"] {
        assert!(role.contains_key(key), "role missing key {key}");
    }

    let pagination = body["pagination"].as_object().unwrap();
    for key in ["currentPage", "totalPages", "count", "limit", "prev", "next"] {
        assert!(pagination.contains_key(key), "pagination missing key {key}");
    }
    assert_eq!(body["pagination"]["currentPage"], 1);
    assert_eq!(body["pagination"]["prev"], Value::Null);
}

#[tokio::test]
async fn role_crud_round_trip() {
    let app = test_app();

    let (status, body) = request(
        &app.router,
        "POST",
        "/api/v1/role",
        Some(json!({ "type": "Author", "permissions": ["Write", "Read"] })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["role"]["id"].as_i64().unwrap();
    assert_eq!(body["role"]["type"], "Author");

    let (status, body) = request(
        &app.router,
        "PUT",
        &format!("/api/v1/role/{id}"),
        Some(json!({ "type": "Publisher", "permissions": ["Publish", "Edit", "Write", "Read", "Comment"] })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"]["type"], "Publisher");
    assert_eq!(body["role"]["permissions"].as_array().unwrap().len(), 5);

    let (status, body) = request(&app.router, "DELETE", &format!("/api/v1/role/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let (status, body) = request(&app.router, "GET", &format!("/api/v1/role/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn unknown_permission_is_rejected() {
    let app = test_app();
    let (status, body) = request(
        &app.router,
        "POST",
        "/api/v1/role",
        Some(json!({ "type": "Odd", "permissions": ["Rule-The-World"] })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn roles_paginate_past_the_first_page() {
    let app = test_app();
    for name in ["Author", "Guest", "Publisher"] {
        let (status, _) = request(
            &app.router,
            "POST",
            "/api/v1/role",
            Some(json!({ "type": name, "permissions": ["Read"] })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    // Admin seed + 3 = 4 roles, limit 2 => 2 pages
    let (status, body) = request(&app.router, "GET", "/api/v1/roles?page=2&limit=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roles"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["count"], 4);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["pagination"]["prev"], 1);
    assert_eq!(body["pagination"]["next"], Value::Null);
}

#[tokio::test]
async fn user_response_hides_secrets_and_soft_deletes() {
    let app = test_app();
    let user = create_user(&app.router, "adalove", "ada@example.com", None).await;
    let id = user["id"].as_str().unwrap();

    let obj = user.as_object().unwrap();
    assert!(!obj.contains_key("password"));
    assert!(!obj.contains_key("uuid"));
    assert!(!obj.contains_key("emailVerifyToken"));
    assert_eq!(user["status"], "Active");

    let (status, body) = request(&app.router, "DELETE", &format!("/api/v1/user/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["status"], "Deleted");

    // Soft delete keeps the row readable
    let (status, body) = request(&app.router, "GET", &format!("/api/v1/user/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["status"], "Deleted");
}

#[tokio::test]
async fn short_user_password_is_rejected() {
    let app = test_app();
    let (status, body) = request(
        &app.router,
        "POST",
        "/api/v1/user",
        Some(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "userName": "adalove",
            "email": "ada@example.com",
            "password": "abc",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn login_issues_a_valid_token() {
    let app = test_app();
    create_user(&app.router, "adalove", "ada@example.com", Some(1)).await;

    let (status, body) = request(
        &app.router,
        "POST",
        "/api/v1/login",
        Some(json!({ "email": "ada@example.com", "password": "s3cret-pass" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let claims =
        typewrite_api::auth::decode_token(&app.state.config.jwt_secret, token).unwrap();
    assert_eq!(claims.email, "ada@example.com");
    assert_eq!(claims.role, "Admin");

    let (status, body) = request(
        &app.router,
        "POST",
        "/api/v1/login",
        Some(json!({ "email": "ada@example.com", "password": "wrong" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn hard_delete_requires_an_admin_token() {
    let app = test_app();
    create_user(&app.router, "adminuser", "admin@example.com", Some(1)).await;
    let guest = create_user(&app.router, "guestuser", "guest@example.com", None).await;
    let guest_id = guest["id"].as_str().unwrap();

    // No token
    let (status, _) = request(
        &app.router,
        "DELETE",
        &format!("/api/v1/user/hard-delete/{guest_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Token without an allow-listed role
    let (_, body) = request(
        &app.router,
        "POST",
        "/api/v1/login",
        Some(json!({ "email": "guest@example.com", "password": "s3cret-pass" })),
        None,
    )
    .await;
    let guest_token = body["token"].as_str().unwrap().to_string();
    let (status, _) = request(
        &app.router,
        "DELETE",
        &format!("/api/v1/user/hard-delete/{guest_id}"),
        None,
        Some(&guest_token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin token removes the row for good
    let (_, body) = request(
        &app.router,
        "POST",
        "/api/v1/login",
        Some(json!({ "email": "admin@example.com", "password": "s3cret-pass" })),
        None,
    )
    .await;
    let admin_token = body["token"].as_str().unwrap().to_string();
    let (status, _) = request(
        &app.router,
        "DELETE",
        &format!("/api/v1/user/hard-delete/{guest_id}"),
        None,
        Some(&admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(&app.router, "GET", &format!("/api/v1/user/{guest_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn configured_secret_signs_and_validates_tokens() {
    // Secret differs from the env default, as when it comes from the JSON
    // override file; issuance and validation must agree on it
    let mut config = Config::default();
    config.jwt_secret = "rotated-through-config-file".into();
    let app = test_app_with(config);

    create_user(&app.router, "adminuser", "admin@example.com", Some(1)).await;
    let guest = create_user(&app.router, "guestuser", "guest@example.com", None).await;
    let guest_id = guest["id"].as_str().unwrap();

    let (status, body) = request(
        &app.router,
        "POST",
        "/api/v1/login",
        Some(json!({ "email": "admin@example.com", "password": "s3cret-pass" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = request(
        &app.router,
        "DELETE",
        &format!("/api/v1/user/hard-delete/{guest_id}"),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // A token signed under the default secret is no longer honored
    let mut other = Config::default();
    other.jwt_secret = "some-other-secret".into();
    let stray = test_app_with(other);
    create_user(&stray.router, "adminuser", "admin@example.com", Some(1)).await;
    let (_, body) = request(
        &stray.router,
        "POST",
        "/api/v1/login",
        Some(json!({ "email": "admin@example.com", "password": "s3cret-pass" })),
        None,
    )
    .await;
    let foreign_token = body["token"].as_str().unwrap().to_string();
    let (status, _) = request(
        &app.router,
        "DELETE",
        "/api/v1/user/hard-delete/whatever",
        None,
        Some(&foreign_token),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn changed_email_gets_a_fresh_verification_token() {
    let app = test_app();
    let user = create_user(&app.router, "adalove", "ada@example.com", None).await;
    let id = user["id"].as_str().unwrap();

    // Verify the original address and burn the first token
    let first_token = app.state.db.get_user(id).unwrap().unwrap().email_verify_token.unwrap();
    let (status, _) =
        request(&app.router, "GET", &format!("/api/v1/verifyUser/{first_token}"), None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(
        &app.router,
        "PUT",
        &format!("/api/v1/user/{id}"),
        Some(json!({ "email": "countess@example.com" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["emailIsVerified"], false);

    // The new address carries its own token and can be verified
    let second_token = app.state.db.get_user(id).unwrap().unwrap().email_verify_token.unwrap();
    assert_ne!(first_token, second_token);

    let (status, _) =
        request(&app.router, "GET", &format!("/api/v1/verifyUser/{second_token}"), None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = request(&app.router, "GET", &format!("/api/v1/user/{id}"), None, None).await;
    assert_eq!(body["user"]["emailIsVerified"], true);
}

#[tokio::test]
async fn story_lifecycle_renders_and_caches_html() {
    let app = test_app();
    let author = create_user(&app.router, "adalove", "ada@example.com", None).await;
    let author_id = author["id"].as_str().unwrap();

    let (status, body) = request(
        &app.router,
        "POST",
        "/api/v1/story",
        Some(json!({
            "title": "Hello, World!",
            "markdown": "# Hello\n\nFirst *draft*.",
            "author": author_id,
            "tags": ["intro"],
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "story creation failed: {body}");
    let story = &body["story"];
    let story_id = story["id"].as_str().unwrap().to_string();
    assert_eq!(story["slug"], "hello-world");
    assert_eq!(story["status"], "editing");
    assert_eq!(story["publishedAt"], Value::Null);
    assert!(story["html"].as_str().unwrap().contains("<h1>Hello</h1>"));
    assert_eq!(story["metas"]["facebook"]["title"], "Hello, World!");

    let cache_file = app.cache_dir.path().join(format!("{story_id}.html"));
    assert!(cache_file.exists());

    // Update re-renders, regenerates the slug, and stamps publishedAt
    let (status, body) = request(
        &app.router,
        "PUT",
        &format!("/api/v1/story/{story_id}"),
        Some(json!({
            "title": "Hello Again",
            "markdown": "## Second take",
            "status": "published",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let story = &body["story"];
    assert_eq!(story["slug"], "hello-again");
    assert_eq!(story["status"], "published");
    assert!(story["publishedAt"].is_string());
    assert!(story["html"].as_str().unwrap().contains("<h2>Second take</h2>"));
    let cached = std::fs::read_to_string(&cache_file).unwrap();
    assert!(cached.contains("<h2>Second take</h2>"));

    // Listing goes through the same cache
    let (status, body) = request(&app.router, "GET", "/api/v1/stories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stories"].as_array().unwrap().len(), 1);
    assert!(body["stories"][0]["html"].as_str().unwrap().contains("Second take"));

    // Delete removes the row and the cache file
    let (status, _) = request(&app.router, "DELETE", &format!("/api/v1/story/{story_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!cache_file.exists());
    let (status, _) = request(&app.router, "GET", &format!("/api/v1/story/{story_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn story_with_unknown_author_is_rejected() {
    let app = test_app();
    let (status, body) = request(
        &app.router,
        "POST",
        "/api/v1/story",
        Some(json!({ "title": "Orphan", "markdown": "text", "author": "nope" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    // Same for a publisher that does not exist
    let author = create_user(&app.router, "adalove", "ada@example.com", None).await;
    let (status, body) = request(
        &app.router,
        "POST",
        "/api/v1/story",
        Some(json!({
            "title": "Orphan",
            "markdown": "text",
            "author": author["id"],
            "publisher": "nope",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn email_verification_link_round_trip() {
    let app = test_app();
    let user = create_user(&app.router, "adalove", "ada@example.com", None).await;
    let id = user["id"].as_str().unwrap();
    assert_eq!(user["emailIsVerified"], false);

    // The token never leaves the API; read it the way the mailer does
    let stored = app.state.db.get_user(id).unwrap().unwrap();
    let token = stored.email_verify_token.unwrap();

    let (status, body) = request(&app.router, "GET", &format!("/api/v1/verifyUser/{token}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let (_, body) = request(&app.router, "GET", &format!("/api/v1/user/{id}"), None, None).await;
    assert_eq!(body["user"]["emailIsVerified"], true);

    // A burnt token cannot be replayed
    let (status, _) = request(&app.router, "GET", &format!("/api/v1/verifyUser/{token}"), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
