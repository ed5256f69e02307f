use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use typewrite_api::auth::{self, AppState};
use typewrite_api::middleware::require_auth;
use typewrite_api::{roles, stories, users};

/// Assembles the full application router: the health route at `/`, the public
/// CRUD surface under `/api/v1`, and the token-guarded routes.
pub fn app(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/login", post(auth::login))
        .route("/users", get(users::get_users))
        .route("/user", post(users::add_user))
        .route(
            "/user/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/verifyUser/{token}", get(users::verify_user))
        .route("/roles", get(roles::get_roles))
        .route("/role", post(roles::add_role))
        .route(
            "/role/{id}",
            get(roles::get_role).put(roles::update_role).delete(roles::delete_role),
        )
        .route("/stories", get(stories::get_stories))
        .route("/story", post(stories::add_story))
        .route(
            "/story/{id}",
            get(stories::get_story).put(stories::update_story).delete(stories::delete_story),
        )
        .with_state(state.clone());

    let protected_api = Router::new()
        .route("/user/hard-delete/{id}", delete(users::hard_delete_user))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", public_api.merge(protected_api))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Connection Successful" }))
}
