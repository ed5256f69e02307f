use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;
use tracing::debug;

use typewrite_db::models::UserRow;
use typewrite_types::api::{Claims, CreateUserRequest, UpdateUserRequest, UserResponse};
use typewrite_types::models::{USER_STATUS_ACTIVE, USER_STATUS_DELETED, USER_STATUS_SUSPENDED};

use crate::auth::{AppState, create_token, hash_password};
use crate::error::ApiError;
use crate::ident::new_entity_id;
use crate::mailer;
use crate::middleware::authorize_role;
use crate::pagination::{PageQuery, paginate};

pub async fn get_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let query = query.normalized();
    let count = state.db.count_users().map_err(ApiError::Database)?;
    let rows = state
        .db
        .list_users(query.limit, query.offset())
        .map_err(ApiError::Database)?;

    let users: Vec<UserResponse> = rows.iter().map(user_to_response).collect();
    Ok(Json(json!({
        "status": "success",
        "users": users,
        "pagination": paginate(count, query),
    })))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user(&id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(success_envelope(&user))
}

pub async fn add_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_name("firstName", &req.first_name)?;
    validate_name("lastName", &req.last_name)?;
    if req.user_name.len() < 4 || req.user_name.len() > 20 {
        return Err(ApiError::BadRequest("userName must be 4-20 characters".into()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("email is not a valid address".into()));
    }
    if req.password.len() < 6 {
        return Err(ApiError::BadRequest("password must be at least 6 characters".into()));
    }
    if let Some(role_id) = req.role {
        state
            .db
            .get_role(role_id)
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::BadRequest(format!("role {role_id} does not exist")))?;
    }

    let (uuid, id) = new_entity_id();
    let mut user = UserRow {
        id,
        uuid,
        first_name: req.first_name,
        last_name: req.last_name,
        user_name: req.user_name,
        email: req.email,
        role_id: req.role,
        email_is_verified: false,
        email_verify_token: None,
        password: hash_password(&req.password)?,
        password_reset_token: None,
        status: USER_STATUS_ACTIVE.to_string(),
        created_at: String::new(),
        updated_at: String::new(),
    };
    user.email_verify_token = Some(create_token(&state.config, &state.db, &user)?);

    state.db.create_user(&user).map_err(ApiError::Database)?;
    let user = state
        .db
        .get_user(&user.id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("user"))?;

    mailer::send_verification_email(state.clone(), user.clone());

    Ok(success_envelope(&user))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut user = state
        .db
        .get_user(&id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("user"))?;

    if let Some(first_name) = req.first_name {
        validate_name("firstName", &first_name)?;
        user.first_name = first_name;
    }
    if let Some(last_name) = req.last_name {
        validate_name("lastName", &last_name)?;
        user.last_name = last_name;
    }
    if let Some(user_name) = req.user_name {
        if user_name.len() < 4 || user_name.len() > 20 {
            return Err(ApiError::BadRequest("userName must be 4-20 characters".into()));
        }
        user.user_name = user_name;
    }
    let mut email_changed = false;
    if let Some(email) = req.email {
        if !email.contains('@') {
            return Err(ApiError::BadRequest("email is not a valid address".into()));
        }
        email_changed = email != user.email;
        user.email = email;
    }
    if let Some(role_id) = req.role {
        state
            .db
            .get_role(role_id)
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::BadRequest(format!("role {role_id} does not exist")))?;
        user.role_id = Some(role_id);
    }
    if let Some(status) = req.status {
        if ![USER_STATUS_ACTIVE, USER_STATUS_SUSPENDED, USER_STATUS_DELETED]
            .contains(&status.as_str())
        {
            return Err(ApiError::BadRequest(format!("unknown user status '{status}'")));
        }
        user.status = status;
    }

    // A changed address needs verifying again, with a fresh token for the
    // new inbox
    if email_changed {
        user.email_is_verified = false;
        user.email_verify_token = Some(create_token(&state.config, &state.db, &user)?);
    }

    state.db.update_user(&user).map_err(ApiError::Database)?;
    let user = state
        .db
        .get_user(&id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("user"))?;

    if email_changed {
        mailer::send_verification_email(state.clone(), user.clone());
    }

    Ok(success_envelope(&user))
}

/// Soft delete: the row stays, status flips to Deleted.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state
        .db
        .set_user_status(&id, USER_STATUS_DELETED)
        .map_err(ApiError::Database)?
    {
        return Err(ApiError::NotFound("user"));
    }
    let user = state
        .db
        .get_user(&id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(success_envelope(&user))
}

/// Hard delete removes the row. Restricted to the configured role allow-list.
pub async fn hard_delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_role(&claims, &state.config.admin_roles)?;

    let user = state
        .db
        .get_user(&id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("user"))?;
    state.db.delete_user(&id).map_err(ApiError::Database)?;
    debug!("user {} hard-deleted by {}", id, claims.sub);

    Ok(success_envelope(&user))
}

/// Target of the link in the verification email.
pub async fn verify_user(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = crate::auth::decode_token(&state.config.jwt_secret, &token)?;
    let user = state
        .db
        .get_user(&claims.sub)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("user"))?;

    // The token must be the one we issued last for this account
    if user.email_verify_token.as_deref() != Some(token.as_str()) {
        return Err(ApiError::Unauthorized);
    }

    state.db.set_email_verified(&user.id).map_err(ApiError::Database)?;
    Ok(Json(json!({ "status": "success", "message": "Email verified" })))
}

pub fn user_to_response(user: &UserRow) -> UserResponse {
    UserResponse {
        id: user.id.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        user_name: user.user_name.clone(),
        email: user.email.clone(),
        role: user.role_id,
        email_is_verified: user.email_is_verified,
        status: user.status.clone(),
        created_at: user.created_at.clone(),
        updated_at: user.updated_at.clone(),
    }
}

fn success_envelope(user: &UserRow) -> Json<serde_json::Value> {
    Json(json!({ "status": "success", "user": user_to_response(user) }))
}

fn validate_name(field: &str, value: &str) -> Result<(), ApiError> {
    if value.len() < 2 || value.len() > 100 {
        return Err(ApiError::BadRequest(format!("{field} must be 2-100 characters")));
    }
    Ok(())
}
