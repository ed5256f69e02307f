use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;

use typewrite_db::models::RoleRow;
use typewrite_types::api::{CreateRoleRequest, RoleResponse, UpdateRoleRequest};
use typewrite_types::models::ALL_PERMISSIONS;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::pagination::{PageQuery, paginate};

pub async fn get_roles(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let query = query.normalized();
    let count = state.db.count_roles().map_err(ApiError::Database)?;
    let rows = state
        .db
        .list_roles(query.limit, query.offset())
        .map_err(ApiError::Database)?;

    let roles = rows.iter().map(role_to_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(json!({
        "status": "success",
        "roles": roles,
        "pagination": paginate(count, query),
    })))
}

pub async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let role = state
        .db
        .get_role(id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("role"))?;

    Ok(success_envelope(&role)?)
}

pub async fn add_role(
    State(state): State<AppState>,
    Json(req): Json<CreateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.role_type.is_empty() {
        return Err(ApiError::BadRequest("type must not be empty".into()));
    }
    validate_permissions(&req.permissions)?;

    let permissions_json = serde_json::to_string(&req.permissions)
        .map_err(|e| ApiError::Internal(e.into()))?;
    let id = state
        .db
        .create_role(&req.role_type, &permissions_json)
        .map_err(ApiError::Database)?;
    let role = state
        .db
        .get_role(id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("role"))?;

    Ok(success_envelope(&role)?)
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = state
        .db
        .get_role(id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("role"))?;

    let role_type = req.role_type.unwrap_or(role.role_type);
    let permissions_json = match req.permissions {
        Some(permissions) => {
            validate_permissions(&permissions)?;
            serde_json::to_string(&permissions).map_err(|e| ApiError::Internal(e.into()))?
        }
        None => role.permissions,
    };

    state
        .db
        .update_role(id, &role_type, &permissions_json)
        .map_err(ApiError::Database)?;
    let role = state
        .db
        .get_role(id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("role"))?;

    Ok(success_envelope(&role)?)
}

pub async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let role = state
        .db
        .get_role(id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("role"))?;
    state.db.delete_role(id).map_err(ApiError::Database)?;

    Ok(success_envelope(&role)?)
}

fn role_to_response(role: &RoleRow) -> Result<RoleResponse, ApiError> {
    let permissions: Vec<String> = serde_json::from_str(&role.permissions)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt permissions on role {}: {e}", role.id)))?;
    Ok(RoleResponse {
        id: role.id,
        role_type: role.role_type.clone(),
        permissions,
        created_at: role.created_at.clone(),
        updated_at: role.updated_at.clone(),
    })
}

fn success_envelope(role: &RoleRow) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(json!({ "status": "success", "role": role_to_response(role)? })))
}

fn validate_permissions(permissions: &[String]) -> Result<(), ApiError> {
    for permission in permissions {
        if !ALL_PERMISSIONS.contains(&permission.as_str()) {
            return Err(ApiError::BadRequest(format!("unknown permission '{permission}'")));
        }
    }
    Ok(())
}
