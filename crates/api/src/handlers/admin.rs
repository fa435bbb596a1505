//! Handlers for the `/admin` resource (back-office user management).
//!
//! All handlers require the `admin` role via [`RequireAdmin`]. Storefront
//! accounts are created through `/auth/register`, never here.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use shopdesk_core::error::CoreError;
use shopdesk_core::roles::is_back_office;
use shopdesk_core::types::DbId;
use shopdesk_core::validation::{validate_email, validate_required_text};
use shopdesk_db::models::user::{CreateUser, UserResponse};
use shopdesk_db::repositories::{RoleRepo, SessionRepo, UserRepo};

use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::{AppError, AppResult};
use crate::handlers::auth::MAX_USERNAME_LEN;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// Back-office accounts need longer passwords than storefront accounts.
const MIN_STAFF_PASSWORD_LENGTH: usize = 12;

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Role name: `staff` or `admin`.
    pub role: String,
}

/// POST /api/v1/admin/users
///
/// Create a staff or admin user. Returns a safe [`UserResponse`] with 201 Created.
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    validate_required_text(&input.username, "Username", MAX_USERNAME_LEN)?;
    validate_email(Some(&input.email))?;
    if !is_back_office(&input.role) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Role must be 'staff' or 'admin', got '{}'",
            input.role
        ))));
    }
    validate_password_strength(&input.password, MIN_STAFF_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let role = RoleRepo::find_by_name(&state.pool, &input.role)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Role '{}' is not seeded", input.role)))?;

    let hashed = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let create_dto = CreateUser {
        username: input.username.trim().to_string(),
        email: input.email.trim().to_string(),
        password_hash: hashed,
        role_id: role.id,
        customer_id: None,
    };

    let user = UserRepo::create(&state.pool, &create_dto).await?;
    tracing::info!(user_id = user.id, role = %role.name, created_by = admin.user_id, "User created");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::from_user(&user, role.name)),
    ))
}

/// GET /api/v1/admin/users
///
/// List all users with resolved role names.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = UserRepo::list(&state.pool).await?;

    // Pre-fetch all roles to avoid N+1 queries.
    let roles = RoleRepo::list(&state.pool).await?;

    let responses = users
        .iter()
        .map(|u| {
            let role_name = roles
                .iter()
                .find(|r| r.id == u.role_id)
                .map(|r| r.name.clone())
                .unwrap_or_else(|| "unknown".to_string());
            UserResponse::from_user(u, role_name)
        })
        .collect();

    Ok(Json(responses))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Deactivate a user and revoke their sessions. Returns 204 No Content.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if id == admin.user_id {
        return Err(AppError::Core(CoreError::Conflict(
            "Admins cannot deactivate their own account".into(),
        )));
    }

    if !UserRepo::deactivate(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "User", id }));
    }
    SessionRepo::revoke_all_for_user(&state.pool, id).await?;

    tracing::info!(user_id = id, deactivated_by = admin.user_id, "User deactivated");
    Ok(StatusCode::NO_CONTENT)
}
