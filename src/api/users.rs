/// User resource endpoints
use crate::{
    api::ApiResponse,
    auth::AuthUser,
    context::AppContext,
    db::user::{ProfileUpdate, PublicUser},
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

/// Build user routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/users", get(fetch_all_users))
        .route("/users/me", get(current_user))
        .route(
            "/users/:user_id",
            get(fetch_user).patch(update_user).delete(delete_user),
        )
}

async fn fetch_all_users(
    State(ctx): State<AppContext>,
) -> ApiResult<Json<ApiResponse<Vec<PublicUser>>>> {
    let users = ctx.users.list_all().await?;

    if users.is_empty() {
        return Err(ApiError::NotFound("No users found".to_string()));
    }

    let public: Vec<PublicUser> = users.iter().map(|u| u.to_public()).collect();

    Ok(Json(ApiResponse::new(
        format!("{} users fetched successfully", public.len()),
        public,
    )))
}

async fn current_user(auth: AuthUser) -> Json<ApiResponse<PublicUser>> {
    Json(ApiResponse::new("Current user", auth.0))
}

async fn fetch_user(
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ApiResponse<PublicUser>>> {
    let user = ctx
        .users
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::new(
        "User fetched successfully",
        user.to_public(),
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserRequest {
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

/// Owner-only profile update
async fn update_user(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(user_id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<ApiResponse<PublicUser>>> {
    let existing = ctx
        .users
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if existing.id != auth.0.id {
        return Err(ApiError::Authorization(
            "You can update only your details".to_string(),
        ));
    }

    let username = req
        .username
        .map(|u| u.trim().to_lowercase())
        .filter(|u| !u.is_empty());

    // A claimed username must not belong to someone else
    if let Some(ref new_username) = username {
        if let Some(holder) = ctx.users.find_by_identifier(new_username).await? {
            if holder.id != existing.id {
                return Err(ApiError::Conflict("Username already taken".to_string()));
            }
        }
    }

    let updated = ctx
        .users
        .update_profile(
            &user_id,
            ProfileUpdate {
                username,
                first_name: req.first_name,
                last_name: req.last_name,
            },
        )
        .await?;

    Ok(Json(ApiResponse::new(
        "User details updated",
        updated.to_public(),
    )))
}

/// Owner-only hard delete
async fn delete_user(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let existing = ctx
        .users
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if existing.id != auth.0.id {
        return Err(ApiError::Authorization(
            "You can delete only your account".to_string(),
        ));
    }

    if !ctx.users.delete(&user_id).await? {
        return Err(ApiError::NotFound("User could not be deleted".to_string()));
    }

    Ok(Json(ApiResponse::message("The user has been deleted")))
}
