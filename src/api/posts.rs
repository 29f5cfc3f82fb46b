/// Post resource endpoints
use crate::{
    api::ApiResponse,
    auth::AuthUser,
    context::AppContext,
    db::post::{NewPost, Post, PostUpdate},
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Build post routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/posts", post(create_post).get(fetch_all_posts).delete(delete_own_posts))
        .route(
            "/posts/:post_id",
            get(fetch_post).put(update_post).delete(delete_post),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostRequest {
    title: Option<String>,
    body: Option<String>,
    cover_image_url: Option<String>,
    categories: Option<Vec<String>>,
}

async fn create_post(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Post>>)> {
    let title = req.title.filter(|t| !t.trim().is_empty());
    let body = req.body.filter(|b| !b.trim().is_empty());

    let (Some(title), Some(body)) = (title, body) else {
        return Err(ApiError::Validation(
            "Title and body must be provided".to_string(),
        ));
    };

    let created = ctx
        .posts
        .create(NewPost {
            title: title.trim().to_string(),
            body,
            cover_image_url: req.cover_image_url,
            categories: req.categories.unwrap_or_default(),
            author_id: auth.0.id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Post created successfully", created)),
    ))
}

async fn fetch_all_posts(
    State(ctx): State<AppContext>,
) -> ApiResult<Json<ApiResponse<Vec<Post>>>> {
    let posts = ctx.posts.list_all().await?;

    if posts.is_empty() {
        return Err(ApiError::NotFound("No posts found".to_string()));
    }

    Ok(Json(ApiResponse::new("Posts fetched successfully", posts)))
}

async fn fetch_post(
    State(ctx): State<AppContext>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<ApiResponse<Post>>> {
    let post = ctx
        .posts
        .find_by_id(&post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Requested post not found".to_string()))?;

    Ok(Json(ApiResponse::new("Post fetched successfully", post)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePostRequest {
    title: Option<String>,
    body: Option<String>,
    cover_image_url: Option<String>,
    categories: Option<Vec<String>>,
}

/// Owner-only post update
async fn update_post(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(post_id): Path<String>,
    Json(req): Json<UpdatePostRequest>,
) -> ApiResult<Json<ApiResponse<Post>>> {
    let post = ctx
        .posts
        .find_by_id(&post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if post.author_id != auth.0.id {
        return Err(ApiError::Authorization(
            "You can update only your posts".to_string(),
        ));
    }

    let updated = ctx
        .posts
        .update(
            &post_id,
            PostUpdate {
                title: req.title,
                body: req.body,
                cover_image_url: req.cover_image_url,
                categories: req.categories,
            },
        )
        .await?;

    Ok(Json(ApiResponse::new("Post updated successfully", updated)))
}

/// Owner-only post delete
async fn delete_post(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(post_id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let post = ctx
        .posts
        .find_by_id(&post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if post.author_id != auth.0.id {
        return Err(ApiError::Authorization(
            "You can delete only your posts".to_string(),
        ));
    }

    if !ctx.posts.delete(&post_id).await? {
        return Err(ApiError::NotFound("Post could not be deleted".to_string()));
    }

    Ok(Json(ApiResponse::message("The post has been deleted")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeletedPosts {
    deleted_count: u64,
}

/// Delete every post authored by the requester
async fn delete_own_posts(
    State(ctx): State<AppContext>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<DeletedPosts>>> {
    let posts = ctx.posts.list_by_author(&auth.0.id).await?;

    if posts.is_empty() {
        return Err(ApiError::NotFound(
            "Couldn't find posts for the specified user".to_string(),
        ));
    }

    let deleted_count = ctx.posts.delete_by_author(&auth.0.id).await?;

    Ok(Json(ApiResponse::new(
        "All posts deleted successfully",
        DeletedPosts { deleted_count },
    )))
}
