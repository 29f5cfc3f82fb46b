/// API routes and handlers
pub mod auth;
pub mod middleware;
pub mod posts;
pub mod users;

use crate::context::AppContext;
use axum::Router;
use serde::Serialize;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(auth::routes())
        .merge(users::routes())
        .merge(posts::routes())
}

/// Success envelope: a human-readable message plus optional payload
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_skips_absent_data() {
        let body = serde_json::to_value(ApiResponse::<()>::message("done")).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "done" }));
    }

    #[test]
    fn envelope_includes_data() {
        let body = serde_json::to_value(ApiResponse::new("ok", vec![1, 2])).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "ok", "data": [1, 2] }));
    }
}
