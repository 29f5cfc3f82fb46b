/// Post records and their store
use crate::error::{ApiError, ApiResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// A user-authored post
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub body: String,
    pub cover_image_url: Option<String>,
    pub categories: Vec<String>,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    fn from_row(row: &SqliteRow) -> ApiResult<Self> {
        let categories_json: String = row.get("categories");
        let categories = serde_json::from_str(&categories_json)
            .map_err(|e| ApiError::Internal(format!("Invalid categories payload: {}", e)))?;

        Ok(Post {
            id: row.get("id"),
            title: row.get("title"),
            body: row.get("body"),
            cover_image_url: row.get("cover_image_url"),
            categories,
            author_id: row.get("author_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// Fields required to insert a new post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub cover_image_url: Option<String>,
    pub categories: Vec<String>,
    pub author_id: String,
}

/// Partial post update; None leaves the field unchanged
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub cover_image_url: Option<String>,
    pub categories: Option<Vec<String>>,
}

const POST_COLUMNS: &str =
    "id, title, body, cover_image_url, categories, author_id, created_at, updated_at";

/// Post store backed by SQLite
#[derive(Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

impl PostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewPost) -> ApiResult<Post> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let categories_json = serde_json::to_string(&new.categories)
            .map_err(|e| ApiError::Internal(format!("Invalid categories payload: {}", e)))?;

        sqlx::query(
            "INSERT INTO posts (id, title, body, cover_image_url, categories, author_id, \
             created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&id)
        .bind(&new.title)
        .bind(&new.body)
        .bind(&new.cover_image_url)
        .bind(&categories_json)
        .bind(&new.author_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        Ok(Post {
            id,
            title: new.title,
            body: new.body,
            cover_image_url: new.cover_image_url,
            categories: new.categories,
            author_id: new.author_id,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn find_by_id(&self, id: &str) -> ApiResult<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::Database)?;

        row.as_ref().map(Post::from_row).transpose()
    }

    pub async fn list_all(&self) -> ApiResult<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        rows.iter().map(Post::from_row).collect()
    }

    pub async fn list_by_author(&self, author_id: &str) -> ApiResult<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        rows.iter().map(Post::from_row).collect()
    }

    /// Apply a partial update and return the fresh record
    pub async fn update(&self, id: &str, update: PostUpdate) -> ApiResult<Post> {
        let categories_json = update
            .categories
            .map(|c| {
                serde_json::to_string(&c)
                    .map_err(|e| ApiError::Internal(format!("Invalid categories payload: {}", e)))
            })
            .transpose()?;

        sqlx::query(
            "UPDATE posts SET \
             title = COALESCE(?1, title), \
             body = COALESCE(?2, body), \
             cover_image_url = COALESCE(?3, cover_image_url), \
             categories = COALESCE(?4, categories), \
             updated_at = ?5 \
             WHERE id = ?6",
        )
        .bind(&update.title)
        .bind(&update.body)
        .bind(&update.cover_image_url)
        .bind(&categories_json)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
    }

    /// Hard delete. Returns true when a record was removed.
    pub async fn delete(&self, id: &str) -> ApiResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete all posts authored by one user, returning the removed count
    pub async fn delete_by_author(&self, author_id: &str) -> ApiResult<u64> {
        let result = sqlx::query("DELETE FROM posts WHERE author_id = ?1")
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::Database)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_stores() -> (PostStore, String) {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();

        // Posts need an author on the other side of the foreign key
        let users = crate::db::user::UserStore::new(pool.clone());
        let author = users
            .create(crate::db::user::NewUser {
                username: "writer".to_string(),
                email: "writer@example.com".to_string(),
                password_hash: "hash".to_string(),
                first_name: "W".to_string(),
                last_name: "R".to_string(),
                email_otp: "123456".to_string(),
                email_otp_expires_at: Utc::now(),
            })
            .await
            .unwrap();

        (PostStore::new(pool), author.id)
    }

    fn new_post(title: &str, author_id: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            body: "Some body".to_string(),
            cover_image_url: None,
            categories: vec!["tech".to_string()],
            author_id: author_id.to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_fetch() {
        let (posts, author) = test_stores().await;
        let post = posts.create(new_post("Hello", &author)).await.unwrap();

        let fetched = posts.find_by_id(&post.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Hello");
        assert_eq!(fetched.categories, vec!["tech"]);
        assert_eq!(fetched.author_id, author);
    }

    #[tokio::test]
    async fn update_is_partial() {
        let (posts, author) = test_stores().await;
        let post = posts.create(new_post("Draft", &author)).await.unwrap();

        let updated = posts
            .update(
                &post.id,
                PostUpdate {
                    body: Some("Edited body".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Draft");
        assert_eq!(updated.body, "Edited body");
    }

    #[tokio::test]
    async fn delete_by_author_sweeps_everything() {
        let (posts, author) = test_stores().await;
        posts.create(new_post("One", &author)).await.unwrap();
        posts.create(new_post("Two", &author)).await.unwrap();

        assert_eq!(posts.delete_by_author(&author).await.unwrap(), 2);
        assert!(posts.list_by_author(&author).await.unwrap().is_empty());
    }
}
