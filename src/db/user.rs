/// User records and the credential store
///
/// All SQL touching the users table lives here. Managers and handlers go
/// through `UserStore` so the engine can be swapped for an in-memory pool in
/// tests.
use crate::{
    account::{roles, Role},
    error::{ApiError, ApiResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Full user record, secrets included. Never serialized to clients.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_verified: bool,
    pub email_otp: Option<String>,
    pub email_otp_expires_at: Option<DateTime<Utc>>,
    pub reset_otp: Option<String>,
    pub reset_otp_expires_at: Option<DateTime<Utc>>,
    pub refresh_token: Option<String>,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User projection safe to return to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_verified: bool,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            is_verified: self.is_verified,
            roles: self.roles.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn from_row(row: &SqliteRow) -> ApiResult<Self> {
        let roles_str: String = row.get("roles");

        Ok(User {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            is_verified: row.get("is_verified"),
            email_otp: row.get("email_otp"),
            email_otp_expires_at: row.get("email_otp_expires_at"),
            reset_otp: row.get("reset_otp"),
            reset_otp_expires_at: row.get("reset_otp_expires_at"),
            refresh_token: row.get("refresh_token"),
            roles: roles::parse_list(&roles_str)?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// Fields required to insert a new account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email_otp: String,
    pub email_otp_expires_at: DateTime<Utc>,
}

/// Partial profile update; None leaves the field unchanged
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
     is_verified, email_otp, email_otp_expires_at, reset_otp, reset_otp_expires_at, \
     refresh_token, roles, created_at, updated_at";

/// Credential store backed by SQLite
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new, unverified account
    pub async fn create(&self, new: NewUser) -> ApiResult<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let default_roles = vec![Role::User];

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, first_name, last_name, \
             is_verified, email_otp, email_otp_expires_at, roles, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&id)
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(false)
        .bind(&new.email_otp)
        .bind(new.email_otp_expires_at)
        .bind(roles::format_list(&default_roles))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        Ok(User {
            id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            is_verified: false,
            email_otp: Some(new.email_otp),
            email_otp_expires_at: Some(new.email_otp_expires_at),
            reset_otp: None,
            reset_otp_expires_at: None,
            refresh_token: None,
            roles: default_roles,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn find_by_id(&self, id: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::Database)?;

        row.as_ref().map(User::from_row).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::Database)?;

        row.as_ref().map(User::from_row).transpose()
    }

    /// Find by username or email in one lookup (login identifier)
    pub async fn find_by_identifier(&self, identifier: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1 OR email = ?1"
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        row.as_ref().map(User::from_row).transpose()
    }

    /// Check whether a username or email is already taken
    pub async fn username_or_email_exists(
        &self,
        username: &str,
        email: &str,
    ) -> ApiResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?1 OR email = ?2")
                .bind(username)
                .bind(email)
                .fetch_one(&self.pool)
                .await
                .map_err(ApiError::Database)?;

        Ok(count > 0)
    }

    pub async fn list_all(&self) -> ApiResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        rows.iter().map(User::from_row).collect()
    }

    /// Mark the account verified, consuming the email OTP
    pub async fn mark_verified(&self, id: &str) -> ApiResult<()> {
        sqlx::query(
            "UPDATE users SET is_verified = 1, email_otp = NULL, email_otp_expires_at = NULL, \
             updated_at = ?1 WHERE id = ?2",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        Ok(())
    }

    /// Store a password-reset OTP, replacing any outstanding one
    pub async fn set_reset_otp(
        &self,
        id: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> ApiResult<()> {
        sqlx::query(
            "UPDATE users SET reset_otp = ?1, reset_otp_expires_at = ?2, updated_at = ?3 \
             WHERE id = ?4",
        )
        .bind(code)
        .bind(expires_at)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        Ok(())
    }

    /// Replace the password hash, consuming the reset OTP
    pub async fn reset_password(&self, id: &str, password_hash: &str) -> ApiResult<()> {
        sqlx::query(
            "UPDATE users SET password_hash = ?1, reset_otp = NULL, \
             reset_otp_expires_at = NULL, updated_at = ?2 WHERE id = ?3",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        Ok(())
    }

    /// Set (or clear) the single active refresh token for an account
    pub async fn set_refresh_token(&self, id: &str, token: Option<&str>) -> ApiResult<()> {
        sqlx::query("UPDATE users SET refresh_token = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(token)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::Database)?;

        Ok(())
    }

    /// Clear whichever account currently holds this refresh token.
    /// Returns true when a session was actually cleared.
    pub async fn clear_refresh_token(&self, token: &str) -> ApiResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = NULL, updated_at = ?1 WHERE refresh_token = ?2",
        )
        .bind(Utc::now())
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    /// Full overwrite of the role set
    pub async fn set_roles(&self, id: &str, new_roles: &[Role]) -> ApiResult<()> {
        sqlx::query("UPDATE users SET roles = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(roles::format_list(new_roles))
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::Database)?;

        Ok(())
    }

    /// Apply a partial profile update and return the fresh record
    pub async fn update_profile(&self, id: &str, update: ProfileUpdate) -> ApiResult<User> {
        sqlx::query(
            "UPDATE users SET \
             username = COALESCE(?1, username), \
             first_name = COALESCE(?2, first_name), \
             last_name = COALESCE(?3, last_name), \
             updated_at = ?4 \
             WHERE id = ?5",
        )
        .bind(&update.username)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    /// Hard delete. Returns true when a record was removed.
    pub async fn delete(&self, id: &str) -> ApiResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn test_store() -> UserStore {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        UserStore::new(pool)
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email_otp: "123456".to_string(),
            email_otp_expires_at: Utc::now() + Duration::minutes(10),
        }
    }

    #[tokio::test]
    async fn create_and_find() {
        let store = test_store().await;
        let user = store.create(new_user("alice", "alice@example.com")).await.unwrap();

        assert!(!user.is_verified);
        assert_eq!(user.roles, vec![Role::User]);
        assert_eq!(user.email_otp.as_deref(), Some("123456"));

        let by_id = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        let by_email = store.find_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let by_name = store.find_by_identifier("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);

        assert!(store.find_by_identifier("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mark_verified_consumes_otp() {
        let store = test_store().await;
        let user = store.create(new_user("bob", "bob@example.com")).await.unwrap();

        store.mark_verified(&user.id).await.unwrap();

        let fresh = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert!(fresh.is_verified);
        assert!(fresh.email_otp.is_none());
        assert!(fresh.email_otp_expires_at.is_none());
    }

    #[tokio::test]
    async fn refresh_token_lifecycle() {
        let store = test_store().await;
        let user = store.create(new_user("carol", "carol@example.com")).await.unwrap();

        store.set_refresh_token(&user.id, Some("token-1")).await.unwrap();
        let fresh = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(fresh.refresh_token.as_deref(), Some("token-1"));

        // Overwrite models single-session-per-account
        store.set_refresh_token(&user.id, Some("token-2")).await.unwrap();

        assert!(!store.clear_refresh_token("token-1").await.unwrap());
        assert!(store.clear_refresh_token("token-2").await.unwrap());

        let fresh = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert!(fresh.refresh_token.is_none());
    }

    #[tokio::test]
    async fn set_roles_overwrites() {
        let store = test_store().await;
        let user = store.create(new_user("dave", "dave@example.com")).await.unwrap();

        store.set_roles(&user.id, &[Role::Author, Role::Admin]).await.unwrap();

        let fresh = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(fresh.roles, vec![Role::Author, Role::Admin]);
    }

    #[tokio::test]
    async fn update_profile_partial() {
        let store = test_store().await;
        let user = store.create(new_user("erin", "erin@example.com")).await.unwrap();

        let updated = store
            .update_profile(
                &user.id,
                ProfileUpdate {
                    first_name: Some("Erin".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.first_name, "Erin");
        assert_eq!(updated.username, "erin");
        assert_eq!(updated.last_name, "User");
    }

    #[tokio::test]
    async fn delete_user() {
        let store = test_store().await;
        let user = store.create(new_user("frank", "frank@example.com")).await.unwrap();

        assert!(store.delete(&user.id).await.unwrap());
        assert!(!store.delete(&user.id).await.unwrap());
        assert!(store.find_by_id(&user.id).await.unwrap().is_none());
    }
}
