/// Application context and dependency wiring
use crate::{
    account::{AccountManager, TokenIssuer},
    config::ServerConfig,
    db::{self, post::PostStore, user::UserStore},
    error::ApiResult,
    mailer::Mailer,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub users: UserStore,
    pub posts: PostStore,
    pub accounts: Arc<AccountManager>,
    pub mailer: Arc<Mailer>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ApiResult<Self> {
        // Validate configuration
        config.validate()?;

        // Ensure the data directory exists
        if !config.storage.data_directory.exists() {
            tokio::fs::create_dir_all(&config.storage.data_directory).await?;
        }

        // Initialize the database
        let db = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let users = UserStore::new(db.clone());
        let posts = PostStore::new(db.clone());

        // Secrets are injected here, never read at call sites
        let tokens = Arc::new(TokenIssuer::new(
            config.auth.access_token_secret.clone(),
            config.auth.refresh_token_secret.clone(),
        ));

        let mailer = Arc::new(Mailer::new(config.email.clone())?);

        let accounts = Arc::new(AccountManager::new(
            users.clone(),
            tokens,
            Arc::clone(&mailer),
        ));

        Ok(Self {
            config: Arc::new(config),
            db,
            users,
            posts,
            accounts,
            mailer,
        })
    }
}
