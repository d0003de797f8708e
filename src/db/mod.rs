use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::posts;

pub mod migrator;
pub mod repositories;

pub use repositories::user::{CreateUserError, NewUser, User};

/// Facade over the per-entity repositories, shared by the HTTP layer and
/// the CLI. Holds the connection pool; migrations run on construction.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let (mut max_connections, mut min_connections) = (max_connections, min_connections);

        if db_url.contains(":memory:") {
            // Every in-memory connection is its own database, so the pool
            // must hold exactly one.
            max_connections = 1;
            min_connections = 1;
        } else {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn post_repo(&self) -> repositories::post::PostRepository {
        repositories::post::PostRepository::new(self.conn.clone())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn create_user(&self, new_user: NewUser) -> Result<User, CreateUserError> {
        self.user_repo().create_user(new_user).await
    }

    pub async fn create_superuser(&self, new_user: NewUser) -> Result<User, CreateUserError> {
        self.user_repo().create_superuser(new_user).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_public_id(&self, public_id: &str) -> Result<Option<User>> {
        self.user_repo().get_by_public_id(public_id).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_user_password(&self, username: &str, new_password: &str) -> Result<()> {
        self.user_repo()
            .update_password(username, new_password)
            .await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn regenerate_user_api_key(&self, username: &str) -> Result<String> {
        self.user_repo().regenerate_api_key(username).await
    }

    pub async fn user_count(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    // ------------------------------------------------------------------
    // Like relation
    // ------------------------------------------------------------------

    pub async fn like_post(&self, user_id: i32, post_id: i32) -> Result<()> {
        self.user_repo().like(user_id, post_id).await
    }

    pub async fn remove_like(&self, user_id: i32, post_id: i32) -> Result<()> {
        self.user_repo().remove_like(user_id, post_id).await
    }

    pub async fn has_liked(&self, user_id: i32, post_id: i32) -> Result<bool> {
        self.user_repo().has_liked(user_id, post_id).await
    }

    pub async fn like_count(&self, post_id: i32) -> Result<u64> {
        self.post_repo().like_count(post_id).await
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    pub async fn create_post(&self, author_id: i32, body: &str) -> Result<posts::Model> {
        self.post_repo().create(author_id, body).await
    }

    pub async fn get_post_by_public_id(&self, public_id: &str) -> Result<Option<posts::Model>> {
        self.post_repo().get_by_public_id(public_id).await
    }

    pub async fn list_posts(&self) -> Result<Vec<posts::Model>> {
        self.post_repo().list().await
    }

    pub async fn update_post_body(&self, post: posts::Model, body: &str) -> Result<posts::Model> {
        self.post_repo().update_body(post, body).await
    }

    pub async fn delete_post(&self, id: i32) -> Result<bool> {
        self.post_repo().delete(id).await
    }

    pub async fn post_count(&self) -> Result<u64> {
        self.post_repo().count().await
    }
}
