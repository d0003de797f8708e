use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use thiserror::Error;
use tokio::task;

use crate::entities::{post_likes, users};

/// Errors from user creation that the HTTP layer maps to field-level
/// 400/409 responses.
#[derive(Debug, Error)]
pub enum CreateUserError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("A user with that {0} already exists")]
    Duplicate(&'static str),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sea_orm::DbErr> for CreateUserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(err.into())
    }
}

/// User data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub public_id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub api_key: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// Display name shown next to authored posts
    #[must_use]
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            public_id: model.public_id,
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            api_key: model.api_key,
            is_active: model.is_active,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Input for registration. `first_name`/`last_name` are optional profile
/// fields; the other three are mandatory.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a regular user. Validates required fields, normalizes the
    /// email and hashes the password before anything is persisted.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, CreateUserError> {
        self.create(new_user, false).await
    }

    /// Create a superuser (staff + superuser flags set)
    pub async fn create_superuser(&self, new_user: NewUser) -> Result<User, CreateUserError> {
        self.create(new_user, true).await
    }

    async fn create(&self, new_user: NewUser, superuser: bool) -> Result<User, CreateUserError> {
        if new_user.username.trim().is_empty() {
            return Err(CreateUserError::MissingField("username"));
        }
        if new_user.email.trim().is_empty() {
            return Err(CreateUserError::MissingField("email"));
        }
        if new_user.password.is_empty() {
            return Err(CreateUserError::MissingField("password"));
        }

        let email = normalize_email(&new_user.email);

        let existing = users::Entity::find()
            .filter(users::Column::Username.eq(&new_user.username))
            .one(&self.conn)
            .await
            .context("Failed to check username uniqueness")?;
        if existing.is_some() {
            return Err(CreateUserError::Duplicate("username"));
        }

        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(&email))
            .one(&self.conn)
            .await
            .context("Failed to check email uniqueness")?;
        if existing.is_some() {
            return Err(CreateUserError::Duplicate("email"));
        }

        let password = new_user.password.clone();
        // Argon2 is CPU-intensive, keep it off the async runtime
        let password_hash = task::spawn_blocking(move || hash_password(&password))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let model = users::ActiveModel {
            public_id: Set(uuid::Uuid::new_v4().to_string()),
            username: Set(new_user.username),
            email: Set(email),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            password_hash: Set(password_hash),
            api_key: Set(generate_api_key()),
            is_active: Set(true),
            is_staff: Set(superuser),
            is_superuser: Set(superuser),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = model
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    /// Get user by public ID
    pub async fn get_by_public_id(&self, public_id: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::PublicId.eq(public_id))
            .one(&self.conn)
            .await
            .context("Failed to query user by public ID")?;

        Ok(user.map(User::from))
    }

    /// Get user by internal ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Verify password for a user
    /// Note: This uses `spawn_blocking` because Argon2 verification is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    /// Update password for a user (hashes the new password)
    pub async fn update_password(&self, username: &str, new_password: &str) -> Result<()> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {username}"))?;

        let password = new_password.to_string();
        let new_hash = task::spawn_blocking(move || hash_password(&password))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Verify API key and return the associated user
    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::ApiKey.eq(api_key))
            .one(&self.conn)
            .await
            .context("Failed to query user by API key")?;

        Ok(user.map(User::from))
    }

    /// Regenerate API key for a user
    pub async fn regenerate_api_key(&self, username: &str) -> Result<String> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for API key regeneration")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {username}"))?;

        let new_api_key = generate_api_key();
        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.api_key = Set(new_api_key.clone());
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(new_api_key)
    }

    /// Add (user, post) to the like relation. No-op when the pair is
    /// already present; the composite primary key guarantees one row.
    pub async fn like(&self, user_id: i32, post_id: i32) -> Result<()> {
        let model = post_likes::ActiveModel {
            user_id: Set(user_id),
            post_id: Set(post_id),
        };

        post_likes::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([post_likes::Column::UserId, post_likes::Column::PostId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert like")?;

        Ok(())
    }

    /// Remove (user, post) from the like relation. No-op when absent.
    pub async fn remove_like(&self, user_id: i32, post_id: i32) -> Result<()> {
        post_likes::Entity::delete_many()
            .filter(post_likes::Column::UserId.eq(user_id))
            .filter(post_likes::Column::PostId.eq(post_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete like")?;

        Ok(())
    }

    /// Membership test on the like relation
    pub async fn has_liked(&self, user_id: i32, post_id: i32) -> Result<bool> {
        let row = post_likes::Entity::find_by_id((user_id, post_id))
            .one(&self.conn)
            .await
            .context("Failed to query like")?;

        Ok(row.is_some())
    }

    /// Total number of users
    pub async fn count(&self) -> Result<u64> {
        let count = users::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")?;

        Ok(count)
    }
}

/// Hash a password using Argon2id with default params
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random API key (64 character hex string)
#[must_use]
pub fn generate_api_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// Lower-case the domain part of an email address. The local part is
/// left untouched since some providers treat it as case-sensitive.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_lowercases_domain() {
        assert_eq!(normalize_email("Alice@Example.COM"), "Alice@example.com");
        assert_eq!(normalize_email("bob@mail.org"), "bob@mail.org");
        assert_eq!(normalize_email("  carol@HOME.net  "), "carol@home.net");
    }

    #[test]
    fn test_normalize_email_without_at_sign() {
        assert_eq!(normalize_email("not-an-email"), "not-an-email");
    }

    #[test]
    fn test_generate_api_key_format() {
        let key = generate_api_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_display_name() {
        let user = User {
            id: 1,
            public_id: String::new(),
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            api_key: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            created_at: String::new(),
            updated_at: String::new(),
        };

        assert_eq!(user.name(), "John Doe");
    }
}
