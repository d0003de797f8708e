use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::db::{Store, User};

pub mod auth;
mod error;
mod permissions;
mod posts;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub start_time: std::time::Instant,
}

impl AppState {
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::new(&config.general.database_path).await?;

    Ok(Arc::new(AppState {
        config: Arc::new(RwLock::new(config)),
        store,
        start_time: std::time::Instant::now(),
    }))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, session_minutes) = {
        let config = state.config.read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.session_expiry_minutes,
        )
    };

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_minutes,
        )));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/posts",
            get(posts::list_posts).post(posts::create_post),
        )
        .route(
            "/posts/{public_id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/posts/{public_id}/like", post(posts::like_post))
        .route(
            "/posts/{public_id}/remove_like",
            post(posts::remove_like),
        )
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/password", put(auth::change_password))
        .route("/auth/api-key/regenerate", post(auth::regenerate_api_key))
        .route("/system/status", get(system::get_status))
        .layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

// ============================================================================
// Serialization helpers
// ============================================================================

pub(crate) fn serialize_user(user: &User) -> UserDto {
    UserDto {
        id: user.public_id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        name: user.name(),
        is_superuser: user.is_superuser,
        created_at: user.created_at.clone(),
        updated_at: user.updated_at.clone(),
    }
}

/// Serialize a post for the current principal: the like count is the
/// cardinality of the reverse relation read after any mutation, and
/// `liked` reflects the principal's own membership in it.
pub(crate) async fn serialize_post(
    state: &AppState,
    post: &crate::entities::posts::Model,
    current_user: &User,
) -> Result<PostDto, ApiError> {
    let author = state
        .store()
        .get_user_by_id(post.author_id)
        .await?
        .ok_or_else(|| ApiError::internal(format!("Author {} missing", post.author_id)))?;

    let likes = state.store().like_count(post.id).await?;
    let liked = state.store().has_liked(current_user.id, post.id).await?;

    Ok(PostDto {
        id: post.public_id.clone(),
        author: AuthorDto {
            id: author.public_id.clone(),
            username: author.username.clone(),
            name: author.name(),
        },
        body: post.body.clone(),
        edited: post.edited,
        likes,
        liked,
        created_at: post.created_at.clone(),
        updated_at: post.updated_at.clone(),
    })
}
