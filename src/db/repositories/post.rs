use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{post_likes, posts};

pub struct PostRepository {
    conn: DatabaseConnection,
}

impl PostRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a post authored by `author_id`
    pub async fn create(&self, author_id: i32, body: &str) -> Result<posts::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = posts::ActiveModel {
            public_id: Set(uuid::Uuid::new_v4().to_string()),
            author_id: Set(author_id),
            body: Set(body.to_string()),
            edited: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = model
            .insert(&self.conn)
            .await
            .context("Failed to insert post")?;

        Ok(model)
    }

    /// Resolve a post by its public ID
    pub async fn get_by_public_id(&self, public_id: &str) -> Result<Option<posts::Model>> {
        let post = posts::Entity::find()
            .filter(posts::Column::PublicId.eq(public_id))
            .one(&self.conn)
            .await
            .context("Failed to query post by public ID")?;

        Ok(post)
    }

    /// All posts, newest first. Id breaks ties between posts created
    /// within the same timestamp.
    pub async fn list(&self) -> Result<Vec<posts::Model>> {
        let posts = posts::Entity::find()
            .order_by_desc(posts::Column::CreatedAt)
            .order_by_desc(posts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list posts")?;

        Ok(posts)
    }

    /// Replace the body and mark the post as edited
    pub async fn update_body(&self, post: posts::Model, body: &str) -> Result<posts::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut active: posts::ActiveModel = post.into();
        active.body = Set(body.to_string());
        active.edited = Set(true);
        active.updated_at = Set(now);

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update post")?;

        Ok(model)
    }

    /// Delete a post by internal ID. Returns false when no row matched.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = posts::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete post")?;

        Ok(result.rows_affected > 0)
    }

    /// Derived like count: cardinality of the reverse like relation,
    /// computed at read time rather than stored.
    pub async fn like_count(&self, post_id: i32) -> Result<u64> {
        let count = post_likes::Entity::find()
            .filter(post_likes::Column::PostId.eq(post_id))
            .count(&self.conn)
            .await
            .context("Failed to count likes")?;

        Ok(count)
    }

    /// Total number of posts
    pub async fn count(&self) -> Result<u64> {
        let count = posts::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count posts")?;

        Ok(count)
    }
}
