pub use super::post_likes::Entity as PostLikes;
pub use super::posts::Entity as Posts;
pub use super::users::Entity as Users;
