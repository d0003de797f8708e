pub mod prelude;

pub mod post_likes;
pub mod posts;
pub mod users;
