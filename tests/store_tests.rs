use murmur::db::{CreateUserError, NewUser, Store};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

async fn test_store() -> Store {
    Store::new("sqlite::memory:")
        .await
        .expect("Failed to create store")
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: "correct horse battery".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
    }
}

#[tokio::test]
async fn test_create_user_hashes_password() {
    let store = test_store().await;

    let user = store.create_user(new_user("alice")).await.unwrap();
    assert!(!user.public_id.is_empty());
    assert!(!user.is_superuser);
    assert!(user.is_active);

    // The stored credential is a hash, not the plaintext
    let row = murmur::entities::users::Entity::find()
        .filter(murmur::entities::users::Column::Username.eq("alice"))
        .one(&store.conn)
        .await
        .unwrap()
        .unwrap();

    assert_ne!(row.password_hash, "correct horse battery");
    assert!(row.password_hash.starts_with("$argon2"));

    // ... and verifies against the plaintext
    assert!(
        store
            .verify_user_password("alice", "correct horse battery")
            .await
            .unwrap()
    );
    assert!(
        !store
            .verify_user_password("alice", "wrong password")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_create_user_requires_all_fields() {
    let store = test_store().await;

    let missing_username = NewUser {
        username: String::new(),
        ..new_user("x")
    };
    let missing_email = NewUser {
        email: String::new(),
        ..new_user("x")
    };
    let missing_password = NewUser {
        password: String::new(),
        ..new_user("x")
    };

    for (input, field) in [
        (missing_username, "username"),
        (missing_email, "email"),
        (missing_password, "password"),
    ] {
        match store.create_user(input).await {
            Err(CreateUserError::MissingField(f)) => assert_eq!(f, field),
            other => panic!("Expected MissingField({field}), got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_create_user_rejects_duplicates() {
    let store = test_store().await;

    store.create_user(new_user("alice")).await.unwrap();

    let mut dup_username = new_user("alice");
    dup_username.email = "other@example.com".to_string();
    assert!(matches!(
        store.create_user(dup_username).await,
        Err(CreateUserError::Duplicate("username"))
    ));

    let mut dup_email = new_user("alice2");
    dup_email.email = "alice@example.com".to_string();
    assert!(matches!(
        store.create_user(dup_email).await,
        Err(CreateUserError::Duplicate("email"))
    ));
}

#[tokio::test]
async fn test_create_superuser_sets_flags() {
    let store = test_store().await;

    let user = store.create_superuser(new_user("root")).await.unwrap();

    assert!(user.is_superuser);
    assert!(user.is_staff);
    assert!(user.is_active);
}

#[tokio::test]
async fn test_email_domain_is_normalized() {
    let store = test_store().await;

    let mut input = new_user("alice");
    input.email = "Alice@EXAMPLE.Com".to_string();

    let user = store.create_user(input).await.unwrap();
    assert_eq!(user.email, "Alice@example.com");
}

#[tokio::test]
async fn test_create_post_fields() {
    let store = test_store().await;

    let user = store.create_user(new_user("alice")).await.unwrap();
    let post = store.create_post(user.id, "Test post body").await.unwrap();

    assert_eq!(post.author_id, user.id);
    assert_eq!(post.body, "Test post body");
    assert!(!post.edited);
    assert!(!post.public_id.is_empty());

    let found = store
        .get_post_by_public_id(&post.public_id)
        .await
        .unwrap()
        .expect("post should resolve by public id");
    assert_eq!(found.id, post.id);

    assert!(store.get_post_by_public_id("unknown").await.unwrap().is_none());
}

#[tokio::test]
async fn test_like_relation_is_a_set() {
    let store = test_store().await;

    let alice = store.create_user(new_user("alice")).await.unwrap();
    let bob = store.create_user(new_user("bob")).await.unwrap();
    let post = store.create_post(alice.id, "hello").await.unwrap();

    assert!(!store.has_liked(bob.id, post.id).await.unwrap());

    store.like_post(bob.id, post.id).await.unwrap();
    assert!(store.has_liked(bob.id, post.id).await.unwrap());
    assert_eq!(store.like_count(post.id).await.unwrap(), 1);

    // Second like leaves exactly one relation row
    store.like_post(bob.id, post.id).await.unwrap();
    assert_eq!(store.like_count(post.id).await.unwrap(), 1);

    // Likes from different users are independent
    store.like_post(alice.id, post.id).await.unwrap();
    assert_eq!(store.like_count(post.id).await.unwrap(), 2);

    store.remove_like(bob.id, post.id).await.unwrap();
    assert!(!store.has_liked(bob.id, post.id).await.unwrap());
    assert_eq!(store.like_count(post.id).await.unwrap(), 1);

    // Removing an absent pair is a no-op
    store.remove_like(bob.id, post.id).await.unwrap();
    assert_eq!(store.like_count(post.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_post_marks_edited() {
    let store = test_store().await;

    let user = store.create_user(new_user("alice")).await.unwrap();
    let post = store.create_post(user.id, "before").await.unwrap();

    let updated = store.update_post_body(post, "after").await.unwrap();
    assert_eq!(updated.body, "after");
    assert!(updated.edited);
}

#[tokio::test]
async fn test_delete_post() {
    let store = test_store().await;

    let user = store.create_user(new_user("alice")).await.unwrap();
    let post = store.create_post(user.id, "temp").await.unwrap();
    let public_id = post.public_id.clone();

    assert!(store.delete_post(post.id).await.unwrap());
    assert!(store.get_post_by_public_id(&public_id).await.unwrap().is_none());

    // Second delete finds nothing
    assert!(!store.delete_post(post.id).await.unwrap());
}

#[tokio::test]
async fn test_seeded_admin() {
    let store = test_store().await;

    let admin = store
        .get_user_by_username("admin")
        .await
        .unwrap()
        .expect("migration should seed an admin");

    assert!(admin.is_superuser);
    assert!(
        store
            .verify_user_password("admin", "password")
            .await
            .unwrap()
    );

    assert_eq!(store.user_count().await.unwrap(), 1);
}
