use crate::db::User;

/// Actions a principal can attempt on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    Read,
    Like,
    Edit,
    Delete,
}

/// Object-level capability check: pure decision over the acting principal,
/// the post's author and the attempted action. Superusers may do anything;
/// any active user may read and like; editing and deleting require
/// ownership. Inactive accounts are denied everything.
#[must_use]
pub fn can_act(principal: &User, post_author_id: i32, action: PostAction) -> bool {
    if !principal.is_active {
        return false;
    }

    if principal.is_superuser {
        return true;
    }

    match action {
        PostAction::Read | PostAction::Like => true,
        PostAction::Edit | PostAction::Delete => principal.id == post_author_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i32, is_active: bool, is_superuser: bool) -> User {
        User {
            id,
            public_id: String::new(),
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
            api_key: String::new(),
            is_active,
            is_staff: is_superuser,
            is_superuser,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_owner_can_do_everything() {
        let owner = user(1, true, false);

        assert!(can_act(&owner, 1, PostAction::Read));
        assert!(can_act(&owner, 1, PostAction::Like));
        assert!(can_act(&owner, 1, PostAction::Edit));
        assert!(can_act(&owner, 1, PostAction::Delete));
    }

    #[test]
    fn test_other_user_can_read_and_like_only() {
        let other = user(2, true, false);

        assert!(can_act(&other, 1, PostAction::Read));
        assert!(can_act(&other, 1, PostAction::Like));
        assert!(!can_act(&other, 1, PostAction::Edit));
        assert!(!can_act(&other, 1, PostAction::Delete));
    }

    #[test]
    fn test_superuser_bypasses_ownership() {
        let admin = user(3, true, true);

        assert!(can_act(&admin, 1, PostAction::Edit));
        assert!(can_act(&admin, 1, PostAction::Delete));
    }

    #[test]
    fn test_inactive_user_is_denied() {
        let inactive = user(4, false, false);
        let inactive_admin = user(5, false, true);

        assert!(!can_act(&inactive, 1, PostAction::Read));
        assert!(!can_act(&inactive_admin, 1, PostAction::Delete));
    }
}
