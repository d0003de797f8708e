use std::sync::OnceLock;

use regex::Regex;

use super::ApiError;

const MAX_NAME_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 8;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex must compile")
    })
}

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }

    if trimmed.len() > MAX_NAME_LEN {
        return Err(ApiError::validation(format!(
            "Username must be {} characters or less",
            MAX_NAME_LEN
        )));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ApiError::validation(
            "Username can only contain letters, numbers, hyphens, underscores, and dots",
        ));
    }

    Ok(trimmed)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    if !email_regex().is_match(trimmed) {
        return Err(ApiError::validation(format!(
            "Invalid email address: {}",
            trimmed
        )));
    }

    Ok(trimmed)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(password)
}

pub fn validate_post_body(body: Option<&str>) -> Result<&str, ApiError> {
    let body = body.ok_or_else(|| ApiError::validation("Post body is required"))?;

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Post body cannot be empty"));
    }

    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("jdoe").is_ok());
        assert!(validate_username("john.doe-99_x").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("bad user").is_err());
        assert!(validate_username("a".repeat(256).as_str()).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert_eq!(
            validate_email("  alice@example.com  ").unwrap(),
            "alice@example.com"
        );
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@domain").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_post_body() {
        assert_eq!(validate_post_body(Some("hello")).unwrap(), "hello");
        assert!(validate_post_body(None).is_err());
        assert!(validate_post_body(Some("")).is_err());
        assert!(validate_post_body(Some("   ")).is_err());
    }
}
