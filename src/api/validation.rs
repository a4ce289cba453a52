//! Input validation for API requests.
//!
//! Functions return `Result<(), String>` so call sites can collect
//! failures with the `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating email addresses (pragmatic, not RFC-complete)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9][-a-zA-Z0-9]*(\.[a-zA-Z0-9][-a-zA-Z0-9]*)+$"
    ).unwrap();

    /// Regex for validating URL slugs (lowercase, dash-separated)
    static ref SLUG_REGEX: Regex = Regex::new(
        r"^[a-z0-9]+(-[a-z0-9]+)*$"
    ).unwrap();

    /// Regex for validating setting keys (snake_case)
    static ref SETTING_KEY_REGEX: Regex = Regex::new(
        r"^[a-z][a-z0-9_]*$"
    ).unwrap();
}

/// Validate a required text field with a length ceiling
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field_name));
    }
    if value.len() > max_len {
        return Err(format!("{} is too long (max {} characters)", field_name, max_len));
    }
    Ok(())
}

/// Validate an optional text field's length
pub fn validate_optional(value: &Option<String>, field_name: &str, max_len: usize) -> Result<(), String> {
    if let Some(v) = value {
        if v.len() > max_len {
            return Err(format!("{} is too long (max {} characters)", field_name, max_len));
        }
    }
    Ok(())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email address".to_string());
    }
    Ok(())
}

/// Validate an email address when present
pub fn validate_optional_email(email: &Option<String>) -> Result<(), String> {
    match email {
        Some(e) if !e.is_empty() => validate_email(e),
        _ => Ok(()),
    }
}

/// Validate a URL slug
pub fn validate_slug(slug: &str) -> Result<(), String> {
    if slug.is_empty() {
        return Err("Slug is required".to_string());
    }
    if slug.len() > 200 {
        return Err("Slug is too long (max 200 characters)".to_string());
    }
    if !SLUG_REGEX.is_match(slug) {
        return Err("Slug must be lowercase alphanumeric with dashes".to_string());
    }
    Ok(())
}

/// Validate a site path for SEO entries ("/", "/about", ...)
pub fn validate_site_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Path is required".to_string());
    }
    if !path.starts_with('/') {
        return Err("Path must start with '/'".to_string());
    }
    if path.len() > 512 {
        return Err("Path is too long (max 512 characters)".to_string());
    }
    if path.contains("..") || path.contains(' ') {
        return Err("Invalid path format".to_string());
    }
    Ok(())
}

/// Validate an optional http(s) URL
pub fn validate_url(url: &Option<String>, field_name: &str) -> Result<(), String> {
    if let Some(u) = url {
        if u.is_empty() {
            return Ok(()); // Empty string treated as no URL
        }
        if u.len() > 2048 {
            return Err(format!("{} is too long (max 2048 characters)", field_name));
        }
        if !u.starts_with("http://") && !u.starts_with("https://") {
            return Err(format!("{} must be an http(s) URL", field_name));
        }
    }
    Ok(())
}

/// Validate an optional RFC 3339 timestamp
pub fn validate_timestamp(value: &Option<String>, field_name: &str) -> Result<(), String> {
    if let Some(v) = value {
        if v.is_empty() {
            return Ok(());
        }
        if chrono::DateTime::parse_from_rfc3339(v).is_err() {
            return Err(format!("{} must be an RFC 3339 timestamp", field_name));
        }
    }
    Ok(())
}

/// Validate a setting key
pub fn validate_setting_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("Key is required".to_string());
    }
    if key.len() > 100 {
        return Err("Key is too long (max 100 characters)".to_string());
    }
    if !SETTING_KEY_REGEX.is_match(key) {
        return Err("Key must be snake_case alphanumeric".to_string());
    }
    Ok(())
}

/// Validate a UUID string
pub fn validate_uuid(id: &str, field_name: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err(format!("{} is required", field_name));
    }
    if uuid::Uuid::parse_str(id).is_err() {
        return Err(format!("Invalid {} format", field_name));
    }
    Ok(())
}

/// Derive a slug from a title: lowercase, non-alphanumerics collapsed
/// into single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("annual-report-2025").is_ok());
        assert!(validate_slug("about").is_ok());

        assert!(validate_slug("").is_err());
        assert!(validate_slug("Upper-Case").is_err());
        assert!(validate_slug("double--dash").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("trailing-").is_err());
        assert!(validate_slug("under_score").is_err());
    }

    #[test]
    fn test_validate_site_path() {
        assert!(validate_site_path("/").is_ok());
        assert!(validate_site_path("/about").is_ok());
        assert!(validate_site_path("/services/licensing").is_ok());

        assert!(validate_site_path("").is_err());
        assert!(validate_site_path("about").is_err());
        assert!(validate_site_path("/a/../b").is_err());
        assert!(validate_site_path("/has space").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url(&Some("https://example.com/logo.png".into()), "logoUrl").is_ok());
        assert!(validate_url(&Some("".into()), "logoUrl").is_ok());
        assert!(validate_url(&None, "logoUrl").is_ok());

        assert!(validate_url(&Some("ftp://example.com".into()), "logoUrl").is_err());
        assert!(validate_url(&Some("example.com".into()), "logoUrl").is_err());
    }

    #[test]
    fn test_validate_timestamp() {
        assert!(validate_timestamp(&Some("2025-06-01T10:00:00Z".into()), "startsAt").is_ok());
        assert!(validate_timestamp(&Some("2025-06-01T10:00:00+03:00".into()), "startsAt").is_ok());
        assert!(validate_timestamp(&None, "startsAt").is_ok());

        assert!(validate_timestamp(&Some("June 1st".into()), "startsAt").is_err());
        assert!(validate_timestamp(&Some("2025-06-01".into()), "startsAt").is_err());
    }

    #[test]
    fn test_validate_setting_key() {
        assert!(validate_setting_key("site_name").is_ok());
        assert!(validate_setting_key("facebook_url").is_ok());

        assert!(validate_setting_key("").is_err());
        assert!(validate_setting_key("SiteName").is_err());
        assert!(validate_setting_key("1leading").is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000", "id").is_ok());
        assert!(validate_uuid("", "id").is_err());
        assert!(validate_uuid("not-a-uuid", "id").is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Annual Report 2025"), "annual-report-2025");
        assert_eq!(slugify("  Hello,   World!  "), "hello-world");
        assert_eq!(slugify("Déjà vu"), "d-j-vu");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
    }
}
