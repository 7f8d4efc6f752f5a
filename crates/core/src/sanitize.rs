//! Input normalization and validation for untrusted request data.
//!
//! Every function here is pure. Validators return a result struct instead of
//! an error so callers can decide how to surface the message.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use validator::ValidateEmail;

use crate::roles::Role;

/// Default maximum length applied by [`sanitize_input`].
pub const DEFAULT_MAX_LEN: usize = 255;

/// Maximum length of a tenant or user identifier.
pub const MAX_ID_LEN: usize = 100;

/// Maximum length of a stored email address.
pub const MAX_EMAIL_LEN: usize = 255;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

static SQL_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)\b(SELECT|INSERT|UPDATE|DELETE|DROP|CREATE|ALTER|EXEC|EXECUTE)\b")
            .expect("static regex"),
        Regex::new(r"--|;|/\*|\*/").expect("static regex"),
        Regex::new(r"(?i)\bOR\b.*=.*").expect("static regex"),
        Regex::new(r"(?i)\bAND\b.*=.*").expect("static regex"),
    ]
});

static XSS_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?is)<script\b.*?</script>").expect("static regex"),
        Regex::new(r"(?i)javascript:").expect("static regex"),
        Regex::new(r"(?i)on[a-z0-9_]+\s*=").expect("static regex"),
    ]
});

// ---------------------------------------------------------------------------
// Generic strings
// ---------------------------------------------------------------------------

/// Escape the characters that are significant in HTML markup.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            other => out.push(other),
        }
    }
    out
}

fn truncate_chars(input: &str, max_len: usize) -> String {
    input.chars().take(max_len).collect()
}

/// Trim, strip NUL bytes, HTML-escape and truncate to `max_len` characters.
///
/// `None` yields an empty string. Never fails.
pub fn sanitize_input(raw: Option<&str>, max_len: usize) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let stripped: String = raw.trim().chars().filter(|c| *c != '\0').collect();
    truncate_chars(&escape_html(&stripped), max_len)
}

/// Apply [`sanitize_input`] to every string inside a JSON object.
///
/// Numbers and booleans pass through, arrays have their string members
/// sanitized, nested objects are recursed into and `null` values are dropped.
pub fn sanitize_map(map: &Map<String, Value>, max_len: usize) -> Map<String, Value> {
    let mut sanitized = Map::new();
    for (key, value) in map {
        let cleaned = match value {
            Value::String(s) => Value::String(sanitize_input(Some(s), max_len)),
            Value::Number(_) | Value::Bool(_) => value.clone(),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Value::String(sanitize_input(Some(s), max_len)),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            Value::Object(inner) => Value::Object(sanitize_map(inner, max_len)),
            Value::Null => continue,
        };
        sanitized.insert(key.clone(), cleaned);
    }
    sanitized
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

/// Result of [`validate_email`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailValidation {
    pub valid: bool,
    pub sanitized: String,
    pub error: Option<&'static str>,
}

impl EmailValidation {
    fn reject(sanitized: String, error: &'static str) -> Self {
        Self {
            valid: false,
            sanitized,
            error: Some(error),
        }
    }
}

/// Normalize an email address: lowercase, canonical Gmail domain, escaped.
///
/// Returns an empty string when the input has no `@` separator.
pub fn sanitize_email(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let Some((local, domain)) = lowered.rsplit_once('@') else {
        return String::new();
    };
    if local.is_empty() || domain.is_empty() {
        return String::new();
    }
    let domain = if domain == "googlemail.com" {
        "gmail.com"
    } else {
        domain
    };
    escape_html(&format!("{local}@{domain}"))
}

/// Validate and normalize an email address.
pub fn validate_email(raw: &str) -> EmailValidation {
    if raw.is_empty() {
        return EmailValidation::reject(String::new(), "Email is required");
    }

    let sanitized = sanitize_email(raw);

    let has_tld = sanitized
        .rsplit_once('@')
        .is_some_and(|(_, domain)| domain.contains('.'));
    if !has_tld || !sanitized.validate_email() {
        return EmailValidation::reject(sanitized, "Invalid email format");
    }

    if sanitized.chars().count() > MAX_EMAIL_LEN {
        return EmailValidation::reject(sanitized, "Email too long");
    }

    EmailValidation {
        valid: true,
        sanitized,
        error: None,
    }
}

// ---------------------------------------------------------------------------
// Password
// ---------------------------------------------------------------------------

/// Result of [`validate_password`].
///
/// `has_special` is reported but does not affect `valid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordValidation {
    pub valid: bool,
    pub error: Option<&'static str>,
    pub has_special: bool,
}

const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Check password length and character-class requirements.
pub fn validate_password(raw: &str) -> PasswordValidation {
    let has_special = raw.chars().any(|c| SPECIAL_CHARS.contains(c));
    let reject = |error| PasswordValidation {
        valid: false,
        error: Some(error),
        has_special,
    };

    if raw.is_empty() {
        return reject("Password is required");
    }

    let len = raw.chars().count();
    if len < MIN_PASSWORD_LEN {
        return reject("Password must be at least 8 characters");
    }
    if len > MAX_PASSWORD_LEN {
        return reject("Password too long (max 128 characters)");
    }

    let has_upper = raw.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = raw.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = raw.chars().any(|c| c.is_ascii_digit());

    if !has_upper || !has_lower || !has_digit {
        return reject("Password must contain uppercase, lowercase, and number");
    }

    PasswordValidation {
        valid: true,
        error: None,
        has_special,
    }
}

// ---------------------------------------------------------------------------
// Identifiers and roles
// ---------------------------------------------------------------------------

fn sanitize_identifier(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(MAX_ID_LEN)
        .collect()
}

/// Keep only `[A-Za-z0-9_-]`, truncated to 100 characters.
pub fn sanitize_tenant_id(raw: &str) -> String {
    sanitize_identifier(raw)
}

/// Keep only `[A-Za-z0-9_-]`, truncated to 100 characters.
pub fn sanitize_user_id(raw: &str) -> String {
    sanitize_identifier(raw)
}

/// Normalize a role name; anything outside the role set becomes `user`.
pub fn sanitize_role(raw: &str) -> &'static str {
    Role::parse(raw.trim()).unwrap_or(Role::User).as_str()
}

// ---------------------------------------------------------------------------
// Heuristic detectors
// ---------------------------------------------------------------------------

/// Advisory check for SQL keywords, comment tokens and boolean tautologies.
pub fn has_sql_injection(raw: &str) -> bool {
    !raw.is_empty() && SQL_PATTERNS.iter().any(|re| re.is_match(raw))
}

/// Advisory check for script tags, `javascript:` URLs and inline handlers.
pub fn has_xss(raw: &str) -> bool {
    !raw.is_empty() && XSS_PATTERNS.iter().any(|re| re.is_match(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- sanitize_input --

    #[test]
    fn input_is_trimmed() {
        assert_eq!(sanitize_input(Some("  test  "), DEFAULT_MAX_LEN), "test");
    }

    #[test]
    fn input_null_bytes_removed() {
        assert_eq!(sanitize_input(Some("test\0value"), DEFAULT_MAX_LEN), "testvalue");
    }

    #[test]
    fn input_script_tag_escaped() {
        let result = sanitize_input(Some("  <script>x</script>  "), DEFAULT_MAX_LEN);
        assert!(!result.contains("<script>"));
        assert!(result.starts_with("&lt;script&gt;"));
        assert!(!result.starts_with(' '));
        assert!(!result.ends_with(' '));
    }

    #[test]
    fn input_truncated() {
        let long = "a".repeat(300);
        assert_eq!(sanitize_input(Some(&long), 100).chars().count(), 100);
    }

    #[test]
    fn input_none_is_empty() {
        assert_eq!(sanitize_input(None, DEFAULT_MAX_LEN), "");
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="/x">'&'</a>"#),
            "&lt;a href=&quot;&#x2F;x&quot;&gt;&#x27;&amp;&#x27;&lt;&#x2F;a&gt;"
        );
    }

    #[test]
    fn map_sanitizes_nested_values() {
        let input = serde_json::json!({
            "name": "  <b>bob</b> ",
            "age": 42,
            "active": true,
            "tags": ["<i>", 7],
            "nested": { "note": "a&b" },
            "gone": null,
        });
        let out = sanitize_map(input.as_object().unwrap(), DEFAULT_MAX_LEN);
        assert_eq!(out["name"], "&lt;b&gt;bob&lt;&#x2F;b&gt;");
        assert_eq!(out["age"], 42);
        assert_eq!(out["active"], true);
        assert_eq!(out["tags"], serde_json::json!(["&lt;i&gt;", 7]));
        assert_eq!(out["nested"]["note"], "a&amp;b");
        assert!(!out.contains_key("gone"));
    }

    // -- validate_email --

    #[test]
    fn email_valid() {
        let result = validate_email("test@example.com");
        assert!(result.valid);
        assert_eq!(result.sanitized, "test@example.com");
        assert_eq!(result.error, None);
    }

    #[test]
    fn email_lowercased() {
        assert_eq!(validate_email("Test@Example.COM").sanitized, "test@example.com");
    }

    #[test]
    fn email_googlemail_canonicalized() {
        assert_eq!(
            validate_email("someone@googlemail.com").sanitized,
            "someone@gmail.com"
        );
    }

    #[test]
    fn email_invalid_rejected() {
        let result = validate_email("not-an-email");
        assert!(!result.valid);
        assert_eq!(result.error, Some("Invalid email format"));
    }

    #[test]
    fn email_without_tld_rejected() {
        assert!(!validate_email("user@localhost").valid);
    }

    #[test]
    fn email_empty_rejected() {
        let result = validate_email("");
        assert!(!result.valid);
        assert_eq!(result.error, Some("Email is required"));
    }

    #[test]
    fn email_too_long_rejected() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(!validate_email(&long).valid);
    }

    // -- validate_password --

    #[test]
    fn password_strong_accepted() {
        let result = validate_password("StrongPass123!");
        assert!(result.valid);
        assert!(result.has_special);
    }

    #[test]
    fn password_special_character_optional() {
        let result = validate_password("StrongPass123");
        assert!(result.valid);
        assert!(!result.has_special);
    }

    #[test]
    fn password_short_rejected() {
        let result = validate_password("Short1");
        assert!(!result.valid);
        assert_eq!(result.error, Some("Password must be at least 8 characters"));
    }

    #[test]
    fn password_long_rejected() {
        let long = format!("Aa1{}", "x".repeat(126));
        assert!(!validate_password(&long).valid);
    }

    #[test]
    fn password_missing_classes_rejected() {
        assert!(!validate_password("alllowercase1").valid);
        assert!(!validate_password("ALLUPPERCASE1").valid);
        assert!(!validate_password("NoDigitsHere").valid);
    }

    #[test]
    fn password_empty_rejected() {
        assert_eq!(validate_password("").error, Some("Password is required"));
    }

    // -- identifiers --

    #[test]
    fn tenant_id_stripped() {
        assert_eq!(sanitize_tenant_id("tenant@#$123"), "tenant123");
        assert_eq!(sanitize_tenant_id("acme_corp-01"), "acme_corp-01");
    }

    #[test]
    fn tenant_id_truncated() {
        assert_eq!(sanitize_tenant_id(&"t".repeat(150)).len(), MAX_ID_LEN);
    }

    #[test]
    fn user_id_empty() {
        assert_eq!(sanitize_user_id(""), "");
        assert_eq!(sanitize_user_id("!!!"), "");
    }

    #[test]
    fn role_normalized() {
        assert_eq!(sanitize_role("ADMIN"), "admin");
        assert_eq!(sanitize_role(" Moderator "), "moderator");
        assert_eq!(sanitize_role("hacker"), "user");
        assert_eq!(sanitize_role(""), "user");
    }

    // -- detectors --

    #[test]
    fn sql_injection_detected() {
        assert!(has_sql_injection("SELECT * FROM users"));
        assert!(has_sql_injection("1; DROP TABLE users"));
        assert!(has_sql_injection("admin' OR '1'='1"));
        assert!(has_sql_injection("value -- comment"));
    }

    #[test]
    fn sql_injection_clean_input() {
        assert!(!has_sql_injection("hello world"));
        assert!(!has_sql_injection("selection of items"));
        assert!(!has_sql_injection(""));
    }

    #[test]
    fn xss_detected() {
        assert!(has_xss("<script>alert('xss')</script>"));
        assert!(has_xss("<SCRIPT src=x>\n</SCRIPT>"));
        assert!(has_xss("javascript:alert(1)"));
        assert!(has_xss("<img src=x onerror=alert(1)>"));
    }

    #[test]
    fn xss_clean_input() {
        assert!(!has_xss("just some text"));
        assert!(!has_xss(""));
    }
}
