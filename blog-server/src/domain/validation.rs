//! Field-level form validation.
//!
//! Every check runs independently and all failures are reported together,
//! keyed by the name of the offending form field. Lengths are counted in
//! characters, not bytes.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const TITLE_MIN_CHARS: usize = 5;
pub const TITLE_MAX_CHARS: usize = 200;
pub const CONTENT_MIN_CHARS: usize = 10;
pub const COMMENT_MAX_CHARS: usize = 2000;
pub const USERNAME_MAX_CHARS: usize = 150;
pub const PASSWORD_MIN_CHARS: usize = 6;

pub const TITLE_TOO_SHORT: &str = "title too short";
pub const TITLE_TOO_LONG: &str = "title too long";
pub const CONTENT_TOO_SHORT: &str = "content too short";
pub const CONTENT_REQUIRED: &str = "content required";
pub const CONTENT_TOO_LONG: &str = "content too long";
pub const DUPLICATE_USERNAME: &str = "duplicate username";

/// Validation failures grouped by form field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

pub fn validate_post(title: &str, content: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    let title_len = title.chars().count();
    if title_len < TITLE_MIN_CHARS {
        errors.add("title", TITLE_TOO_SHORT);
    } else if title_len > TITLE_MAX_CHARS {
        errors.add("title", TITLE_TOO_LONG);
    }

    if content.chars().count() < CONTENT_MIN_CHARS {
        errors.add("content", CONTENT_TOO_SHORT);
    }

    errors.into_result()
}

pub fn validate_comment(content: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if content.trim().is_empty() {
        errors.add("content", CONTENT_REQUIRED);
    } else if content.chars().count() > COMMENT_MAX_CHARS {
        errors.add("content", CONTENT_TOO_LONG);
    }

    errors.into_result()
}

pub fn validate_username(username: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if username.is_empty() {
        errors.add("username", "username required");
    } else if username.chars().count() > USERNAME_MAX_CHARS {
        errors.add("username", "username too long");
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        errors.add(
            "username",
            "username may contain only letters, digits and @/./+/-/_",
        );
    }

    errors.into_result()
}

/// Password policy applied at registration. Weak passwords are reported
/// against the `password` field.
pub fn validate_password(username: &str, password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if password.chars().count() < PASSWORD_MIN_CHARS {
        errors.add(
            "password",
            format!(
                "weak password: must contain at least {} characters",
                PASSWORD_MIN_CHARS
            ),
        );
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password", "weak password: entirely numeric");
    }
    if !username.is_empty() && password.to_lowercase() == username.to_lowercase() {
        errors.add("password", "weak password: same as the username");
    }

    errors.into_result()
}
