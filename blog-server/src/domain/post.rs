use crate::domain::comment::CommentResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Submitted post form, shared by create and edit.
///
/// An absent `published` field means `false` on both create and edit, the
/// way an unchecked HTML checkbox is submitted. Any author field in the
/// submission is ignored; the author always comes from the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "deserialize_checkbox")]
    pub published: bool,
}

/// Values handed to the store when a post is written.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub published: bool,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            published: post.published,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub author_username: String,
    pub comments: Vec<CommentResponse>,
}

// HTML checkboxes submit "on" (or nothing); JSON clients send a bool.
fn deserialize_checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Checkbox {
        Bool(bool),
        Text(String),
    }

    let value = Option::<Checkbox>::deserialize(deserializer)?;
    Ok(match value {
        Some(Checkbox::Bool(b)) => b,
        Some(Checkbox::Text(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "on" | "true" | "1" | "yes"
        ),
        None => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_bool_is_accepted() {
        let form: PostForm =
            serde_json::from_str(r#"{"title":"Hello","content":"World!!!!!","published":true}"#)
                .unwrap();
        assert!(form.published);
    }

    #[test]
    fn checkbox_strings_are_accepted() {
        for (raw, expected) in [("on", true), ("true", true), ("1", true), ("off", false)] {
            let json = format!(r#"{{"title":"t","content":"c","published":"{}"}}"#, raw);
            let form: PostForm = serde_json::from_str(&json).unwrap();
            assert_eq!(form.published, expected, "raw value {raw}");
        }
    }

    #[test]
    fn missing_fields_default() {
        let form: PostForm = serde_json::from_str(r#"{"author_id": 99}"#).unwrap();
        assert_eq!(form.title, "");
        assert_eq!(form.content, "");
        assert!(!form.published);
    }
}
