//! Ownership-based capability checks for posts.

use crate::domain::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Edit,
    Delete,
    Comment,
}

/// Whether `viewer` (`None` for an anonymous request) may perform `action`
/// on `post`.
///
/// Drafts are visible only to their author. Editing and deleting are
/// reserved for the author regardless of the published flag. Commenting
/// needs a signed-in viewer who can see the post.
pub fn can(viewer: Option<i64>, action: Action, post: &Post) -> bool {
    let is_author = viewer == Some(post.author_id);
    match action {
        Action::View => post.published || is_author,
        Action::Comment => viewer.is_some() && (post.published || is_author),
        Action::Edit | Action::Delete => is_author,
    }
}
