//! Blog resource.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use super::status::CallError;

/// Store-assigned blog identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlogId(Uuid);

impl BlogId {
    /// Fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the textual form, classifying failures as `InvalidArgument`
    /// against `field`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `raw` is not a valid identifier.
    pub fn parse(raw: &str, field: &str) -> Result<Self, CallError> {
        raw.parse().map_err(|_| {
            CallError::invalid_argument(field, format!("Cannot parse ID: {raw:?}"))
        })
    }
}

impl FromStr for BlogId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for BlogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Blog fields before the store has assigned an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogDraft {
    /// Author reference.
    pub author_id: String,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
}

/// A stored blog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blog {
    /// Identifier.
    pub id: BlogId,
    /// Author reference.
    pub author_id: String,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
}

impl Blog {
    /// Attach an id to a draft.
    #[must_use]
    pub fn from_draft(id: BlogId, draft: BlogDraft) -> Self {
        Self {
            id,
            author_id: draft.author_id,
            title: draft.title,
            content: draft.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::StatusCode;

    #[test]
    fn id_display_round_trips() {
        let id = BlogId::generate();
        assert_eq!(BlogId::parse(&id.to_string(), "blog_id").unwrap(), id);
    }

    #[test]
    fn malformed_id_is_invalid_argument() {
        let err = BlogId::parse("not-an-id", "blog_id").unwrap_err();
        assert_eq!(err.code(), StatusCode::InvalidArgument);
        assert!(matches!(err, CallError::InvalidArgument { ref field, .. } if field == "blog_id"));
    }

    #[test]
    fn from_draft_keeps_fields() {
        let id = BlogId::generate();
        let blog = Blog::from_draft(
            id,
            BlogDraft {
                author_id: "a1".into(),
                title: "t".into(),
                content: "c".into(),
            },
        );
        assert_eq!(blog.id, id);
        assert_eq!(blog.author_id, "a1");
        assert_eq!(blog.title, "t");
        assert_eq!(blog.content, "c");
    }
}
