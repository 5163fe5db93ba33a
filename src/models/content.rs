//! Content model
//!
//! This module provides:
//! - `Content`, the base editorial unit every piece in an issue shares
//! - `ContentKind` / `ContentDetail` for the image and article variants
//! - Input types for creating and updating content
//!
//! Variants are stored as a base `content` row plus an optional side row in
//! `images` or `articles` keyed by the same id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which variant a content row is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Generic content with no extra fields
    #[default]
    Plain,
    /// Image with a required photo
    Image,
    /// Article with an optional related image
    Article,
}

impl ContentKind {
    /// Convert kind to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Plain => "plain",
            ContentKind::Image => "image",
            ContentKind::Article => "article",
        }
    }

    /// Parse kind from database string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "plain" => Some(ContentKind::Plain),
            "image" => Some(ContentKind::Image),
            "article" => Some(ContentKind::Article),
            _ => None,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variant-specific fields of a content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentDetail {
    #[default]
    Plain,
    Image {
        /// Relative storage path of the photo
        photo: String,
    },
    Article {
        /// Relative storage path of the related image.
        ///
        /// `None` when never set. A related image that was set and later
        /// cleared is stored as an empty path.
        related_image: Option<String>,
    },
}

impl ContentDetail {
    /// The kind tag for this detail
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentDetail::Plain => ContentKind::Plain,
            ContentDetail::Image { .. } => ContentKind::Image,
            ContentDetail::Article { .. } => ContentKind::Article,
        }
    }
}

/// Content entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    /// Unique identifier, shared with the variant row
    pub id: i64,
    /// Headline
    pub title: String,
    /// Sub-headline
    pub subtitle: String,
    /// URL-friendly slug (not unique)
    pub slug: String,
    /// Short teaser text
    pub teaser: String,
    /// Rich-text body
    pub body: String,
    /// Whether this is the featured item of its issue and section
    pub is_featured: bool,
    /// Legacy rich-text field
    pub medium: String,
    /// Legacy rich-text field
    pub size: String,
    /// Legacy rich-text field
    pub statement: String,
    /// Owning issue
    pub issue_id: i64,
    /// Owning section
    pub section_id: i64,
    /// Variant-specific fields
    #[serde(flatten)]
    pub detail: ContentDetail,
}

impl Content {
    /// Variant kind of this content
    pub fn kind(&self) -> ContentKind {
        self.detail.kind()
    }

    /// Photo path, for image content
    pub fn photo(&self) -> Option<&str> {
        match &self.detail {
            ContentDetail::Image { photo } => Some(photo),
            _ => None,
        }
    }

    /// Related image path, for article content
    pub fn related_image(&self) -> Option<&str> {
        match &self.detail {
            ContentDetail::Article { related_image } => related_image.as_deref(),
            _ => None,
        }
    }

    /// Whether `other` is in the same (issue, section) group
    pub fn shares_group_with(&self, other: &Content) -> bool {
        self.issue_id == other.issue_id && self.section_id == other.section_id
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Input for creating content of any kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContentInput {
    pub title: String,
    pub subtitle: String,
    pub slug: String,
    pub teaser: String,
    pub body: String,
    pub is_featured: bool,
    pub medium: String,
    pub size: String,
    pub statement: String,
    pub issue_id: i64,
    pub section_id: i64,
    /// Variant-specific fields
    pub detail: ContentDetail,
    /// Contributors credited on the new content
    #[serde(default)]
    pub contributor_ids: Vec<i64>,
    /// Tags attached to the new content
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

impl CreateContentInput {
    /// Create input for plain content; every text field not given is empty.
    pub fn new(title: String, slug: String, issue_id: i64, section_id: i64) -> Self {
        Self {
            title,
            subtitle: String::new(),
            slug,
            teaser: String::new(),
            body: String::new(),
            is_featured: false,
            medium: String::new(),
            size: String::new(),
            statement: String::new(),
            issue_id,
            section_id,
            detail: ContentDetail::Plain,
            contributor_ids: Vec::new(),
            tag_ids: Vec::new(),
        }
    }

    /// Make this an image with the given photo path
    pub fn image(mut self, photo: String) -> Self {
        self.detail = ContentDetail::Image { photo };
        self
    }

    /// Make this an article without a related image
    pub fn article(mut self) -> Self {
        self.detail = ContentDetail::Article { related_image: None };
        self
    }

    /// Make this an article with a related image
    pub fn article_with_image(mut self, related_image: String) -> Self {
        self.detail = ContentDetail::Article {
            related_image: Some(related_image),
        };
        self
    }

    pub fn with_subtitle(mut self, subtitle: String) -> Self {
        self.subtitle = subtitle;
        self
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = body;
        self
    }

    /// Set the featured flag
    pub fn featured(mut self, is_featured: bool) -> Self {
        self.is_featured = is_featured;
        self
    }

    pub fn with_contributors(mut self, contributor_ids: Vec<i64>) -> Self {
        self.contributor_ids = contributor_ids;
        self
    }

    pub fn with_tags(mut self, tag_ids: Vec<i64>) -> Self {
        self.tag_ids = tag_ids;
        self
    }
}

/// Input for updating existing content
///
/// The kind of a content item is fixed at creation; `photo` only applies to
/// images and `related_image` only to articles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateContentInput {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub slug: Option<String>,
    pub teaser: Option<String>,
    pub body: Option<String>,
    pub is_featured: Option<bool>,
    pub medium: Option<String>,
    pub size: Option<String>,
    pub statement: Option<String>,
    pub issue_id: Option<i64>,
    pub section_id: Option<i64>,
    pub photo: Option<String>,
    /// New related image; an empty path records a cleared image
    pub related_image: Option<String>,
}

impl UpdateContentInput {
    /// Create a new empty UpdateContentInput
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the featured flag
    pub fn featured(mut self, is_featured: bool) -> Self {
        self.is_featured = Some(is_featured);
        self
    }

    /// Move the content to another issue
    pub fn with_issue(mut self, issue_id: i64) -> Self {
        self.issue_id = Some(issue_id);
        self
    }

    /// Move the content to another section
    pub fn with_section(mut self, section_id: i64) -> Self {
        self.section_id = Some(section_id);
        self
    }

    pub fn with_photo(mut self, photo: String) -> Self {
        self.photo = Some(photo);
        self
    }

    pub fn with_related_image(mut self, related_image: String) -> Self {
        self.related_image = Some(related_image);
        self
    }

    /// Clear the related image of an article
    pub fn clear_related_image(mut self) -> Self {
        self.related_image = Some(String::new());
        self
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.subtitle.is_some()
            || self.slug.is_some()
            || self.teaser.is_some()
            || self.body.is_some()
            || self.is_featured.is_some()
            || self.medium.is_some()
            || self.size.is_some()
            || self.statement.is_some()
            || self.issue_id.is_some()
            || self.section_id.is_some()
            || self.photo.is_some()
            || self.related_image.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [ContentKind::Plain, ContentKind::Image, ContentKind::Article] {
            assert_eq!(ContentKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ContentKind::parse("video"), None);
    }

    #[test]
    fn test_create_input_defaults_to_plain() {
        let input = CreateContentInput::new("Title".to_string(), "title".to_string(), 1, 2);

        assert_eq!(input.detail, ContentDetail::Plain);
        assert!(!input.is_featured);
        assert!(input.contributor_ids.is_empty());
    }

    #[test]
    fn test_article_without_related_image_is_absent() {
        let input = CreateContentInput::new("A".to_string(), "a".to_string(), 1, 1).article();

        assert_eq!(input.detail, ContentDetail::Article { related_image: None });
        assert_eq!(input.detail.kind(), ContentKind::Article);
    }

    #[test]
    fn test_clear_related_image_is_distinct_from_unset() {
        let unset = UpdateContentInput::new();
        let cleared = UpdateContentInput::new().clear_related_image();

        assert_eq!(unset.related_image, None);
        assert_eq!(cleared.related_image, Some(String::new()));
        assert!(cleared.has_changes());
        assert!(!unset.has_changes());
    }

    #[test]
    fn test_accessors_follow_detail() {
        let content = Content {
            id: 7,
            title: "Lighthouse".to_string(),
            subtitle: String::new(),
            slug: "lighthouse".to_string(),
            teaser: String::new(),
            body: String::new(),
            is_featured: false,
            medium: String::new(),
            size: String::new(),
            statement: String::new(),
            issue_id: 1,
            section_id: 2,
            detail: ContentDetail::Image {
                photo: "images/spring/1_a.jpg".to_string(),
            },
        };

        assert_eq!(content.kind(), ContentKind::Image);
        assert_eq!(content.photo(), Some("images/spring/1_a.jpg"));
        assert_eq!(content.related_image(), None);
        assert_eq!(content.to_string(), "Lighthouse");
    }
}
