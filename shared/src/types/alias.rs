use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File extensions accepted for image aliases.
pub const VALID_IMAGE_FORMATS: [&str; 9] = [
    ".jpeg", ".gif", ".png", ".apng", ".svg", ".bmp", ".ico", ".jpg", ".webp",
];

// ---------------------------------------------------------------------------
// Alias records
// ---------------------------------------------------------------------------

/// A named shortcut. `name` is the unique key, `content` is the replacement
/// text or link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alias {
    pub name: String,

    #[serde(alias = "value")]
    pub content: String,

    #[serde(rename = "type")]
    pub kind: AliasType,

    /// Username of whoever created the alias. Assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Unix timestamp (seconds). Assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
}

impl Alias {
    /// Shallow-merge the fields present in `update` into a copy of `self`.
    pub fn merged(&self, update: &PutAlias) -> Alias {
        let mut merged = self.clone();

        if let Some(content) = &update.content {
            merged.content = content.clone();
        }

        if let Some(kind) = update.kind {
            merged.kind = kind;
        }

        merged
    }
}

impl From<PostAlias> for Alias {
    fn from(form: PostAlias) -> Self {
        Self {
            name: form.name,
            content: form.content,
            kind: form.kind,
            author: None,
            created_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AliasType {
    Text,
    Image,
    Gif,
    Emote,
    AnimatedEmote,
}

impl AliasType {
    pub const ALL: [AliasType; 5] = [
        AliasType::Text,
        AliasType::Image,
        AliasType::Gif,
        AliasType::Emote,
        AliasType::AnimatedEmote,
    ];

    /// Wire name, e.g. `animatedEmote`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AliasType::Text => "text",
            AliasType::Image => "image",
            AliasType::Gif => "gif",
            AliasType::Emote => "emote",
            AliasType::AnimatedEmote => "animatedEmote",
        }
    }

    /// Human readable category label.
    pub fn label(&self) -> &'static str {
        match self {
            AliasType::Text => "Text",
            AliasType::Image => "Image",
            AliasType::Gif => "Gif",
            AliasType::Emote => "Emote",
            AliasType::AnimatedEmote => "Animated Emote",
        }
    }
}

impl fmt::Display for AliasType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AliasType {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AliasType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FormError::UnknownType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Creation payload for `POST /alias`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAlias {
    pub name: String,

    #[serde(alias = "value")]
    pub content: String,

    #[serde(rename = "type")]
    pub kind: AliasType,
}

impl PostAlias {
    pub fn new(name: impl Into<String>, kind: AliasType, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            kind,
        }
    }

    /// Client-side form rules, checked before anything is sent.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.name.trim().is_empty() {
            return Err(FormError::EmptyField("name"));
        }

        if self.content.trim().is_empty() {
            return Err(FormError::EmptyField("content"));
        }

        if self.kind == AliasType::Image && !is_valid_image(self.content.trim()) {
            return Err(FormError::InvalidImage);
        }

        Ok(())
    }
}

/// Partial update for `PUT /alias/{name}`. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutAlias {
    #[serde(default, alias = "value", skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AliasType>,
}

impl PutAlias {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            kind: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.kind.is_none()
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.is_empty() {
            return Err(FormError::NothingToUpdate);
        }

        if let Some(content) = &self.content {
            if content.trim().is_empty() {
                return Err(FormError::EmptyField("content"));
            }

            if self.kind == Some(AliasType::Image) && !is_valid_image(content.trim()) {
                return Err(FormError::InvalidImage);
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Form errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("The field {0} is empty")]
    EmptyField(&'static str),

    #[error("Image link must end with one of these extensions: {}", VALID_IMAGE_FORMATS.join(", "))]
    InvalidImage,

    #[error("Nothing to update")]
    NothingToUpdate,

    #[error("Unknown alias type: {0}")]
    UnknownType(String),
}

pub fn is_valid_image(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    VALID_IMAGE_FORMATS
        .iter()
        .any(|format| lower.ends_with(format))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Alias {
        Alias {
            name: "fb".to_string(),
            content: "foobar".to_string(),
            kind: AliasType::Text,
            author: Some("alice".to_string()),
            created_at: Some(1_670_802_822),
        }
    }

    #[test]
    fn merge_only_touches_present_fields() {
        let merged = sample().merged(&PutAlias::content("baz"));
        assert_eq!(merged.content, "baz");
        assert_eq!(merged.kind, AliasType::Text);
        assert_eq!(merged.author.as_deref(), Some("alice"));
        assert_eq!(merged.created_at, Some(1_670_802_822));
    }

    #[test]
    fn merge_with_empty_update_is_identity() {
        assert_eq!(sample().merged(&PutAlias::default()), sample());
    }

    #[test]
    fn image_alias_requires_image_extension() {
        let bad = PostAlias::new("funny", AliasType::Image, "https://example.com/funny");
        assert_eq!(bad.validate(), Err(FormError::InvalidImage));

        let good = PostAlias::new("funny", AliasType::Image, "https://example.com/funny.PNG");
        assert!(good.validate().is_ok());
    }

    #[test]
    fn blank_fields_are_rejected() {
        let form = PostAlias::new("  ", AliasType::Text, "x");
        assert_eq!(form.validate(), Err(FormError::EmptyField("name")));

        let form = PostAlias::new("x", AliasType::Text, "\t");
        assert_eq!(form.validate(), Err(FormError::EmptyField("content")));
    }

    #[test]
    fn empty_put_is_rejected() {
        assert_eq!(
            PutAlias::default().validate(),
            Err(FormError::NothingToUpdate)
        );
    }

    #[test]
    fn type_parses_case_insensitively() {
        assert_eq!("animatedemote".parse::<AliasType>(), Ok(AliasType::AnimatedEmote));
        assert!("sticker".parse::<AliasType>().is_err());
    }
}
