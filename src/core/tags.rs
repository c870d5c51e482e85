use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::{Result, TagError};

/// A tag name must survive being written as one `@name` filename token.
static TAG_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@/\\]+$").expect("tag name pattern is valid"));

/* ================================== Tag ==================================== */

/// A named label. Equality is exact, case-sensitive name equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(TagError::InvalidTagName {
                name,
                reason: "empty",
            });
        }
        if !TAG_NAME_RE.is_match(&name) {
            return Err(TagError::InvalidTagName {
                name,
                reason: "must not contain whitespace, '@' or path separators",
            });
        }
        Ok(Self(name))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Tag {
    type Error = TagError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

/* ============================== Tag registry =============================== */

/// The set of known tags, in creation order.
///
/// The registry only owns names. Stripping a deleted tag from images is done by
/// `ImageLibrary::delete_tag`, which holds both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagRegistry {
    tags: Vec<Tag>,
}

impl TagRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new tag. Surrounding whitespace in `name` is ignored.
    pub fn create(&mut self, name: &str) -> Result<Tag> {
        let tag = Tag::new(name.trim())?;
        if self.tags.contains(&tag) {
            return Err(TagError::DuplicateTag {
                name: tag.name().to_string(),
            });
        }
        self.tags.push(tag.clone());
        Ok(tag)
    }

    pub fn get_or_create(&mut self, name: &str) -> Result<Tag> {
        match self.get(name.trim()) {
            Some(tag) => Ok(tag),
            None => self.create(name),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Tag> {
        self.tags.iter().find(|t| t.name() == name).cloned()
    }

    pub fn require(&self, name: &str) -> Result<Tag> {
        self.get(name).ok_or_else(|| TagError::UnknownTag {
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name() == name)
    }

    /// Removes `name`, returning the tag if it was registered.
    pub fn delete(&mut self, name: &str) -> Option<Tag> {
        let idx = self.tags.iter().position(|t| t.name() == name)?;
        Some(self.tags.remove(idx))
    }

    /// Registers an already validated tag unless present.
    pub(crate) fn insert(&mut self, tag: Tag) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Swaps `old` for `new` in place, keeping its position.
    pub(crate) fn replace(&mut self, old: &Tag, new: Tag) {
        self.tags.retain(|t| t != &new);
        match self.tags.iter().position(|t| t == old) {
            Some(idx) => self.tags[idx] = new,
            None => self.tags.push(new),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name().to_string()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
