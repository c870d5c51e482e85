use std::{
    ffi::OsStr,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::{
    RenameLog, Result, Tag, TagError, codec, normalize_path, relative_to_root, rename_no_clobber,
};

/* ================================ Identity ================================= */

/// Stable identifier assigned when an image is first discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(Uuid);

impl ImageId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ImageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/* ============================== Stored state =============================== */

/// Plain-data snapshot of an entity for the workspace store.
///
/// `path` is relative to the library root (forward slashes) when the file lives
/// under it, absolute otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    pub path: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub name_history: Vec<String>,
}

/* ================================= Entity ================================== */

/// One image file on disk, its tags, and the names it had before.
///
/// The file name is always `encode(untagged_base, tags, ext)`. Every mutation
/// either renames the file and commits the new state, or fails and leaves the
/// entity exactly as it was.
pub struct ImageEntity {
    id: ImageId,
    path: PathBuf,
    ext: String,
    tags: Vec<Tag>,
    name_history: Vec<String>,
    log: Arc<dyn RenameLog>,
}

impl ImageEntity {
    /// Wraps an existing file. Tags already encoded in its name are adopted.
    pub fn new(path: impl Into<PathBuf>, log: Arc<dyn RenameLog>) -> Result<Self> {
        let path = path.into();
        let (stem, ext) = split_path(&path)?;
        let tags = codec::tags_in_stem(stem)
            .into_iter()
            .filter_map(|name| Tag::new(name).ok())
            .collect();
        let ext = ext.to_string();
        Ok(Self {
            id: ImageId::new(),
            path,
            ext,
            tags,
            name_history: Vec::new(),
            log,
        })
    }

    /// Restores an entity saved with [`ImageEntity::to_record`].
    pub fn from_record(root: &Path, record: ImageRecord, log: Arc<dyn RenameLog>) -> Result<Self> {
        let stored = PathBuf::from(&record.path);
        let path = if stored.is_absolute() {
            stored
        } else {
            root.join(stored)
        };
        let (_, ext) = split_path(&path)?;
        let ext = ext.to_string();
        Ok(Self {
            id: record.id,
            path,
            ext,
            tags: record.tags,
            name_history: record.name_history,
            log,
        })
    }

    #[must_use]
    pub fn to_record(&self, root: &Path) -> ImageRecord {
        ImageRecord {
            id: self.id,
            path: relative_to_root(root, &self.path),
            tags: self.tags.clone(),
            name_history: self.name_history.clone(),
        }
    }

    /* ------------------------------ Accessors ------------------------------ */

    #[must_use]
    pub const fn id(&self) -> ImageId {
        self.id
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or_default()
    }

    /// Current encoded name without the extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        name.strip_suffix(self.ext.as_str()).unwrap_or(name)
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        &self.ext
    }

    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    #[must_use]
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name() == name)
    }

    /// Previous encoded stems, oldest first.
    #[must_use]
    pub fn name_history(&self) -> &[String] {
        &self.name_history
    }

    #[must_use]
    pub fn untagged_base(&self) -> String {
        codec::decode(self.stem())
    }

    /// Name-based comparison: both files have the same untagged base.
    ///
    /// Distinct files can share a base, so this is not identity; use [`ImageEntity::id`].
    #[must_use]
    pub fn same_original_name(&self, other: &Self) -> bool {
        self.untagged_base() == other.untagged_base()
    }

    /* ------------------------------ Mutations ------------------------------ */

    pub fn add_tag(&mut self, tag: &Tag) -> Result<bool> {
        self.add_tags(std::slice::from_ref(tag))
    }

    /// Appends every tag not already present with a single rename.
    pub fn add_tags(&mut self, tags: &[Tag]) -> Result<bool> {
        let mut next = self.tags.clone();
        for t in tags {
            if !next.contains(t) {
                next.push(t.clone());
            }
        }
        if next.len() == self.tags.len() {
            return Ok(false);
        }
        self.retag(next)
    }

    pub fn remove_tag(&mut self, tag: &Tag) -> Result<bool> {
        self.remove_tags(std::slice::from_ref(tag))
    }

    /// Drops the given tags with a single rename. Absent tags are ignored.
    pub fn remove_tags(&mut self, tags: &[Tag]) -> Result<bool> {
        let next: Vec<Tag> = self
            .tags
            .iter()
            .filter(|t| !tags.contains(t))
            .cloned()
            .collect();
        if next.len() == self.tags.len() {
            return Ok(false);
        }
        self.retag(next)
    }

    /// Puts `new` where `old` was. If `new` is already present, `old` is just dropped.
    pub fn replace_tag(&mut self, old: &Tag, new: &Tag) -> Result<bool> {
        if !self.tags.contains(old) {
            return Ok(false);
        }
        let already = self.tags.contains(new);
        let next: Vec<Tag> = self
            .tags
            .iter()
            .filter_map(|t| match t {
                t if t == old && already => None,
                t if t == old => Some(new.clone()),
                t => Some(t.clone()),
            })
            .collect();
        self.retag(next)
    }

    /// Renames the file to `old_stem + ext` if `old_stem` is in the history.
    ///
    /// Current tags are not re-applied; the tag set becomes whatever `old_stem`
    /// encodes. Unknown names are ignored.
    pub fn revert_to_historical_name(&mut self, old_stem: &str) -> Result<bool> {
        if !self.name_history.iter().any(|h| h == old_stem) {
            return Ok(false);
        }
        let tags: Vec<Tag> = codec::tags_in_stem(old_stem)
            .into_iter()
            .filter_map(|name| Tag::new(name).ok())
            .collect();
        let target = self.path.with_file_name(format!("{old_stem}{}", self.ext));
        if !self.rename_to(target, true)? {
            return Ok(false);
        }
        self.tags = tags;
        Ok(true)
    }

    /// Moves the file into `target_dir` under its current name.
    ///
    /// `target_dir` is normalized first so the stored path stays absolute.
    pub fn move_to(&mut self, target_dir: &Path) -> Result<bool> {
        let target = normalize_path(target_dir).join(self.file_name());
        self.rename_to(target, false)
    }

    /* ------------------------------- Internals ----------------------------- */

    fn retag(&mut self, next: Vec<Tag>) -> Result<bool> {
        let stem = codec::encode(&self.untagged_base(), next.as_slice(), "");
        let target = self.path.with_file_name(format!("{stem}{}", self.ext));
        let renamed = self.rename_to(target, true)?;
        self.tags = next;
        Ok(renamed)
    }

    /// Renames on disk, then updates `path` (and history when `record`).
    /// Returns `Ok(false)` when `target` is already the current path.
    fn rename_to(&mut self, target: PathBuf, record: bool) -> Result<bool> {
        if target == self.path {
            return Ok(false);
        }
        if let Err(source) = rename_no_clobber(&self.path, &target) {
            warn!(
                from = %self.path.display(),
                to = %target.display(),
                error = %source,
                "rename failed"
            );
            return Err(TagError::RenameFailed {
                from: self.path.clone(),
                to: target,
                source,
            });
        }

        if record {
            let old_stem = self.stem().to_string();
            self.name_history.push(old_stem);
        }
        self.log.record_rename(&self.path, &target);
        info!(from = %self.path.display(), to = %target.display(), "renamed image");
        self.path = target;
        Ok(true)
    }
}

fn split_path(path: &Path) -> Result<(&str, &str)> {
    let name = path
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or_else(|| TagError::malformed(path.to_string_lossy()))?;
    codec::split_name_and_extension(name)
}

impl PartialEq for ImageEntity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ImageEntity {}

impl fmt::Debug for ImageEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageEntity")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("tags", &self.tags)
            .field("name_history", &self.name_history)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ImageEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}
