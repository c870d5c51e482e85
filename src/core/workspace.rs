use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::core::{ImageRecord, Result, TagError, TagRegistry, parse_extension_list};

pub const WORKSPACE_DIR_NAME: &str = ".imgtag";
pub const DEFAULT_IMAGE_EXTS: &str = ".jpg,.jpeg,.png,.gif,.bmp";

/* ============================ Workspace settings ============================ */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    pub version: u32,
    /// Comma separated extensions recognized as images.
    pub image_exts: String,
    /// Scan subdirectories too.
    pub recursive: bool,
    /// Rename log file name, inside the workspace directory.
    pub rename_log: String,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            version: 1,
            image_exts: DEFAULT_IMAGE_EXTS.to_string(),
            recursive: false,
            rename_log: "renames.log".to_string(),
        }
    }
}

impl WorkspaceSettings {
    #[must_use]
    pub fn image_ext_set(&self) -> HashSet<String> {
        parse_extension_list(&self.image_exts)
    }
}

/* ========================= Paths & basic workspace ========================= */

#[must_use]
pub fn workspace_dir(root: &Path) -> PathBuf {
    root.join(WORKSPACE_DIR_NAME)
}

#[must_use]
pub fn settings_file(root: &Path) -> PathBuf {
    workspace_dir(root).join("settings.json")
}

#[must_use]
pub fn images_file(root: &Path) -> PathBuf {
    workspace_dir(root).join("images.json")
}

#[must_use]
pub fn tags_file(root: &Path) -> PathBuf {
    workspace_dir(root).join("tags.json")
}

#[must_use]
pub fn rename_log_file(root: &Path, settings: &WorkspaceSettings) -> PathBuf {
    workspace_dir(root).join(&settings.rename_log)
}

pub fn ensure_workspace_dir(root: &Path) -> Result<PathBuf> {
    let dir = workspace_dir(root);
    fs::create_dir_all(&dir).map_err(|e| TagError::persistence(&dir, e))?;
    Ok(dir)
}

/* =============================== Workspace IO ============================== */

/// Missing or unparsable files read as `None`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let data = fs::read(path).ok()?;
    match serde_json::from_slice::<T>(&data) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "ignoring unreadable workspace file");
            None
        }
    }
}

/// Writes next to `path` and renames over it, so readers never see half a file.
fn write_json_atomic<T: Serialize + ?Sized>(root: &Path, path: &Path, value: &T) -> Result<()> {
    ensure_workspace_dir(root)?;
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(value)
        .map_err(|e| TagError::persistence(path, io::Error::other(e)))?;
    fs::write(&tmp, data).map_err(|e| TagError::persistence(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| TagError::persistence(path, e))?;
    debug!(path = %path.display(), "saved workspace file");
    Ok(())
}

#[must_use]
pub fn load_settings(root: &Path) -> Option<WorkspaceSettings> {
    read_json(&settings_file(root))
}

pub fn save_settings(root: &Path, settings: &WorkspaceSettings) -> Result<()> {
    write_json_atomic(root, &settings_file(root), settings)
}

#[must_use]
pub fn load_images(root: &Path) -> Option<Vec<ImageRecord>> {
    read_json(&images_file(root))
}

pub fn save_images(root: &Path, records: &[ImageRecord]) -> Result<()> {
    write_json_atomic(root, &images_file(root), records)
}

#[must_use]
pub fn load_tags(root: &Path) -> Option<TagRegistry> {
    read_json(&tags_file(root))
}

pub fn save_tags(root: &Path, registry: &TagRegistry) -> Result<()> {
    write_json_atomic(root, &tags_file(root), registry)
}
