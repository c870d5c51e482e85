use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, info, warn};

use crate::core::{
    FileRenameLog, ImageEntity, ImageId, RenameLog, Result, Tag, TagError, TagRegistry,
    WorkspaceSettings, ensure_workspace_dir, list_images, load_images, load_settings, load_tags, normalize_path,
    rename_log_file, save_images, save_settings, save_tags,
};

/// Every managed image under one root, plus the tags they may carry.
pub struct ImageLibrary {
    root: PathBuf,
    settings: WorkspaceSettings,
    registry: TagRegistry,
    images: Vec<ImageEntity>,
    log: Arc<dyn RenameLog>,
}

impl ImageLibrary {
    /// Opens the workspace at `root`, logging renames to the configured file.
    pub fn open(root: &Path) -> Result<Self> {
        let root = normalize_path(root);
        ensure_workspace_dir(&root)?;
        let settings = load_settings(&root).unwrap_or_default();
        let log = Arc::new(FileRenameLog::new(rename_log_file(&root, &settings)));
        Ok(Self::open_with(&root, settings, log))
    }

    /// Opens the workspace at `root` with an explicit rename log.
    pub fn open_with_log(root: &Path, log: Arc<dyn RenameLog>) -> Result<Self> {
        let root = normalize_path(root);
        ensure_workspace_dir(&root)?;
        let settings = load_settings(&root).unwrap_or_default();
        Ok(Self::open_with(&root, settings, log))
    }

    fn open_with(root: &Path, settings: WorkspaceSettings, log: Arc<dyn RenameLog>) -> Self {
        let mut registry = load_tags(root).unwrap_or_default();
        let mut images = Vec::new();

        for record in load_images(root).unwrap_or_default() {
            match ImageEntity::from_record(root, record, Arc::clone(&log)) {
                Ok(entity) => {
                    // Keep the registry a superset of what images carry.
                    for tag in entity.tags() {
                        registry.insert(tag.clone());
                    }
                    images.push(entity);
                }
                Err(e) => warn!(error = %e, "dropping unreadable image record"),
            }
        }

        debug!(root = %root.display(), images = images.len(), tags = registry.len(), "opened library");
        Self {
            root: root.to_path_buf(),
            settings,
            registry,
            images,
            log,
        }
    }

    /// Writes settings, tags and images to the workspace directory.
    pub fn save(&self) -> Result<()> {
        save_settings(&self.root, &self.settings)?;
        save_tags(&self.root, &self.registry)?;
        let records: Vec<_> = self
            .images
            .iter()
            .map(|e| e.to_record(&self.root))
            .collect();
        save_images(&self.root, &records)
    }

    /* ------------------------------ Accessors ------------------------------ */

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn settings(&self) -> &WorkspaceSettings {
        &self.settings
    }

    pub const fn settings_mut(&mut self) -> &mut WorkspaceSettings {
        &mut self.settings
    }

    #[must_use]
    pub const fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    #[must_use]
    pub fn images(&self) -> &[ImageEntity] {
        &self.images
    }

    #[must_use]
    pub fn get(&self, id: ImageId) -> Option<&ImageEntity> {
        self.images.iter().find(|e| e.id() == id)
    }

    fn get_mut(&mut self, id: ImageId) -> Result<&mut ImageEntity> {
        self.images
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or_else(|| TagError::UnknownImage { id: id.to_string() })
    }

    /// Looks `path` up as given first, so symlinked images (stored under the
    /// link's own path) match, then in canonical form.
    #[must_use]
    pub fn find_by_path(&self, path: &Path) -> Option<&ImageEntity> {
        if let Some(e) = self.images.iter().find(|e| e.path() == path) {
            return Some(e);
        }
        let wanted = normalize_path(path);
        self.images.iter().find(|e| e.path() == wanted)
    }

    #[must_use]
    pub fn images_with_tag(&self, name: &str) -> Vec<&ImageEntity> {
        self.images.iter().filter(|e| e.has_tag(name)).collect()
    }

    /* ------------------------------ Discovery ------------------------------ */

    /// Scans the root using the configured mode.
    pub fn scan_root(&mut self) -> Vec<ImageId> {
        let root = self.root.clone();
        let recursive = self.settings.recursive;
        self.scan(&root, recursive)
    }

    /// Adopts every image under `dir`. Already managed files keep their state.
    /// Returns the ids of the images found, in enumeration order.
    pub fn scan(&mut self, dir: &Path, recursive: bool) -> Vec<ImageId> {
        let exts = self.settings.image_ext_set();
        let mut found = Vec::new();

        for path in list_images(&normalize_path(dir), recursive, &exts) {
            if let Some(existing) = self.find_by_path(&path) {
                found.push(existing.id());
                continue;
            }
            match ImageEntity::new(path, Arc::clone(&self.log)) {
                Ok(entity) => {
                    for tag in entity.tags() {
                        self.registry.insert(tag.clone());
                    }
                    found.push(entity.id());
                    self.images.push(entity);
                }
                Err(e) => debug!(error = %e, "skipping file"),
            }
        }
        found
    }

    /// Stops managing `id`. The file on disk is left alone.
    pub fn forget(&mut self, id: ImageId) -> Option<ImageEntity> {
        let idx = self.images.iter().position(|e| e.id() == id)?;
        Some(self.images.remove(idx))
    }

    /// Forgets images whose file no longer exists. Returns how many were dropped.
    pub fn prune_missing(&mut self) -> usize {
        let before = self.images.len();
        self.images.retain(|e| e.path().is_file());
        let dropped = before - self.images.len();
        if dropped > 0 {
            info!(dropped, "pruned missing images");
        }
        dropped
    }

    /* ------------------------------- Tagging ------------------------------- */

    pub fn create_tag(&mut self, name: &str) -> Result<Tag> {
        self.registry.create(name)
    }

    /// Adds the named tags (registering unknown ones) with a single rename.
    pub fn tag_image<S: AsRef<str>>(&mut self, id: ImageId, names: &[S]) -> Result<bool> {
        let tags = names
            .iter()
            .map(|n| self.registry.get_or_create(n.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.get_mut(id)?.add_tags(&tags)
    }

    /// Removes the named tags with a single rename. Unknown names are ignored.
    pub fn untag_image<S: AsRef<str>>(&mut self, id: ImageId, names: &[S]) -> Result<bool> {
        let tags: Vec<Tag> = names
            .iter()
            .filter_map(|n| self.registry.get(n.as_ref().trim()))
            .collect();
        self.get_mut(id)?.remove_tags(&tags)
    }

    pub fn revert_image(&mut self, id: ImageId, old_stem: &str) -> Result<bool> {
        let entity = self.get_mut(id)?;
        let changed = entity.revert_to_historical_name(old_stem)?;
        let tags = entity.tags().to_vec();
        for tag in tags {
            self.registry.insert(tag);
        }
        Ok(changed)
    }

    pub fn move_image(&mut self, id: ImageId, target_dir: &Path) -> Result<bool> {
        self.get_mut(id)?.move_to(target_dir)
    }

    /* --------------------------- Registry cascade -------------------------- */

    /// Strips `name` from every image, then unregisters it.
    ///
    /// Stops at the first failed rename; the tag then stays registered because
    /// some images still carry it. Returns how many images were renamed.
    pub fn delete_tag(&mut self, name: &str) -> Result<usize> {
        let tag = self.registry.require(name)?;
        let mut renamed = 0;
        for entity in &mut self.images {
            if entity.remove_tag(&tag)? {
                renamed += 1;
            }
        }
        self.registry.delete(name);
        info!(tag = %tag, renamed, "deleted tag");
        Ok(renamed)
    }

    pub fn delete_tags<S: AsRef<str>>(&mut self, names: &[S]) -> Result<usize> {
        let mut renamed = 0;
        for name in names {
            renamed += self.delete_tag(name.as_ref())?;
        }
        Ok(renamed)
    }

    /// Renames a tag everywhere, keeping each image's tag order.
    ///
    /// On a failed rename both names stay registered so every image's tags
    /// remain resolvable.
    pub fn rename_tag(&mut self, old: &str, new: &str) -> Result<usize> {
        let old_tag = self.registry.require(old)?;
        let new_tag = Tag::new(new.trim())?;
        if self.registry.contains(new_tag.name()) {
            return Err(TagError::DuplicateTag {
                name: new_tag.name().to_string(),
            });
        }
        self.registry.create(new_tag.name())?;

        let mut renamed = 0;
        for entity in &mut self.images {
            if entity.replace_tag(&old_tag, &new_tag)? {
                renamed += 1;
            }
        }
        self.registry.replace(&old_tag, new_tag.clone());
        info!(old = %old_tag, new = %new_tag, renamed, "renamed tag");
        Ok(renamed)
    }
}
