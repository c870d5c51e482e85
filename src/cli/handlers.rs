use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, anyhow};
use imgtag::core::{ImageId, ImageLibrary, drain_relevant_events, relative_to_root, watch_root};
use tracing::{info, warn};

const WATCH_POLL: Duration = Duration::from_millis(250);

/* ================================ Helpers ================================= */

/// Finds the managed image at `arg`, trying it as given (cwd-relative) and then
/// relative to the library root.
fn resolve_image(lib: &ImageLibrary, arg: &Path) -> Result<ImageId> {
    let mut candidates: Vec<PathBuf> = vec![arg.to_path_buf()];
    if arg.is_relative() {
        candidates.push(lib.root().join(arg));
    }
    candidates
        .iter()
        .find_map(|p| lib.find_by_path(p).map(|e| e.id()))
        .ok_or_else(|| {
            anyhow!(
                "{} is not a managed image (run `imgtag scan` first)",
                arg.display()
            )
        })
}

fn display_path(lib: &ImageLibrary, p: &Path) -> String {
    relative_to_root(lib.root(), p)
}

fn save(lib: &ImageLibrary) -> Result<()> {
    lib.save().context("saving workspace")
}

fn report(lib: &ImageLibrary, id: ImageId, changed: bool) {
    let Some(entity) = lib.get(id) else {
        return;
    };
    let shown = display_path(lib, entity.path());
    if changed {
        println!("{shown}");
    } else {
        println!("{shown} (unchanged)");
    }
}

/* =============================== Discovery ================================ */

pub fn on_scan(lib: &mut ImageLibrary, dir: Option<&Path>, recursive: Option<bool>) -> Result<()> {
    let dir = dir.map_or_else(|| lib.root().to_path_buf(), Path::to_path_buf);
    let recursive = recursive.unwrap_or(lib.settings().recursive);
    let before = lib.images().len();
    let found = lib.scan(&dir, recursive);
    let added = lib.images().len() - before;
    save(lib)?;
    println!("{} images found, {added} new", found.len());
    Ok(())
}

pub fn on_list(lib: &ImageLibrary, tag: Option<&str>) {
    let images: Vec<_> = match tag {
        Some(t) => lib.images_with_tag(t),
        None => lib.images().iter().collect(),
    };
    for e in images {
        println!("{}", display_path(lib, e.path()));
    }
}

pub fn on_tags(lib: &ImageLibrary) {
    for tag in lib.registry().iter() {
        println!("{tag}\t{}", lib.images_with_tag(tag.name()).len());
    }
}

pub fn on_prune(lib: &mut ImageLibrary) -> Result<()> {
    let dropped = lib.prune_missing();
    save(lib)?;
    println!("{dropped} missing images forgotten");
    Ok(())
}

/* ================================ Tags ==================================== */

pub fn on_create_tags(lib: &mut ImageLibrary, names: &[String]) -> Result<()> {
    for name in names {
        let tag = lib
            .create_tag(name)
            .with_context(|| format!("creating tag {name:?}"))?;
        println!("created {tag}");
    }
    save(lib)
}

pub fn on_delete_tags(lib: &mut ImageLibrary, names: &[String]) -> Result<()> {
    let result = lib.delete_tags(names);
    // Whatever was renamed before a failure must still be persisted.
    save(lib)?;
    let renamed = result.context("deleting tags")?;
    println!("{renamed} images renamed");
    Ok(())
}

pub fn on_rename_tag(lib: &mut ImageLibrary, old: &str, new: &str) -> Result<()> {
    let result = lib.rename_tag(old, new);
    save(lib)?;
    let renamed = result.with_context(|| format!("renaming tag {old:?} to {new:?}"))?;
    println!("{renamed} images renamed");
    Ok(())
}

/* =============================== Per image ================================ */

pub fn on_tag(lib: &mut ImageLibrary, image: &Path, tags: &[String]) -> Result<()> {
    let id = resolve_image(lib, image)?;
    let changed = lib.tag_image(id, tags).context("tagging image")?;
    save(lib)?;
    report(lib, id, changed);
    Ok(())
}

pub fn on_untag(lib: &mut ImageLibrary, image: &Path, tags: &[String]) -> Result<()> {
    let id = resolve_image(lib, image)?;
    let changed = lib.untag_image(id, tags).context("removing tags")?;
    save(lib)?;
    report(lib, id, changed);
    Ok(())
}

pub fn on_history(lib: &ImageLibrary, image: &Path) -> Result<()> {
    let id = resolve_image(lib, image)?;
    if let Some(entity) = lib.get(id) {
        for name in entity.name_history() {
            println!("{name}");
        }
    }
    Ok(())
}

pub fn on_revert(lib: &mut ImageLibrary, image: &Path, name: &str) -> Result<()> {
    let id = resolve_image(lib, image)?;
    let changed = lib
        .revert_image(id, name)
        .context("reverting to previous name")?;
    if !changed {
        warn!(name, "not a previous name of this image; nothing done");
    }
    save(lib)?;
    report(lib, id, changed);
    Ok(())
}

pub fn on_move(lib: &mut ImageLibrary, image: &Path, target_dir: &Path) -> Result<()> {
    let id = resolve_image(lib, image)?;
    let changed = lib.move_image(id, target_dir).context("moving image")?;
    save(lib)?;
    report(lib, id, changed);
    Ok(())
}

pub fn on_forget(lib: &mut ImageLibrary, image: &Path) -> Result<()> {
    let id = resolve_image(lib, image)?;
    if let Some(entity) = lib.forget(id) {
        println!("forgot {}", display_path(lib, entity.path()));
    }
    save(lib)
}

/* ================================ Watching ================================ */

pub fn on_watch(lib: &mut ImageLibrary) -> Result<()> {
    let root = lib.root().to_path_buf();
    let recursive = lib.settings().recursive;
    let (_watcher, rx) = watch_root(&root, recursive)
        .with_context(|| format!("watching {}", root.display()))?;
    info!(root = %root.display(), recursive, "watching for changes (Ctrl-C to stop)");

    loop {
        std::thread::sleep(WATCH_POLL);
        let exts = lib.settings().image_ext_set();
        if !drain_relevant_events(&rx, &root, &exts) {
            continue;
        }
        let dropped = lib.prune_missing();
        let before = lib.images().len();
        lib.scan_root();
        let added = lib.images().len() - before;
        save(lib)?;
        info!(added, dropped, "rescanned");
    }
}
