use std::{
    collections::HashSet,
    fs, io,
    path::{Component, Path, PathBuf},
    sync::mpsc,
};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::debug;

use crate::core::WORKSPACE_DIR_NAME;

pub type FsEventReceiver = mpsc::Receiver<notify::Result<notify::Event>>;

/* =============================== Path helpers =============================== */

/// Forward-slash rendering of `p`, used for paths stored relative to a root.
#[must_use]
pub fn path_to_unix(p: &Path) -> String {
    p.iter()
        .map(|c| c.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
        .replacen("//", "/", 1)
}

/// Canonical form of `p` when it exists; otherwise a lexical cleanup that
/// drops `.` and folds `..` into its parent.
#[must_use]
pub fn normalize_path(p: &Path) -> PathBuf {
    if p.as_os_str().is_empty() {
        return PathBuf::new();
    }
    if let Ok(c) = dunce::canonicalize(p) {
        return c;
    }
    // The file may be gone; canonicalize what is left of the parent chain.
    if let (Some(parent), Some(name)) = (p.parent(), p.file_name())
        && let Ok(parent) = dunce::canonicalize(parent)
    {
        return parent.join(name);
    }

    let mut out = PathBuf::new();
    for comp in p.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `path` relative to `root` in forward-slash form, or `path` itself (also
/// forward-slashed) when it lies outside `root`.
#[must_use]
pub fn relative_to_root(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => path_to_unix(rel),
        _ => path.to_string_lossy().into_owned(),
    }
}

/* ============================ Rename primitive ============================== */

/// Atomic rename that refuses to overwrite an existing `to`.
///
/// The existence check and the rename are two steps; with a single writer per
/// file that is enough. Moving across filesystems fails rather than copying.
pub fn rename_no_clobber(from: &Path, to: &Path) -> io::Result<()> {
    if fs::symlink_metadata(to).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("target already exists: {}", to.display()),
        ));
    }
    fs::rename(from, to)
}

/* ============================ Extension filters ============================= */

/// Parses `".jpg, png ,.JPEG"` into `{".jpg", ".png", ".jpeg"}`.
#[must_use]
pub fn parse_extension_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|tok| tok.trim().trim_start_matches('.'))
        .filter(|tok| !tok.is_empty())
        .map(|tok| format!(".{}", tok.to_lowercase()))
        .collect()
}

/// Case-insensitive match of the last extension of `p` against `exts`.
#[must_use]
pub fn has_image_extension<S: ::std::hash::BuildHasher>(
    p: &Path,
    exts: &HashSet<String, S>,
) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| exts.contains(&format!(".{}", e.to_lowercase())))
}

/* =============================== Enumeration ================================ */

/// Lists image files directly in `dir`, or under it when `recursive`.
///
/// Within each directory files come first, sorted by name, followed by the
/// contents of each subdirectory in name order. Unreadable directories are
/// skipped and the workspace directory is never entered.
#[must_use]
pub fn list_images<S: ::std::hash::BuildHasher>(
    dir: &Path,
    recursive: bool,
    exts: &HashSet<String, S>,
) -> Vec<PathBuf> {
    let mut out = Vec::new();
    list_images_into(dir, recursive, exts, &mut out);
    debug!(dir = %dir.display(), recursive, found = out.len(), "enumerated images");
    out
}

fn list_images_into<S: ::std::hash::BuildHasher>(
    dir: &Path,
    recursive: bool,
    exts: &HashSet<String, S>,
    out: &mut Vec<PathBuf>,
) {
    let Ok(entries) = fs::read_dir(dir) else {
        debug!(dir = %dir.display(), "skipping unreadable directory");
        return;
    };

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    let mut dirs: Vec<(String, PathBuf)> = Vec::new();

    for ent in entries.flatten() {
        let path = ent.path();
        let name = ent.file_name().to_string_lossy().into_owned();
        let Ok(ft) = ent.file_type() else {
            continue;
        };

        if ft.is_dir() {
            if name != WORKSPACE_DIR_NAME {
                dirs.push((name, path));
            }
            continue;
        }

        let is_file = ft.is_file() || (ft.is_symlink() && path.is_file());
        if is_file && has_image_extension(&path, exts) {
            files.push((name, path));
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    out.extend(files.into_iter().map(|(_, p)| p));

    if recursive {
        dirs.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, sub) in dirs {
            list_images_into(&sub, true, exts, out);
        }
    }
}

/* ============================== Change watching ============================= */

/// Starts watching `root`. Keep the watcher alive for as long as events are wanted.
pub fn watch_root(root: &Path, recursive: bool) -> notify::Result<(RecommendedWatcher, FsEventReceiver)> {
    let (tx, rx) = mpsc::channel();
    let mut watcher: RecommendedWatcher = notify::recommended_watcher(tx)?;
    let mode = if recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    watcher.watch(root, mode)?;
    Ok((watcher, rx))
}

/// Whether a change at `abs_path` can affect the managed images under `root`.
#[must_use]
pub fn is_event_path_relevant<S: ::std::hash::BuildHasher>(
    root: &Path,
    abs_path: &Path,
    exts: &HashSet<String, S>,
) -> bool {
    let Ok(rel) = abs_path.strip_prefix(root) else {
        return false;
    };

    if rel.as_os_str().is_empty() {
        return true;
    }

    // Our own workspace writes must not trigger rescans.
    let in_workspace = rel
        .components()
        .any(|c| matches!(c, Component::Normal(os) if os == WORKSPACE_DIR_NAME));
    if in_workspace {
        return false;
    }

    has_image_extension(abs_path, exts) || abs_path.is_dir()
}

/// Drains pending events without blocking and reports whether any was relevant.
#[must_use]
pub fn drain_relevant_events<S: ::std::hash::BuildHasher>(
    rx: &FsEventReceiver,
    root: &Path,
    exts: &HashSet<String, S>,
) -> bool {
    let mut relevant = false;
    while let Ok(ev) = rx.try_recv() {
        match ev {
            Ok(ev) => {
                relevant |= ev
                    .paths
                    .iter()
                    .any(|p| is_event_path_relevant(root, p, exts));
            }
            // An error from the watcher means we may have missed something.
            Err(_) => relevant = true,
        }
    }
    relevant
}
