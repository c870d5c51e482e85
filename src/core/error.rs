use std::{io, path::PathBuf};

use thiserror::Error;

/// Result type for the tagging core.
pub type Result<T> = std::result::Result<T, TagError>;

/// Errors raised by the codec, entities, registry and workspace store.
#[derive(Error, Debug)]
pub enum TagError {
    /// The file name has no `.` to split an extension off (or is not UTF-8).
    #[error("malformed file name (no extension): {name}")]
    MalformedFilename { name: String },

    /// The filesystem refused a rename or move. Nothing was changed.
    #[error("failed to rename {} -> {}: {source}", from.display(), to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid tag name {name:?}: {reason}")]
    InvalidTagName { name: String, reason: &'static str },

    #[error("unknown tag: {name}")]
    UnknownTag { name: String },

    #[error("tag already exists: {name}")]
    DuplicateTag { name: String },

    #[error("no managed image with id {id}")]
    UnknownImage { id: String },

    /// Reading or writing the workspace store failed.
    #[error("workspace error at {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TagError {
    pub(crate) fn malformed(name: impl Into<String>) -> Self {
        Self::MalformedFilename { name: name.into() }
    }

    pub(crate) fn persistence(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }
}
