// This module is only used when the `cli` feature is enabled.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use imgtag::core::ImageLibrary;
use tracing_subscriber::EnvFilter;

pub mod handlers;

const DEFAULT_LOG_FILTER: &str = "imgtag=info";

#[derive(Parser, Debug)]
#[command(name = "imgtag", version, about = "Tag images by renaming them: `photo @beach @sunset.jpg`")]
pub struct Cli {
    /// Library root holding the `.imgtag` workspace.
    #[arg(long, short, env = "IMGTAG_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Adopt the images in a directory (defaults to the root).
    Scan {
        dir: Option<PathBuf>,
        /// Include subdirectories (defaults to the workspace setting).
        #[arg(long, conflicts_with = "shallow")]
        recursive: bool,
        /// Only the directory itself.
        #[arg(long)]
        shallow: bool,
    },
    /// List managed images, optionally only those carrying a tag.
    List {
        #[arg(long)]
        tag: Option<String>,
    },
    /// List registered tags with usage counts.
    Tags,
    CreateTag {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Unregister tags and strip them from every image.
    DeleteTag {
        #[arg(required = true)]
        names: Vec<String>,
    },
    RenameTag { old: String, new: String },
    /// Add tags to an image (one rename for all of them).
    Tag {
        image: PathBuf,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Remove tags from an image.
    Untag {
        image: PathBuf,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Show an image's previous names.
    History { image: PathBuf },
    /// Rename an image back to one of its previous names.
    Revert { image: PathBuf, name: String },
    /// Move an image into another directory.
    Move { image: PathBuf, target_dir: PathBuf },
    /// Stop managing an image without touching the file.
    Forget { image: PathBuf },
    /// Forget images whose files have disappeared.
    Prune,
    /// Rescan whenever images under the root change.
    Watch,
}

pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "imgtag=debug" } else { DEFAULT_LOG_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> Result<()> {
    let mut lib = ImageLibrary::open(&cli.root)
        .with_context(|| format!("opening library at {}", cli.root.display()))?;

    match cli.command {
        Command::Scan {
            dir,
            recursive,
            shallow,
        } => {
            let mode = match (recursive, shallow) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            handlers::on_scan(&mut lib, dir.as_deref(), mode)
        }
        Command::List { tag } => {
            handlers::on_list(&lib, tag.as_deref());
            Ok(())
        }
        Command::Tags => {
            handlers::on_tags(&lib);
            Ok(())
        }
        Command::CreateTag { names } => handlers::on_create_tags(&mut lib, &names),
        Command::DeleteTag { names } => handlers::on_delete_tags(&mut lib, &names),
        Command::RenameTag { old, new } => handlers::on_rename_tag(&mut lib, &old, &new),
        Command::Tag { image, tags } => handlers::on_tag(&mut lib, &image, &tags),
        Command::Untag { image, tags } => handlers::on_untag(&mut lib, &image, &tags),
        Command::History { image } => handlers::on_history(&lib, &image),
        Command::Revert { image, name } => handlers::on_revert(&mut lib, &image, &name),
        Command::Move { image, target_dir } => handlers::on_move(&mut lib, &image, &target_dir),
        Command::Forget { image } => handlers::on_forget(&mut lib, &image),
        Command::Prune => handlers::on_prune(&mut lib),
        Command::Watch => handlers::on_watch(&mut lib),
    }
}
