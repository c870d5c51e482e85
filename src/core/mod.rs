mod codec;
mod error;
mod fs;
mod image;
mod library;
mod rename_log;
mod tags;
mod workspace;

pub use codec::*;
pub use error::*;
pub use fs::*;
pub use image::*;
pub use library::*;
pub use rename_log::*;
pub use tags::*;
pub use workspace::*;
