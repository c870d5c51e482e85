//! Image tagging by filename.
//!
//! Tags live in the file name itself (`sunset @beach @vacation.jpg`). The
//! [`core`] module holds the codec for that convention, the per-file entity
//! that renames and remembers its previous names, and the small collaborators
//! around it (tag registry, enumerator, workspace store, rename log).

pub mod core;
