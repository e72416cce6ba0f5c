//! Discovery side of a poll cycle: enumerate every file under a root, then
//! keep only the ones that still need converting.

pub mod gate;
pub mod walker;

pub use gate::{ConversionGate, FileCandidate, SOURCE_EXTENSION, TARGET_EXTENSION};
pub use walker::{DirectoryWalker, WalkEntry, WalkError};
