//! Block-structured filesystem that keeps files, free space and file content in
//! singly linked lists threaded through a flat array of fixed-size blocks.
#![allow(clippy::cargo_common_metadata)]

pub mod codec;
pub mod device;
pub mod error;
pub mod fs;
pub mod layout;

pub use device::{BlockDevice, ImageDevice, MemDevice};
pub use error::{FsError, FsResult};
pub use fs::{ChainFs, DirEntry, FsStats, Operations, Position, Splice, Superblock, Usage};
pub use layout::{Attributes, BlockIndex, Geometry, Link, Owner};
