//! Constants of the FUSE adapter.

use std::time::Duration;

/// ROOT_ID is the inode ID for the filesystem root.
pub const ROOT_ID: u64 = 1;
/// TTL controls kernel cache TTL for attribute entries.
pub const TTL: Duration = Duration::from_secs(1);
/// OPEN_DIRECT_IO toggles direct I/O for FUSE file handles.
pub const OPEN_DIRECT_IO: u32 = 1;
/// STAT_BLOCK_SIZE is the unit `FileAttr::blocks` is counted in.
pub const STAT_BLOCK_SIZE: u64 = 512;
