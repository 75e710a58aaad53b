use crate::codec::{decode_int, write_int};
use crate::device::BlockDevice;
use crate::error::{FsError, FsResult};
use crate::layout::{
    FH_LOC, FH_MAX, FH_SIZE, Geometry, Link, NEXT_BLOCK_LOC, NEXT_FILE_LOC, ROOT_BLOCK,
};

use super::ChainFs;

/// Cached view of the root block's shared fields.
///
/// Block 0 keeps these bytes in the same places as every other block; the cache
/// is written through on each change, so the image stays readable without it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    /// Head of the file list (root's `next_file`).
    pub first_file: Link,
    /// Head of the free list (root's `next_block`).
    pub free_head: Link,
    /// Handle counter, bumped on every create.
    pub handle: u64,
}

impl Superblock {
    /// # Errors
    /// Returns `Corrupt` if the root block is short or holds an invalid pointer.
    pub fn from_block(geometry: &Geometry, root: &[u8]) -> FsResult<Self> {
        let handle = root
            .get(FH_LOC..FH_LOC + FH_SIZE)
            .map(decode_int)
            .ok_or(FsError::Corrupt)?;
        Ok(Self {
            first_file: geometry.read_link(root, NEXT_FILE_LOC)?,
            free_head: geometry.read_link(root, NEXT_BLOCK_LOC)?,
            handle,
        })
    }

    /// # Errors
    /// Returns `Corrupt` if the root block is too short.
    pub fn write_into(&self, geometry: &Geometry, root: &mut [u8]) -> FsResult<()> {
        geometry.write_link(root, NEXT_FILE_LOC, self.first_file)?;
        geometry.write_link(root, NEXT_BLOCK_LOC, self.free_head)?;
        let fh = root
            .get_mut(FH_LOC..FH_LOC + FH_SIZE)
            .ok_or(FsError::Corrupt)?;
        write_int(fh, self.handle & FH_MAX)
    }

    /// `next_handle` is the counter value after one more create; it wraps at the
    /// width of the on-disk field.
    #[must_use]
    pub const fn next_handle(&self) -> u64 {
        (self.handle + 1) & FH_MAX
    }
}

impl<B: BlockDevice> ChainFs<B> {
    pub(crate) fn store_superblock(&mut self) -> FsResult<()> {
        let mut root = self.load(ROOT_BLOCK)?;
        self.sb.write_into(&self.geometry, &mut root)?;
        self.store(ROOT_BLOCK, &root)
    }

    /// `bump_handle` advances the handle counter and returns the new value.
    pub(crate) fn bump_handle(&mut self) -> FsResult<u64> {
        self.sb.handle = self.sb.next_handle();
        self.store_superblock()?;
        Ok(self.sb.handle)
    }
}
