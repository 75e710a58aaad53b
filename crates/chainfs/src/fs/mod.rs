//! The chainfs engine.
//!
//! [`ChainFs`] owns a [`BlockDevice`] plus a cached [`Superblock`] and implements
//! the allocator, the flat file list and the per-file content chains on top of it.
//! Each concern lives in its own `impl` block:
//!
//! - `alloc`: free list rooted at the root block's `next_block`
//! - `directory`: file list rooted at the root block's `next_file`
//! - `content`: data chains hanging off each metadata block's `next_block`
//! - `ops`: the [`Operations`] surface built from the three above
//! - `verify`: whole-disk consistency walk

mod alloc;
mod content;
mod directory;
mod ops;
pub mod path;
mod superblock;
mod verify;

#[cfg(test)]
mod ops_tests;

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use crate::device::BlockDevice;
use crate::error::{FsError, FsResult};
use crate::layout::{
    Attributes, BlockIndex, Geometry, Link, NEXT_BLOCK_LOC, NEXT_FILE_LOC, Owner, ROOT_BLOCK,
    ROOT_PATH, StatField, block_name, directory_block, parse_attributes, read_field, write_field,
};

pub use content::Splice;
pub use directory::{DirEntry, Position};
pub use ops::{FsStats, Operations};
pub use superblock::Superblock;
pub use verify::Usage;

pub struct ChainFs<B: BlockDevice> {
    dev: B,
    geometry: Geometry,
    sb: Superblock,
    owner: Owner,
}

impl<B: BlockDevice> ChainFs<B> {
    /// `format` writes an empty filesystem: every block but the root joins the free
    /// list in index order and the root becomes the directory `/`.
    ///
    /// # Errors
    /// Returns an error if any block write fails.
    pub fn format(mut dev: B) -> FsResult<Self> {
        let geometry = dev.geometry();
        let owner = Owner::current();
        let now = unix_now();
        let sentinel = geometry.num_blocks();

        for i in 1..sentinel {
            let next = if i + 1 < sentinel {
                Some(BlockIndex::new(i + 1))
            } else {
                None
            };
            let block = crate::layout::free_block(&geometry, next)?;
            dev.write_block(BlockIndex::new(i), &block)?;
        }
        let root = directory_block(
            &geometry,
            ROOT_PATH,
            0o755,
            Some(BlockIndex::new(1)),
            owner,
            now,
        )?;
        dev.write_block(ROOT_BLOCK, &root)?;

        info!("format: {geometry}, {} free blocks", sentinel - 1);
        Self::open(dev)
    }

    /// `open` loads the superblock of an already formatted device.
    ///
    /// # Errors
    /// Returns `Corrupt` if block 0 does not hold a root directory.
    pub fn open(dev: B) -> FsResult<Self> {
        let geometry = dev.geometry();
        let root = dev.read_block(ROOT_BLOCK)?;
        let sb = Superblock::from_block(&geometry, &root)?;
        let attr = parse_attributes(&root)?;
        if block_name(&root) != ROOT_PATH || !attr.is_dir() {
            tracing::error!("open: block 0 is not a root directory");
            return Err(FsError::Corrupt);
        }
        Ok(Self {
            dev,
            geometry,
            sb,
            owner: Owner::current(),
        })
    }

    /// `with_owner` overrides the ids stamped on newly created entries.
    #[must_use]
    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = owner;
        self
    }

    #[must_use]
    pub const fn geometry(&self) -> Geometry {
        self.geometry
    }

    #[must_use]
    pub const fn superblock(&self) -> &Superblock {
        &self.sb
    }

    #[must_use]
    pub const fn device(&self) -> &B {
        &self.dev
    }

    #[must_use]
    pub fn into_device(self) -> B {
        self.dev
    }

    /// # Errors
    /// Returns `Io` if the device cannot flush.
    pub fn sync(&mut self) -> FsResult<()> {
        self.dev.sync()
    }

    /// `attributes` decodes the stat fields of the metadata block `block`.
    ///
    /// # Errors
    /// Returns an error if the block cannot be read.
    pub fn attributes(&self, block: BlockIndex) -> FsResult<Attributes> {
        parse_attributes(&self.load(block)?)
    }

    pub(crate) fn load(&self, block: BlockIndex) -> FsResult<Vec<u8>> {
        self.dev.read_block(block)
    }

    pub(crate) fn store(&mut self, block: BlockIndex, bytes: &[u8]) -> FsResult<()> {
        self.dev.write_block(block, bytes)
    }

    /// `next_file_in` returns the file-list successor of `block`, whose raw bytes are
    /// `bytes`. The root's pointer comes from the superblock cache.
    pub(crate) fn next_file_in(&self, block: BlockIndex, bytes: &[u8]) -> FsResult<Link> {
        if block == ROOT_BLOCK {
            Ok(self.sb.first_file)
        } else {
            self.geometry.read_link(bytes, NEXT_FILE_LOC)
        }
    }

    pub(crate) fn next_block_of(&self, block: BlockIndex) -> FsResult<Link> {
        if block == ROOT_BLOCK {
            return Ok(self.sb.free_head);
        }
        let bytes = self.load(block)?;
        self.geometry.read_link(&bytes, NEXT_BLOCK_LOC)
    }

    pub(crate) fn set_next_file(&mut self, block: BlockIndex, next: Link) -> FsResult<()> {
        if block == ROOT_BLOCK {
            self.sb.first_file = next;
            return self.store_superblock();
        }
        let mut bytes = self.load(block)?;
        self.geometry.write_link(&mut bytes, NEXT_FILE_LOC, next)?;
        self.store(block, &bytes)
    }

    pub(crate) fn field(&self, block: BlockIndex, field: StatField) -> FsResult<u64> {
        read_field(&self.load(block)?, field)
    }

    pub(crate) fn set_field(
        &mut self,
        block: BlockIndex,
        field: StatField,
        value: u64,
    ) -> FsResult<()> {
        let mut bytes = self.load(block)?;
        write_field(&mut bytes, field, value)?;
        self.store(block, &bytes)
    }
}

/// `unix_now` is the current time in whole seconds.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
