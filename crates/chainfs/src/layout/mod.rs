//! On-disk format
//!
//! The disk is `num_blocks` blocks of `block_size` bytes. Block 0 is the root.
//! Every block starts with the same two-byte header:
//!
//! - `next_file` (1 byte): next metadata block in the file list
//! - `next_block` (1 byte): next free block, or next data block of a chain
//!
//! A metadata block continues with the stat fields (see [`StatField`]) and the
//! full path, zero padded to `NAME_SIZE`. The root block also stores the handle
//! counter right after the name, and its `next_block` is the free-list head.
//!
//! A data block continues with `block_size - HEADER_SIZE` bytes of content.
//!
//! The value `num_blocks` is the sentinel meaning "no block". Integers are
//! unsigned big-endian.

mod metadata;

#[cfg(test)]
mod layout_tests;

use std::fmt;

use crate::codec::{decode_int, write_int};
use crate::error::{FsError, FsResult};

pub use metadata::{
    Attributes, Owner, S_IFDIR, S_IFMT, S_IFREG, block_name, data_block, directory_block,
    file_block, format_metadata, free_block, parse_attributes, read_field, write_field,
};

/// DEFAULT_BLOCK_SIZE is the block size used when none is configured.
pub const DEFAULT_BLOCK_SIZE: usize = 64;
/// DEFAULT_NUM_BLOCKS is the block count used when none is configured.
pub const DEFAULT_NUM_BLOCKS: usize = 16;

pub const NEXT_FILE_LOC: usize = 0;
pub const NEXT_FILE_SIZE: usize = 1;
pub const NEXT_BLOCK_LOC: usize = NEXT_FILE_LOC + NEXT_FILE_SIZE;
pub const NEXT_BLOCK_SIZE: usize = 1;
/// HEADER_SIZE is the width of the pointer header shared by all blocks.
pub const HEADER_SIZE: usize = NEXT_FILE_SIZE + NEXT_BLOCK_SIZE;

/// FILE_DATA_LOC is where the stat fields of a metadata block begin.
pub const FILE_DATA_LOC: usize = HEADER_SIZE;
/// STAT_SIZE is the combined width of the eight stat fields.
pub const STAT_SIZE: usize = 21;
pub const NAME_LOC: usize = FILE_DATA_LOC + STAT_SIZE;
/// NAME_SIZE is the maximum encoded path length.
pub const NAME_SIZE: usize = 16;
/// FILE_DATA_SIZE is the width of the metadata payload (stat fields plus name).
pub const FILE_DATA_SIZE: usize = STAT_SIZE + NAME_SIZE;

/// FH_LOC is the handle counter, present only in the root block.
pub const FH_LOC: usize = FILE_DATA_LOC + FILE_DATA_SIZE;
pub const FH_SIZE: usize = 1;
pub const FH_MAX: u64 = (1 << (8 * FH_SIZE)) - 1;

/// MIN_BLOCK_SIZE is the smallest block that still holds the root.
pub const MIN_BLOCK_SIZE: usize = FH_LOC + FH_SIZE;
/// MAX_NUM_BLOCKS keeps the sentinel representable in a block pointer.
pub const MAX_NUM_BLOCKS: usize = (1 << (8 * NEXT_BLOCK_SIZE)) - 1;
/// MAX_FILE_SIZE is the largest value the `st_size` field can hold.
pub const MAX_FILE_SIZE: u64 = StatField::Size.max();

pub const ROOT_BLOCK: BlockIndex = BlockIndex(0);
pub const ROOT_PATH: &str = "/";

/// A block pointer: `None` is stored on disk as the sentinel.
pub type Link = Option<BlockIndex>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockIndex(usize);

impl BlockIndex {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for BlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stat fields of a metadata block, in on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    Mode,
    Uid,
    Gid,
    Nlink,
    Size,
    Ctime,
    Mtime,
    Atime,
}

impl StatField {
    pub const ALL: [Self; 8] = [
        Self::Mode,
        Self::Uid,
        Self::Gid,
        Self::Nlink,
        Self::Size,
        Self::Ctime,
        Self::Mtime,
        Self::Atime,
    ];

    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Nlink => 1,
            Self::Mode | Self::Uid | Self::Gid | Self::Size => 2,
            Self::Ctime | Self::Mtime | Self::Atime => 4,
        }
    }

    /// `loc` is the byte offset of the field from the start of the block.
    #[must_use]
    pub const fn loc(self) -> usize {
        FILE_DATA_LOC
            + match self {
                Self::Mode => 0,
                Self::Uid => 2,
                Self::Gid => 4,
                Self::Nlink => 6,
                Self::Size => 7,
                Self::Ctime => 9,
                Self::Mtime => 13,
                Self::Atime => 17,
            }
    }

    #[must_use]
    pub const fn max(self) -> u64 {
        (1u64 << (8 * self.width())) - 1
    }
}

/// Block size and block count of a disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    block_size: usize,
    num_blocks: usize,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            num_blocks: DEFAULT_NUM_BLOCKS,
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} blocks x {} bytes", self.num_blocks, self.block_size)
    }
}

impl Geometry {
    /// # Errors
    /// Returns `InvalidArgument` if the root cannot fit in a block, or the block count
    /// leaves no room for data or cannot be addressed by a one-byte pointer.
    pub const fn new(block_size: usize, num_blocks: usize) -> FsResult<Self> {
        if block_size < MIN_BLOCK_SIZE || num_blocks < 2 || num_blocks > MAX_NUM_BLOCKS {
            return Err(FsError::InvalidArgument);
        }
        Ok(Self {
            block_size,
            num_blocks,
        })
    }

    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    #[must_use]
    pub const fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    /// `effective_block_size` is the number of content bytes a data block carries.
    #[must_use]
    pub const fn effective_block_size(&self) -> usize {
        self.block_size - HEADER_SIZE
    }

    #[must_use]
    pub const fn sentinel(&self) -> u64 {
        self.num_blocks as u64
    }

    #[must_use]
    pub const fn image_len(&self) -> u64 {
        (self.block_size as u64) * (self.num_blocks as u64)
    }

    /// `blocks_for` is the number of data blocks content of `len` bytes occupies.
    /// Even empty content keeps one block.
    #[must_use]
    pub const fn blocks_for(&self, len: usize) -> usize {
        let blocks = len.div_ceil(self.effective_block_size());
        if blocks == 0 { 1 } else { blocks }
    }

    /// # Errors
    /// Returns `BlockOutOfRange` if `index` does not name a block of this disk.
    pub const fn index(&self, index: usize) -> FsResult<BlockIndex> {
        if index < self.num_blocks {
            Ok(BlockIndex(index))
        } else {
            Err(FsError::BlockOutOfRange(index))
        }
    }

    #[must_use]
    pub const fn encode_link(&self, link: Link) -> u64 {
        match link {
            Some(BlockIndex(index)) => index as u64,
            None => self.sentinel(),
        }
    }

    /// # Errors
    /// Returns `Corrupt` for pointer values beyond the sentinel.
    pub fn decode_link(&self, raw: u64) -> FsResult<Link> {
        match raw.cmp(&self.sentinel()) {
            std::cmp::Ordering::Less => Ok(Some(BlockIndex(raw as usize))),
            std::cmp::Ordering::Equal => Ok(None),
            std::cmp::Ordering::Greater => {
                tracing::error!("layout: pointer {raw} beyond sentinel {}", self.sentinel());
                Err(FsError::Corrupt)
            }
        }
    }

    /// `read_link` decodes the pointer at `loc` (`NEXT_FILE_LOC` or `NEXT_BLOCK_LOC`).
    ///
    /// # Errors
    /// Returns `Corrupt` if the block is short or the pointer is invalid.
    pub fn read_link(&self, block: &[u8], loc: usize) -> FsResult<Link> {
        let raw = block.get(loc..loc + NEXT_BLOCK_SIZE).ok_or(FsError::Corrupt)?;
        self.decode_link(decode_int(raw))
    }

    /// # Errors
    /// Returns `Corrupt` if the block is too short to hold the header.
    pub fn write_link(&self, block: &mut [u8], loc: usize, link: Link) -> FsResult<()> {
        let dst = block
            .get_mut(loc..loc + NEXT_BLOCK_SIZE)
            .ok_or(FsError::Corrupt)?;
        write_int(dst, self.encode_link(link))
    }
}
