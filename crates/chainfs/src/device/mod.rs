//! Block device boundary: whole-block reads and writes addressed by index.

mod image;


use std::ops::Range;

use crate::error::{FsError, FsResult};
use crate::layout::{BlockIndex, Geometry};

pub use image::ImageDevice;

pub trait BlockDevice {
    fn geometry(&self) -> Geometry;

    /// # Errors
    /// Returns `BlockOutOfRange` if `index` is not a block of this device.
    fn read_block(&self, index: BlockIndex) -> FsResult<Vec<u8>>;

    /// # Errors
    /// Returns `BlockOutOfRange` for a bad index, `InvalidArgument` if `data` is not
    /// exactly one block long.
    fn write_block(&mut self, index: BlockIndex, data: &[u8]) -> FsResult<()>;

    /// # Errors
    /// Returns `Io` if buffered writes cannot be pushed to storage.
    fn sync(&mut self) -> FsResult<()> {
        Ok(())
    }
}

/// `block_span` maps a block index to its byte range, checking the buffer length.
fn block_span(geometry: &Geometry, index: BlockIndex, len: usize) -> FsResult<Range<usize>> {
    let index = geometry.index(index.get())?.get();
    if len != geometry.block_size() {
        return Err(FsError::InvalidArgument);
    }
    let start = index * geometry.block_size();
    Ok(start..start + len)
}

/// In-memory block device.
#[derive(Debug, Clone)]
pub struct MemDevice {
    geometry: Geometry,
    bytes: Vec<u8>,
}

impl MemDevice {
    #[must_use]
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            bytes: vec![0u8; geometry.block_size() * geometry.num_blocks()],
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl BlockDevice for MemDevice {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn read_block(&self, index: BlockIndex) -> FsResult<Vec<u8>> {
        let span = block_span(&self.geometry, index, self.geometry.block_size())?;
        Ok(self.bytes[span].to_vec())
    }

    fn write_block(&mut self, index: BlockIndex, data: &[u8]) -> FsResult<()> {
        let span = block_span(&self.geometry, index, data.len())?;
        self.bytes[span].copy_from_slice(data);
        Ok(())
    }
}
