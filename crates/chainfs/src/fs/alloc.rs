use tracing::{error, warn};

use crate::device::BlockDevice;
use crate::error::{FsError, FsResult};
use crate::layout::{BlockIndex, Link, ROOT_BLOCK, free_block};

use super::ChainFs;

impl<B: BlockDevice> ChainFs<B> {
    /// `allocate` pops the head of the free list. The caller owns the block's
    /// header and payload from here on.
    ///
    /// # Errors
    /// Returns `NoSpace` if the free list is empty.
    pub fn allocate(&mut self) -> FsResult<BlockIndex> {
        let Some(head) = self.sb.free_head else {
            warn!("alloc: free list exhausted");
            return Err(FsError::NoSpace);
        };
        if head == ROOT_BLOCK {
            error!("alloc: free list points at the root block");
            return Err(FsError::Corrupt);
        }
        self.sb.free_head = self.next_block_of(head)?;
        self.store_superblock()?;
        Ok(head)
    }

    /// `release` blanks `block` and pushes it onto the front of the free list.
    ///
    /// # Errors
    /// Returns `Corrupt` when asked to free the root block.
    pub fn release(&mut self, block: BlockIndex) -> FsResult<()> {
        if block == ROOT_BLOCK {
            error!("alloc: refusing to free the root block");
            return Err(FsError::Corrupt);
        }
        self.format_free_block(block, self.sb.free_head)?;
        self.sb.free_head = Some(block);
        self.store_superblock()
    }

    /// `format_free_block` writes a blank block whose `next_block` is `next_free`.
    ///
    /// # Errors
    /// Returns an error if the block cannot be written.
    pub fn format_free_block(&mut self, block: BlockIndex, next_free: Link) -> FsResult<()> {
        let bytes = free_block(&self.geometry, next_free)?;
        self.store(block, &bytes)
    }

    /// `free_blocks` lists the free list from head to tail.
    ///
    /// # Errors
    /// Returns `Corrupt` if the list loops.
    pub fn free_blocks(&self) -> FsResult<Vec<BlockIndex>> {
        let mut out = Vec::new();
        let mut cur = self.sb.free_head;
        while let Some(block) = cur {
            if out.len() >= self.geometry.num_blocks() {
                error!("alloc: free list does not terminate");
                return Err(FsError::Corrupt);
            }
            out.push(block);
            cur = self.next_block_of(block)?;
        }
        Ok(out)
    }
}
