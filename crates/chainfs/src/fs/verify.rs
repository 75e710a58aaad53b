use tracing::error;

use crate::device::BlockDevice;
use crate::error::{FsError, FsResult};
use crate::layout::{BlockIndex, ROOT_BLOCK};

use super::ChainFs;

/// How the blocks of a disk are split between the three lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    /// Metadata blocks, the root included.
    pub metadata_blocks: usize,
    pub data_blocks: usize,
    pub free_blocks: usize,
}

impl Usage {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.metadata_blocks + self.data_blocks + self.free_blocks
    }
}

struct Marks {
    seen: Vec<bool>,
}

impl Marks {
    fn claim(&mut self, block: BlockIndex, what: &str) -> FsResult<()> {
        match self.seen.get_mut(block.get()) {
            Some(slot) if !*slot => {
                *slot = true;
                Ok(())
            }
            Some(_) => {
                error!("verify: block {block} reached twice (as {what})");
                Err(FsError::Corrupt)
            }
            None => Err(FsError::BlockOutOfRange(block.get())),
        }
    }
}

impl<B: BlockDevice> ChainFs<B> {
    /// `verify` walks the file list, every data chain and the free list and checks
    /// that together they reach each block exactly once. Regular files must own
    /// exactly as many data blocks as their size needs, or none before the first
    /// write.
    ///
    /// # Errors
    /// Returns `Corrupt` on any shared, leaked or miscounted block.
    pub fn verify(&self) -> FsResult<Usage> {
        let mut marks = Marks {
            seen: vec![false; self.geometry.num_blocks()],
        };
        let mut usage = Usage {
            metadata_blocks: 1,
            data_blocks: 0,
            free_blocks: 0,
        };
        marks.claim(ROOT_BLOCK, "root")?;

        for entry in self.entries()? {
            marks.claim(entry.block, "metadata")?;
            usage.metadata_blocks += 1;

            let chain = self.data_chain(entry.block)?;
            let size = usize::try_from(entry.attr.st_size).map_err(|_| FsError::Corrupt)?;
            let expected = if entry.attr.is_dir() || (chain.is_empty() && size == 0) {
                0
            } else {
                self.geometry.blocks_for(size)
            };
            if chain.len() != expected {
                error!(
                    "verify: {} owns {} data blocks, expected {expected}",
                    entry.path,
                    chain.len()
                );
                return Err(FsError::Corrupt);
            }
            for block in chain {
                marks.claim(block, "data")?;
                usage.data_blocks += 1;
            }
        }

        for block in self.free_blocks()? {
            marks.claim(block, "free")?;
            usage.free_blocks += 1;
        }

        if let Some(leaked) = marks.seen.iter().position(|seen| !seen) {
            error!("verify: block {leaked} is on no list");
            return Err(FsError::Corrupt);
        }
        Ok(usage)
    }
}
