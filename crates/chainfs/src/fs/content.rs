use tracing::error;

use crate::device::BlockDevice;
use crate::error::{FsError, FsResult};
use crate::layout::{
    BlockIndex, HEADER_SIZE, MAX_FILE_SIZE, NEXT_BLOCK_LOC, ROOT_BLOCK, StatField, data_block,
    write_field,
};

use super::{ChainFs, unix_now};

/// A change to a file's content. Both variants go through the same
/// rebuild-and-resize path.
#[derive(Debug, Clone, Copy)]
pub enum Splice<'a> {
    Write { data: &'a [u8], offset: usize },
    Truncate { length: usize },
}

impl Splice<'_> {
    /// `apply` builds the new content from `current`, zero filling any gap.
    fn apply(self, current: &[u8]) -> FsResult<Vec<u8>> {
        let len = match self {
            Self::Write { data, offset } => offset
                .checked_add(data.len())
                .map_or(usize::MAX, |end| end.max(current.len())),
            Self::Truncate { length } => length,
        };
        if len as u64 > MAX_FILE_SIZE {
            return Err(FsError::FileTooLarge);
        }

        match self {
            Self::Write { data, offset } => {
                let mut next = current[..offset.min(current.len())].to_vec();
                next.resize(offset, 0);
                next.extend_from_slice(data);
                if let Some(tail) = current.get(offset + data.len()..) {
                    next.extend_from_slice(tail);
                }
                Ok(next)
            }
            Self::Truncate { length } => {
                let mut next = current[..length.min(current.len())].to_vec();
                next.resize(length, 0);
                Ok(next)
            }
        }
    }

    const fn accepted(self) -> usize {
        match self {
            Self::Write { data, .. } => data.len(),
            Self::Truncate { .. } => 0,
        }
    }
}

impl<B: BlockDevice> ChainFs<B> {
    /// `data_chain` lists the data blocks hanging off the metadata block `meta`.
    ///
    /// # Errors
    /// Returns `Corrupt` if the chain loops or runs into the root block.
    pub fn data_chain(&self, meta: BlockIndex) -> FsResult<Vec<BlockIndex>> {
        // The root's next_block is the free-list head, not content.
        if meta == ROOT_BLOCK {
            return Ok(Vec::new());
        }
        let mut chain = Vec::new();
        let mut cur = self.next_block_of(meta)?;
        while let Some(block) = cur {
            if block == ROOT_BLOCK || chain.len() >= self.geometry.num_blocks() {
                error!("content: chain of block {meta} is malformed");
                return Err(FsError::Corrupt);
            }
            chain.push(block);
            cur = self.next_block_of(block)?;
        }
        Ok(chain)
    }

    /// `contents` concatenates the payloads of `meta`'s chain, trimmed to `st_size`.
    ///
    /// # Errors
    /// Returns `Corrupt` if the chain holds fewer bytes than `st_size`.
    pub fn contents(&self, meta: BlockIndex) -> FsResult<Vec<u8>> {
        let size = usize::try_from(self.field(meta, StatField::Size)?)
            .map_err(|_| FsError::Corrupt)?;
        let mut out = Vec::with_capacity(size);
        for block in self.data_chain(meta)? {
            let bytes = self.load(block)?;
            out.extend_from_slice(&bytes[HEADER_SIZE..]);
            if out.len() >= size {
                break;
            }
        }
        if out.len() < size {
            error!("content: chain of block {meta} is shorter than its size {size}");
            return Err(FsError::Corrupt);
        }
        out.truncate(size);
        Ok(out)
    }

    /// `read_at` returns up to `size` bytes starting at `offset`, clipped to the
    /// file's length.
    ///
    /// # Errors
    /// Returns `Corrupt` if the chain is malformed.
    pub fn read_at(&self, meta: BlockIndex, size: usize, offset: usize) -> FsResult<Vec<u8>> {
        let content = self.contents(meta)?;
        let start = offset.min(content.len());
        let end = offset.saturating_add(size).min(content.len());
        Ok(content[start..end].to_vec())
    }

    /// `splice` rewrites the content of `meta` and resizes its chain to fit.
    ///
    /// Missing blocks are allocated before anything is written, so a failed grow
    /// hands them back and leaves the file as it was. Surplus blocks are released
    /// only after the metadata points at the shortened chain.
    ///
    /// # Errors
    /// Returns `NoSpace` if the chain cannot grow, `FileTooLarge` past the size field.
    pub fn splice(&mut self, meta: BlockIndex, op: Splice<'_>) -> FsResult<usize> {
        let current = self.contents(meta)?;
        let content = op.apply(&current)?;
        let needed = self.geometry.blocks_for(content.len());

        let mut chain = self.data_chain(meta)?;
        let mut grown = Vec::new();
        while chain.len() + grown.len() < needed {
            match self.allocate() {
                Ok(block) => grown.push(block),
                Err(err) => {
                    for block in grown.into_iter().rev() {
                        self.release(block)?;
                    }
                    return Err(err);
                }
            }
        }
        chain.extend(grown);
        let excess = chain.split_off(needed.min(chain.len()));

        let ebs = self.geometry.effective_block_size();
        for (i, &block) in chain.iter().enumerate() {
            let start = (i * ebs).min(content.len());
            let end = ((i + 1) * ebs).min(content.len());
            let next = chain.get(i + 1).copied();
            let bytes = data_block(&self.geometry, next, &content[start..end])?;
            self.store(block, &bytes)?;
        }

        let now = unix_now().min(StatField::Mtime.max());
        let mut bytes = self.load(meta)?;
        write_field(&mut bytes, StatField::Size, content.len() as u64)?;
        write_field(&mut bytes, StatField::Mtime, now)?;
        write_field(&mut bytes, StatField::Ctime, now)?;
        self.geometry
            .write_link(&mut bytes, NEXT_BLOCK_LOC, chain.first().copied())?;
        self.store(meta, &bytes)?;

        for block in excess.into_iter().rev() {
            self.release(block)?;
        }
        Ok(op.accepted())
    }
}
