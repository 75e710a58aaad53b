use tracing::error;

use crate::codec::encode_name;
use crate::device::BlockDevice;
use crate::error::{FsError, FsResult};
use crate::layout::{
    Attributes, BlockIndex, Link, NAME_LOC, NAME_SIZE, ROOT_BLOCK, ROOT_PATH, S_IFDIR, S_IFMT,
    StatField, block_name, directory_block, file_block, parse_attributes,
};

use super::path::{file_name, is_child, parent_of};
use super::{ChainFs, unix_now};

/// Where a metadata block sits in the file list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub prev: BlockIndex,
    pub cur: BlockIndex,
    pub next: Link,
}

/// One metadata block of the file list, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Full path as stored in the name field.
    pub path: String,
    pub block: BlockIndex,
    pub attr: Attributes,
}

impl DirEntry {
    /// `name` is the last path segment, the form `readdir` reports.
    #[must_use]
    pub fn name(&self) -> &str {
        file_name(&self.path)
    }
}

/// Walks the file list from the first entry after the root, yielding each
/// metadata block with its raw bytes. Gives up with `Corrupt` after visiting
/// more nodes than the disk has blocks.
struct FileList<'a, B: BlockDevice> {
    fs: &'a ChainFs<B>,
    cur: Link,
    steps: usize,
    done: bool,
}

impl<B: BlockDevice> Iterator for FileList<'_, B> {
    type Item = FsResult<(BlockIndex, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let block = self.cur?;
        if self.steps >= self.fs.geometry.num_blocks() {
            error!("directory: file list does not terminate");
            self.done = true;
            return Some(Err(FsError::Corrupt));
        }
        self.steps += 1;

        let step = self.fs.load(block).and_then(|bytes| {
            let next = self.fs.next_file_in(block, &bytes)?;
            Ok((next, bytes))
        });
        match step {
            Ok((next, bytes)) => {
                self.cur = next;
                Some(Ok((block, bytes)))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<B: BlockDevice> ChainFs<B> {
    fn file_list(&self) -> FileList<'_, B> {
        FileList {
            fs: self,
            cur: self.sb.first_file,
            steps: 0,
            done: false,
        }
    }

    /// `lookup` finds the metadata block named `path` together with its
    /// neighbours in the file list. `/` resolves to the root block.
    ///
    /// # Errors
    /// Returns `NotFound` when the list ends without a match, `InvalidArgument` if
    /// the path cannot be encoded.
    pub fn lookup(&self, path: &str) -> FsResult<Position> {
        let target = encode_name(path, NAME_SIZE)?;
        if path == ROOT_PATH {
            return Ok(Position {
                prev: ROOT_BLOCK,
                cur: ROOT_BLOCK,
                next: self.sb.first_file,
            });
        }

        let mut prev = ROOT_BLOCK;
        for entry in self.file_list() {
            let (block, bytes) = entry?;
            if bytes.get(NAME_LOC..NAME_LOC + NAME_SIZE) == Some(target.as_slice()) {
                let next = self.next_file_in(block, &bytes)?;
                return Ok(Position {
                    prev,
                    cur: block,
                    next,
                });
            }
            prev = block;
        }
        Err(FsError::NotFound)
    }

    /// `append` links `block` after the current tail of the file list.
    ///
    /// # Errors
    /// Returns `Corrupt` if the list cannot be walked to its end.
    pub fn append(&mut self, block: BlockIndex) -> FsResult<()> {
        let mut tail = ROOT_BLOCK;
        for entry in self.file_list() {
            tail = entry?.0;
        }
        self.set_next_file(tail, Some(block))
    }

    /// `remove` unthreads `path` from the file list and returns where it was.
    /// Its blocks are left for the caller to release.
    ///
    /// # Errors
    /// Returns `Corrupt` if the entry's neighbours alias each other or the entry.
    pub fn remove(&mut self, path: &str) -> FsResult<Position> {
        let pos = self.lookup(path)?;
        if pos.prev == pos.cur || pos.next == Some(pos.prev) || pos.next == Some(pos.cur) {
            error!("directory: {path} aliases its neighbours {pos:?}");
            return Err(FsError::Corrupt);
        }
        self.set_next_file(pos.prev, pos.next)?;
        Ok(pos)
    }

    /// `entries` decodes every metadata block after the root, in list order.
    ///
    /// # Errors
    /// Returns `Corrupt` if the file list is malformed.
    pub fn entries(&self) -> FsResult<Vec<DirEntry>> {
        self.file_list()
            .map(|entry| {
                let (block, bytes) = entry?;
                Ok(DirEntry {
                    path: block_name(&bytes),
                    block,
                    attr: parse_attributes(&bytes)?,
                })
            })
            .collect()
    }

    /// `list_children` returns the immediate children of `dir` in creation order.
    ///
    /// # Errors
    /// Returns `Corrupt` if the file list is malformed.
    pub fn list_children(&self, dir: &str) -> FsResult<Vec<DirEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|entry| is_child(dir, &entry.path))
            .collect())
    }

    /// `adjust_link_count` adds `delta` to the `st_nlink` field of `dir`.
    ///
    /// # Errors
    /// Returns `Corrupt` on underflow and `TooManyLinks` if the field would overflow.
    pub fn adjust_link_count(&mut self, dir: BlockIndex, delta: i64) -> FsResult<()> {
        let current = self.field(dir, StatField::Nlink)?;
        let magnitude = delta.unsigned_abs();
        let updated = if delta < 0 {
            current.checked_sub(magnitude).ok_or_else(|| {
                error!("directory: link count of block {dir} would drop below zero");
                FsError::Corrupt
            })?
        } else {
            current.saturating_add(magnitude)
        };
        if updated > StatField::Nlink.max() {
            return Err(FsError::TooManyLinks);
        }
        self.set_field(dir, StatField::Nlink, updated)
    }

    /// `create_entry` claims a block for a new file or directory, threads it onto
    /// the end of the file list and returns the new handle. A directory (mode
    /// `S_IFDIR`) also raises its parent's link count.
    ///
    /// # Errors
    /// Returns `AlreadyExists` for a taken path, `NotFound`/`NotDir` for a bad
    /// parent and `NoSpace` when no block is free.
    pub fn create_entry(&mut self, path: &str, mode: u32, nlink: u32) -> FsResult<u64> {
        let is_dir = mode & S_IFMT == S_IFDIR;
        let now = unix_now();
        let bytes = if is_dir {
            directory_block(&self.geometry, path, mode, None, self.owner, now)?
        } else {
            file_block(&self.geometry, path, mode, nlink, self.owner, now)?
        };

        match self.lookup(path) {
            Ok(_) => return Err(FsError::AlreadyExists),
            Err(FsError::NotFound) => {}
            Err(err) => return Err(err),
        }
        let parent = self.lookup(parent_of(path))?.cur;
        let parent_attr = self.attributes(parent)?;
        if !parent_attr.is_dir() {
            return Err(FsError::NotDir);
        }
        if is_dir && u64::from(parent_attr.st_nlink) >= StatField::Nlink.max() {
            return Err(FsError::TooManyLinks);
        }

        let block = self.allocate()?;
        self.store(block, &bytes)?;
        self.append(block)?;
        let handle = self.bump_handle()?;
        if is_dir {
            self.adjust_link_count(parent, 1)?;
        }
        Ok(handle)
    }

    /// `remove_entry` unthreads `path` and returns its data chain and then its
    /// metadata block to the free list.
    ///
    /// # Errors
    /// Returns `NotFound` if there is no such entry.
    pub fn remove_entry(&mut self, path: &str) -> FsResult<()> {
        let cur = self.lookup(path)?.cur;
        let chain = self.data_chain(cur)?;
        self.remove(path)?;
        for block in chain {
            self.release(block)?;
        }
        self.release(cur)
    }

    /// `path_of` maps a metadata block back to the path stored in it.
    ///
    /// # Errors
    /// Returns `NotFound` if `block` is not on the file list.
    pub fn path_of(&self, block: BlockIndex) -> FsResult<String> {
        if block == ROOT_BLOCK {
            return Ok(ROOT_PATH.to_string());
        }
        for entry in self.file_list() {
            let (candidate, bytes) = entry?;
            if candidate == block {
                return Ok(block_name(&bytes));
            }
        }
        Err(FsError::NotFound)
    }
}
