use tracing::debug;

use crate::device::BlockDevice;
use crate::error::{FsError, FsResult};
use crate::layout::{
    Attributes, BlockIndex, NAME_SIZE, ROOT_PATH, S_IFDIR, S_IFREG, StatField, write_field,
};

use super::content::Splice;
use super::path::{parent_of, validate};
use super::{ChainFs, unix_now};

/// Filesystem operations addressed by absolute path.
pub trait Operations {
    /// `create` makes an empty regular file and returns its handle.
    ///
    /// # Errors
    /// Returns `AlreadyExists`, `NotFound`/`NotDir` for a bad parent, or `NoSpace`.
    fn create(&mut self, path: &str, mode: u32) -> FsResult<u64>;

    /// # Errors
    /// Returns `NotFound` if the path does not exist.
    fn getattr(&self, path: &str) -> FsResult<Attributes>;

    /// # Errors
    /// Returns `NotFound` or `IsDir`.
    fn read(&self, path: &str, size: usize, offset: usize) -> FsResult<Vec<u8>>;

    /// `write` returns the number of bytes accepted from `data`.
    ///
    /// # Errors
    /// Returns `NotFound`, `IsDir`, `NoSpace` or `FileTooLarge`.
    fn write(&mut self, path: &str, data: &[u8], offset: usize) -> FsResult<usize>;

    /// # Errors
    /// Returns `NotFound`, `IsDir`, `NoSpace` or `FileTooLarge`.
    fn truncate(&mut self, path: &str, length: usize) -> FsResult<()>;

    /// # Errors
    /// Returns `NotFound`, or `IsDir` for directories.
    fn unlink(&mut self, path: &str) -> FsResult<()>;

    /// # Errors
    /// Returns `AlreadyExists`, `NotFound`/`NotDir` for a bad parent, or `NoSpace`.
    fn mkdir(&mut self, path: &str, mode: u32) -> FsResult<()>;

    /// # Errors
    /// Returns `NotFound`, `NotDir`, `NotEmpty`, or `Busy` for the root.
    fn rmdir(&mut self, path: &str) -> FsResult<()>;

    /// `readdir` lists `.`, `..` and the names of the immediate children.
    ///
    /// # Errors
    /// Returns `NotFound` or `NotDir`.
    fn readdir(&self, path: &str) -> FsResult<Vec<String>>;

    /// `utimens` sets `(atime, mtime)`; `None` stamps both with the current time.
    ///
    /// # Errors
    /// Returns `NotFound` if the path does not exist.
    fn utimens(&mut self, path: &str, times: Option<(u64, u64)>) -> FsResult<()>;

    /// No extended attributes are stored; existing paths yield an empty value.
    ///
    /// # Errors
    /// Returns `NotFound` if the path does not exist.
    fn getxattr(&self, path: &str, name: &str) -> FsResult<Vec<u8>>;

    /// # Errors
    /// Returns `NotFound` if the path does not exist.
    fn listxattr(&self, path: &str) -> FsResult<Vec<String>>;
}

/// Block-level usage as reported to `statfs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStats {
    pub block_size: usize,
    pub total_blocks: usize,
    pub free_blocks: usize,
    /// Metadata blocks in use, the root included.
    pub files: usize,
    pub name_max: usize,
}

impl<B: BlockDevice> ChainFs<B> {
    /// `resolve` validates `path` and returns its metadata block and attributes.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for malformed paths and `NotFound` if absent.
    pub fn resolve(&self, path: &str) -> FsResult<(BlockIndex, Attributes)> {
        validate(path)?;
        let block = self.lookup(path)?.cur;
        Ok((block, self.attributes(block)?))
    }

    fn resolve_file(&self, path: &str) -> FsResult<BlockIndex> {
        let (block, attr) = self.resolve(path)?;
        if attr.is_dir() {
            return Err(FsError::IsDir);
        }
        Ok(block)
    }

    /// # Errors
    /// Returns `Corrupt` if the free list or file list is malformed.
    pub fn statfs(&self) -> FsResult<FsStats> {
        Ok(FsStats {
            block_size: self.geometry.block_size(),
            total_blocks: self.geometry.num_blocks(),
            free_blocks: self.free_blocks()?.len(),
            files: self.entries()?.len() + 1,
            name_max: NAME_SIZE,
        })
    }
}

impl<B: BlockDevice> Operations for ChainFs<B> {
    fn create(&mut self, path: &str, mode: u32) -> FsResult<u64> {
        debug!("create: {path} mode={mode:o}");
        validate(path)?;
        if path == ROOT_PATH {
            return Err(FsError::AlreadyExists);
        }
        self.create_entry(path, S_IFREG | (mode & 0o7777), 1)
    }

    fn getattr(&self, path: &str) -> FsResult<Attributes> {
        debug!("getattr: {path}");
        Ok(self.resolve(path)?.1)
    }

    fn read(&self, path: &str, size: usize, offset: usize) -> FsResult<Vec<u8>> {
        debug!("read: {path} size={size} offset={offset}");
        let block = self.resolve_file(path)?;
        self.read_at(block, size, offset)
    }

    fn write(&mut self, path: &str, data: &[u8], offset: usize) -> FsResult<usize> {
        debug!("write: {path} len={} offset={offset}", data.len());
        let block = self.resolve_file(path)?;
        self.splice(block, Splice::Write { data, offset })
    }

    fn truncate(&mut self, path: &str, length: usize) -> FsResult<()> {
        debug!("truncate: {path} length={length}");
        let block = self.resolve_file(path)?;
        self.splice(block, Splice::Truncate { length })?;
        Ok(())
    }

    fn unlink(&mut self, path: &str) -> FsResult<()> {
        debug!("unlink: {path}");
        self.resolve_file(path)?;
        self.remove_entry(path)
    }

    fn mkdir(&mut self, path: &str, mode: u32) -> FsResult<()> {
        debug!("mkdir: {path} mode={mode:o}");
        validate(path)?;
        if path == ROOT_PATH {
            return Err(FsError::AlreadyExists);
        }
        self.create_entry(path, S_IFDIR | (mode & 0o7777), 2)?;
        Ok(())
    }

    fn rmdir(&mut self, path: &str) -> FsResult<()> {
        debug!("rmdir: {path}");
        let (_, attr) = self.resolve(path)?;
        if path == ROOT_PATH {
            return Err(FsError::Busy);
        }
        if !attr.is_dir() {
            return Err(FsError::NotDir);
        }
        if !self.list_children(path)?.is_empty() {
            return Err(FsError::NotEmpty);
        }
        let parent = self.lookup(parent_of(path))?.cur;
        self.remove_entry(path)?;
        self.adjust_link_count(parent, -1)
    }

    fn readdir(&self, path: &str) -> FsResult<Vec<String>> {
        debug!("readdir: {path}");
        let (_, attr) = self.resolve(path)?;
        if !attr.is_dir() {
            return Err(FsError::NotDir);
        }
        let mut names = vec![".".to_string(), "..".to_string()];
        names.extend(
            self.list_children(path)?
                .iter()
                .map(|entry| entry.name().to_string()),
        );
        Ok(names)
    }

    fn utimens(&mut self, path: &str, times: Option<(u64, u64)>) -> FsResult<()> {
        debug!("utimens: {path} {times:?}");
        let (block, _) = self.resolve(path)?;
        let (atime, mtime) = times.unwrap_or_else(|| {
            let now = unix_now();
            (now, now)
        });
        let max = StatField::Atime.max();
        let mut bytes = self.load(block)?;
        write_field(&mut bytes, StatField::Atime, atime.min(max))?;
        write_field(&mut bytes, StatField::Mtime, mtime.min(max))?;
        self.store(block, &bytes)
    }

    fn getxattr(&self, path: &str, name: &str) -> FsResult<Vec<u8>> {
        debug!("getxattr: {path} {name}");
        self.resolve(path)?;
        Ok(Vec::new())
    }

    fn listxattr(&self, path: &str) -> FsResult<Vec<String>> {
        debug!("listxattr: {path}");
        self.resolve(path)?;
        Ok(Vec::new())
    }
}
