use std::ffi::OsStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chainfs::fs::path::join;
use chainfs::{Attributes, BlockDevice, BlockIndex, ChainFs, FsError, FsResult};
use fuser::{FileAttr, FileType};
use tracing::debug;

use crate::fs::constants::{ROOT_ID, STAT_BLOCK_SIZE};

use super::types::ChainFuse;

impl<B: BlockDevice> ChainFuse<B> {
    /// `inode_for` maps a metadata block to its inode number; the root is 1.
    #[must_use]
    pub const fn inode_for(block: BlockIndex) -> u64 {
        block.get() as u64 + ROOT_ID
    }

    #[must_use]
    pub fn block_for_inode(fs: &ChainFs<B>, ino: u64) -> Option<BlockIndex> {
        let index = usize::try_from(ino.checked_sub(ROOT_ID)?).ok()?;
        fs.geometry().index(index).ok()
    }

    #[must_use]
    pub fn is_valid_name(name: &OsStr) -> bool {
        if name.is_empty() || name == OsStr::new(".") || name == OsStr::new("..") {
            return false;
        }
        !name.to_string_lossy().contains('/')
    }

    #[must_use]
    pub fn file_attr(block: BlockIndex, attr: &Attributes, blksize: u32) -> FileAttr {
        let time = |secs: u64| UNIX_EPOCH + Duration::from_secs(secs);
        FileAttr {
            ino: Self::inode_for(block),
            size: attr.st_size,
            blocks: attr.st_size.div_ceil(STAT_BLOCK_SIZE),
            atime: time(attr.st_atime),
            mtime: time(attr.st_mtime),
            ctime: time(attr.st_ctime),
            crtime: time(attr.st_ctime),
            kind: if attr.is_dir() {
                FileType::Directory
            } else {
                FileType::RegularFile
            },
            perm: u16::try_from(attr.permissions()).unwrap_or(0o644),
            nlink: attr.st_nlink,
            uid: attr.st_uid,
            gid: attr.st_gid,
            rdev: 0,
            blksize,
            flags: 0,
        }
    }

    /// `with_fs` runs `op` under the state lock and turns its error into an errno.
    pub(crate) fn with_fs<T>(
        &self,
        op: impl FnOnce(&mut ChainFs<B>) -> FsResult<T>,
    ) -> Result<T, i32> {
        let Ok(mut fs) = self.state.lock() else {
            return Err(libc::EIO);
        };
        op(&mut *fs).map_err(|err| {
            debug!("fuse: {err}");
            err.errno()
        })
    }

    /// `path_for_inode` resolves `ino` to the path stored in its metadata block.
    pub(crate) fn path_for_inode(fs: &ChainFs<B>, ino: u64) -> FsResult<String> {
        let block = Self::block_for_inode(fs, ino).ok_or(FsError::NotFound)?;
        fs.path_of(block)
    }

    /// `child_path` builds the full path of `name` inside the directory `parent`.
    pub(crate) fn child_path(fs: &ChainFs<B>, parent: u64, name: &OsStr) -> FsResult<String> {
        if !Self::is_valid_name(name) {
            return Err(FsError::InvalidArgument);
        }
        let name = name.to_str().ok_or(FsError::InvalidArgument)?;
        let dir = Self::path_for_inode(fs, parent)?;
        Ok(join(&dir, name))
    }

    /// `attr_for_path` looks up `path` and converts its attributes for the kernel.
    pub(crate) fn attr_for_path(fs: &ChainFs<B>, path: &str) -> FsResult<FileAttr> {
        let (block, attr) = fs.resolve(path)?;
        let blksize = u32::try_from(fs.geometry().block_size()).unwrap_or(u32::MAX);
        Ok(Self::file_attr(block, &attr, blksize))
    }
}

/// `unix_secs` converts a kernel timestamp to whole seconds, clamping pre-epoch times.
pub(crate) fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
