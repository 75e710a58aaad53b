use std::ffi::OsStr;
use std::time::SystemTime;

use chainfs::{BlockDevice, FsError, FsStats, Operations};
use fuser::{FileAttr, ReplyAttr, ReplyEmpty, ReplyStatfs, ReplyXattr, Request, TimeOrNow};

use crate::fs::constants::TTL;

use super::core::unix_secs;
use super::types::ChainFuse;

fn time_secs(time: TimeOrNow) -> u64 {
    match time {
        TimeOrNow::SpecificTime(at) => unix_secs(at),
        TimeOrNow::Now => unix_secs(SystemTime::now()),
    }
}

fn reply_xattr(bytes: &[u8], size: u32, reply: ReplyXattr) {
    let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
    if size == 0 {
        reply.size(len);
    } else if len > size {
        reply.error(libc::ERANGE);
    } else {
        reply.data(bytes);
    }
}

impl<B: BlockDevice> ChainFuse<B> {
    pub(crate) fn op_access(&self, _req: &Request<'_>, ino: u64, _mask: i32, reply: ReplyEmpty) {
        match self.attr_for_inode(ino) {
            Ok(_) => reply.ok(),
            Err(code) => reply.error(code),
        }
    }

    pub(crate) fn op_getattr(
        &self,
        _req: &Request<'_>,
        ino: u64,
        _fh: Option<u64>,
        reply: ReplyAttr,
    ) {
        match self.attr_for_inode(ino) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(code) => reply.error(code),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn op_setattr(
        &self,
        _req: &Request<'_>,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let times = (atime.map(time_secs), mtime.map(time_secs));
        match self.apply_setattr(ino, size, times) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(code) => reply.error(code),
        }
    }

    pub(crate) fn op_getxattr(
        &self,
        _req: &Request<'_>,
        ino: u64,
        name: &OsStr,
        size: u32,
        reply: ReplyXattr,
    ) {
        let name = name.to_string_lossy();
        let value = self.with_fs(|fs| {
            let path = Self::path_for_inode(fs, ino)?;
            fs.getxattr(&path, &name)
        });
        match value {
            Ok(bytes) => reply_xattr(&bytes, size, reply),
            Err(code) => reply.error(code),
        }
    }

    pub(crate) fn op_listxattr(&self, _req: &Request<'_>, ino: u64, size: u32, reply: ReplyXattr) {
        match self.xattr_names(ino) {
            Ok(bytes) => reply_xattr(&bytes, size, reply),
            Err(code) => reply.error(code),
        }
    }

    pub(crate) fn op_statfs(&self, _req: &Request<'_>, _ino: u64, reply: ReplyStatfs) {
        match self.with_fs(|fs| fs.statfs()) {
            Ok(stats) => {
                let FsStats {
                    block_size,
                    total_blocks,
                    free_blocks,
                    files,
                    name_max,
                } = stats;
                let bsize = u32::try_from(block_size).unwrap_or(u32::MAX);
                reply.statfs(
                    total_blocks as u64,
                    free_blocks as u64,
                    free_blocks as u64,
                    (files + free_blocks) as u64,
                    free_blocks as u64,
                    bsize,
                    u32::try_from(name_max).unwrap_or(u32::MAX),
                    bsize,
                );
            }
            Err(code) => reply.error(code),
        }
    }

    fn attr_for_inode(&self, ino: u64) -> Result<FileAttr, i32> {
        self.with_fs(|fs| {
            let path = Self::path_for_inode(fs, ino)?;
            Self::attr_for_path(fs, &path)
        })
    }

    /// `apply_setattr` truncates and sets `(atime, mtime)`; a missing time keeps
    /// its current value.
    fn apply_setattr(
        &self,
        ino: u64,
        size: Option<u64>,
        times: (Option<u64>, Option<u64>),
    ) -> Result<FileAttr, i32> {
        self.with_fs(|fs| {
            let path = Self::path_for_inode(fs, ino)?;
            if let Some(size) = size {
                let length = usize::try_from(size).map_err(|_| FsError::FileTooLarge)?;
                fs.truncate(&path, length)?;
            }
            if times.0.is_some() || times.1.is_some() {
                let current = fs.getattr(&path)?;
                let atime = times.0.unwrap_or(current.st_atime);
                let mtime = times.1.unwrap_or(current.st_mtime);
                fs.utimens(&path, Some((atime, mtime)))?;
            }
            Self::attr_for_path(fs, &path)
        })
    }

    /// `xattr_names` is the NUL-separated name list `listxattr` expects.
    fn xattr_names(&self, ino: u64) -> Result<Vec<u8>, i32> {
        self.with_fs(|fs| {
            let path = Self::path_for_inode(fs, ino)?;
            let mut out = Vec::new();
            for name in fs.listxattr(&path)? {
                out.extend_from_slice(name.as_bytes());
                out.push(0);
            }
            Ok(out)
        })
    }
}
