use std::ffi::OsStr;

use chainfs::{BlockDevice, Operations};
use fuser::{FileAttr, ReplyCreate, ReplyEmpty, ReplyEntry, Request};

use crate::fs::constants::{OPEN_DIRECT_IO, TTL};

use super::types::ChainFuse;

impl<B: BlockDevice> ChainFuse<B> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn op_create(
        &self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        match self.create_file(parent, name, mode & !umask) {
            Ok((attr, handle)) => reply.created(&TTL, &attr, 0, handle, OPEN_DIRECT_IO),
            Err(code) => reply.error(code),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn op_mknod(
        &self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        umask: u32,
        _rdev: u32,
        reply: ReplyEntry,
    ) {
        if mode & libc::S_IFMT != 0 && mode & libc::S_IFMT != libc::S_IFREG {
            reply.error(libc::EPERM);
            return;
        }
        match self.create_file(parent, name, mode & !umask) {
            Ok((attr, _)) => reply.entry(&TTL, &attr, 0),
            Err(code) => reply.error(code),
        }
    }

    pub(crate) fn op_mkdir(
        &self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        umask: u32,
        reply: ReplyEntry,
    ) {
        match self.make_dir(parent, name, mode & !umask) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(code) => reply.error(code),
        }
    }

    pub(crate) fn op_unlink(
        &self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        reply: ReplyEmpty,
    ) {
        match self.remove_child(parent, name, false) {
            Ok(()) => reply.ok(),
            Err(code) => reply.error(code),
        }
    }

    pub(crate) fn op_rmdir(
        &self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        reply: ReplyEmpty,
    ) {
        match self.remove_child(parent, name, true) {
            Ok(()) => reply.ok(),
            Err(code) => reply.error(code),
        }
    }

    /// `create_file` creates `name` under `parent` and returns its attributes and handle.
    fn create_file(&self, parent: u64, name: &OsStr, mode: u32) -> Result<(FileAttr, u64), i32> {
        self.with_fs(|fs| {
            let path = Self::child_path(fs, parent, name)?;
            let handle = fs.create(&path, mode)?;
            Ok((Self::attr_for_path(fs, &path)?, handle))
        })
    }

    fn make_dir(&self, parent: u64, name: &OsStr, mode: u32) -> Result<FileAttr, i32> {
        self.with_fs(|fs| {
            let path = Self::child_path(fs, parent, name)?;
            fs.mkdir(&path, mode)?;
            Self::attr_for_path(fs, &path)
        })
    }

    fn remove_child(&self, parent: u64, name: &OsStr, dir: bool) -> Result<(), i32> {
        self.with_fs(|fs| {
            let path = Self::child_path(fs, parent, name)?;
            if dir { fs.rmdir(&path) } else { fs.unlink(&path) }
        })
    }
}
