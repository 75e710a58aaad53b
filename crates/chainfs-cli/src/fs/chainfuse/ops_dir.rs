use std::ffi::OsStr;

use chainfs::fs::path::parent_of;
use chainfs::{BlockDevice, FsError};
use fuser::{FileAttr, FileType, ReplyDirectory, ReplyEntry, Request};

use crate::fs::constants::TTL;

use super::types::ChainFuse;

impl<B: BlockDevice> ChainFuse<B> {
    pub(crate) fn op_lookup(
        &self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        reply: ReplyEntry,
    ) {
        match self.lookup_child(parent, name) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(code) => reply.error(code),
        }
    }

    pub(crate) fn op_readdir(
        &self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let entries = match self.list_dir_entries(ino) {
            Ok(entries) => entries,
            Err(code) => {
                reply.error(code);
                return;
            }
        };

        let start = usize::try_from(offset).unwrap_or(0);
        for (i, (entry_ino, kind, name)) in entries.into_iter().enumerate().skip(start) {
            let next = i64::try_from(i + 1).unwrap_or(i64::MAX);
            if reply.add(entry_ino, next, kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn lookup_child(&self, parent: u64, name: &OsStr) -> Result<FileAttr, i32> {
        self.with_fs(|fs| {
            let path = Self::child_path(fs, parent, name)?;
            Self::attr_for_path(fs, &path)
        })
    }

    /// `list_dir_entries` returns `.`, `..` and then the children of `ino` in
    /// file list order.
    fn list_dir_entries(&self, ino: u64) -> Result<Vec<(u64, FileType, String)>, i32> {
        self.with_fs(|fs| {
            let path = Self::path_for_inode(fs, ino)?;
            let (_, attr) = fs.resolve(&path)?;
            if !attr.is_dir() {
                return Err(FsError::NotDir);
            }
            let parent = fs.lookup(parent_of(&path))?.cur;

            let mut entries = vec![
                (ino, FileType::Directory, ".".to_string()),
                (Self::inode_for(parent), FileType::Directory, "..".to_string()),
            ];
            for child in fs.list_children(&path)? {
                let kind = if child.attr.is_dir() {
                    FileType::Directory
                } else {
                    FileType::RegularFile
                };
                entries.push((Self::inode_for(child.block), kind, child.name().to_string()));
            }
            Ok(entries)
        })
    }
}
