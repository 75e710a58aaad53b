use chainfs::{BlockDevice, FsError, Operations};
use fuser::{ReplyData, ReplyOpen, ReplyWrite, Request};

use crate::fs::constants::OPEN_DIRECT_IO;

use super::types::ChainFuse;

fn offset_of(offset: i64) -> Result<usize, FsError> {
    usize::try_from(offset).map_err(|_| FsError::InvalidArgument)
}

impl<B: BlockDevice> ChainFuse<B> {
    pub(crate) fn op_open(&self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        match self.with_fs(|fs| Self::path_for_inode(fs, ino)) {
            Ok(_) => reply.opened(0, OPEN_DIRECT_IO),
            Err(code) => reply.error(code),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn op_read(
        &self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        match self.read_bytes(ino, offset, size) {
            Ok(data) => reply.data(&data),
            Err(code) => reply.error(code),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn op_write(
        &self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        match self.write_bytes(ino, offset, data) {
            Ok(written) => reply.written(written),
            Err(code) => reply.error(code),
        }
    }

    fn read_bytes(&self, ino: u64, offset: i64, size: u32) -> Result<Vec<u8>, i32> {
        self.with_fs(|fs| {
            let path = Self::path_for_inode(fs, ino)?;
            let size = usize::try_from(size).map_err(|_| FsError::InvalidArgument)?;
            fs.read(&path, size, offset_of(offset)?)
        })
    }

    fn write_bytes(&self, ino: u64, offset: i64, data: &[u8]) -> Result<u32, i32> {
        self.with_fs(|fs| {
            let path = Self::path_for_inode(fs, ino)?;
            let written = fs.write(&path, data, offset_of(offset)?)?;
            u32::try_from(written).map_err(|_| FsError::FileTooLarge)
        })
    }
}
