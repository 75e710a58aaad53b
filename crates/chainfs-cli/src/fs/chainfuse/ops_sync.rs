use chainfs::BlockDevice;
use fuser::{ReplyEmpty, Request};
use tracing::{error, info};

use super::types::ChainFuse;

impl<B: BlockDevice> ChainFuse<B> {
    pub(crate) fn op_destroy(&mut self) {
        match self.with_fs(|fs| fs.sync()) {
            Ok(()) => info!("chainfs: image synced on unmount"),
            Err(code) => error!("chainfs: sync on unmount failed (errno {code})"),
        }
    }

    pub(crate) fn op_flush(
        &self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        _lock_owner: u64,
        reply: ReplyEmpty,
    ) {
        match self.check_inode(ino) {
            Ok(()) => reply.ok(),
            Err(code) => reply.error(code),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn op_release(
        &self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        match self.check_inode(ino) {
            Ok(()) => reply.ok(),
            Err(code) => reply.error(code),
        }
    }

    pub(crate) fn op_fsync(
        &self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        _datasync: bool,
        reply: ReplyEmpty,
    ) {
        match self.sync_inode(ino) {
            Ok(()) => reply.ok(),
            Err(code) => reply.error(code),
        }
    }

    fn check_inode(&self, ino: u64) -> Result<(), i32> {
        self.with_fs(|fs| Self::path_for_inode(fs, ino).map(drop))
    }

    fn sync_inode(&self, ino: u64) -> Result<(), i32> {
        self.with_fs(|fs| {
            Self::path_for_inode(fs, ino)?;
            fs.sync()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::constants::ROOT_ID;
    use crate::fs::test_utils::create_test_fs;

    #[test]
    fn check_inode_accepts_live_entries_only() {
        let fs = create_test_fs();
        fs.check_inode(ROOT_ID).expect("root");
        assert_eq!(fs.check_inode(4).expect_err("free"), libc::ENOENT);
    }

    #[test]
    fn sync_inode_flushes_device() {
        let fs = create_test_fs();
        fs.sync_inode(ROOT_ID).expect("sync");
        assert_eq!(fs.sync_inode(99).expect_err("range"), libc::ENOENT);
    }

    #[test]
    fn destroy_leaves_state_usable() {
        let mut fs = create_test_fs();
        fs.op_destroy();
        let state = fs.state.lock().expect("lock state");
        assert_eq!(state.free_blocks().expect("free").len(), 15);
    }
}
