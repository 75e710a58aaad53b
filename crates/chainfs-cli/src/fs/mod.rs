//! FUSE front end for a chainfs image.

pub mod chainfuse;
pub mod constants;

pub use chainfuse::ChainFuse;

#[cfg(test)]
pub(crate) mod test_utils {
    use chainfs::{ChainFs, Geometry, MemDevice, Owner};

    use super::chainfuse::ChainFuse;

    /// `TestFs` is the FUSE wrapper type used by tests.
    pub type TestFs = ChainFuse<MemDevice>;

    /// `create_test_fs` builds a freshly formatted 16 x 64 byte filesystem.
    pub fn create_test_fs() -> TestFs {
        let geometry = Geometry::new(64, 16).expect("geometry");
        let fs = ChainFs::format(MemDevice::new(geometry))
            .expect("format")
            .with_owner(Owner {
                uid: 1000,
                gid: 1000,
            });
        ChainFuse::new(fs)
    }
}
