use std::path::{Path, PathBuf};

use anyhow::Context;
use memmap2::{MmapMut, MmapOptions};

use crate::error::{FsError, FsResult};
use crate::layout::{BlockIndex, Geometry};

use super::{BlockDevice, block_span};

/// Disk image file mapped into memory, one block after another.
pub struct ImageDevice {
    path: PathBuf,
    map: MmapMut,
    geometry: Geometry,
    /// True if the image was just created (or was empty) and holds no filesystem yet.
    fresh: bool,
}

impl ImageDevice {
    /// # Errors
    /// Returns an error if the image cannot be created/opened or mapped, or an existing
    /// image has a size other than the one `geometry` describes.
    pub fn open(path: impl AsRef<Path>, geometry: Geometry) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let existed = path.exists();

        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("failed to open disk image {}", path.display()))?;

        let len = geometry.image_len();
        let prev_len = file.metadata().map(|m| m.len()).unwrap_or(0);
        if prev_len != 0 && prev_len != len {
            anyhow::bail!(
                "disk image {} is {prev_len} bytes, expected {len} for {geometry}",
                path.display()
            );
        }
        file.set_len(len)?;

        let map_len = usize::try_from(len)
            .map_err(|_| anyhow::anyhow!("image length {len} exceeds addressable size"))?;
        let map = unsafe { MmapOptions::new().len(map_len).map_mut(&file)? };

        Ok(Self {
            path,
            map,
            geometry,
            fresh: !existed || prev_len == 0,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        self.fresh
    }
}

impl BlockDevice for ImageDevice {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn read_block(&self, index: BlockIndex) -> FsResult<Vec<u8>> {
        let span = block_span(&self.geometry, index, self.geometry.block_size())?;
        Ok(self.map[span].to_vec())
    }

    fn write_block(&mut self, index: BlockIndex, data: &[u8]) -> FsResult<()> {
        let span = block_span(&self.geometry, index, data.len())?;
        // No flush per write; the page cache keeps the image coherent for other readers
        // and `sync` pushes it to storage.
        self.map[span].copy_from_slice(data);
        self.fresh = false;
        Ok(())
    }

    fn sync(&mut self) -> FsResult<()> {
        self.map.flush().map_err(|err| {
            tracing::error!("image: flush of {} failed: {err}", self.path.display());
            FsError::Io
        })
    }
}
