use anyhow::{Context, Result};
use chainfs::{ChainFs, ImageDevice};
use tracing::info;

use crate::cli::DiskArgs;

pub(crate) fn run_format(disk: &DiskArgs) -> Result<()> {
    let geometry = disk.geometry()?;
    let dev = ImageDevice::open(&disk.image, geometry)?;
    let mut fs = ChainFs::format(dev)
        .with_context(|| format!("failed to format {}", disk.image.display()))?;
    fs.sync().context("failed to flush image")?;
    info!("format: wrote empty filesystem to {}", disk.image.display());
    Ok(())
}
