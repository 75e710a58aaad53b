use anyhow::{Context, Result};
use chainfs::{ChainFs, ImageDevice};
use fuser::MountOption;
use tracing::info;

use crate::cli::MountArgs;
use crate::fs::ChainFuse;

/// `open_image` loads the filesystem in the image, formatting it first when the
/// image is new or `force_format` is set.
pub(crate) fn open_image(args: &MountArgs) -> Result<ChainFs<ImageDevice>> {
    let geometry = args.disk.geometry()?;
    let image = &args.disk.image;
    let dev = ImageDevice::open(image, geometry)?;

    if dev.is_fresh() || args.format {
        info!("mount: formatting {} ({geometry})", image.display());
        ChainFs::format(dev).with_context(|| format!("failed to format {}", image.display()))
    } else {
        ChainFs::open(dev)
            .with_context(|| format!("{} does not hold a chainfs filesystem", image.display()))
    }
}

pub(crate) fn run_mount(args: &MountArgs) -> Result<()> {
    std::fs::create_dir_all(&args.mount_point).with_context(|| {
        format!(
            "failed to create mount point {}",
            args.mount_point.display()
        )
    })?;
    let fs = open_image(args)?;
    info!(
        "mount: serving {} at {}",
        args.disk.image.display(),
        args.mount_point.display()
    );

    let options = vec![
        MountOption::RW,
        MountOption::FSName("chainfs".into()),
        MountOption::DefaultPermissions,
    ];
    fuser::mount2(ChainFuse::new(fs), &args.mount_point, &options).with_context(|| {
        format!(
            "failed to mount filesystem at {}",
            args.mount_point.display()
        )
    })
}
