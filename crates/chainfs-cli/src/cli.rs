use std::path::PathBuf;

use anyhow::Context;
use chainfs::Geometry;
use chainfs::layout::{DEFAULT_BLOCK_SIZE, DEFAULT_NUM_BLOCKS};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chainfs", author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write an empty filesystem to the image, creating it if needed.
    Format(DiskArgs),

    /// Serve the image over FUSE until unmounted.
    Mount(MountArgs),

    /// Print the superblock, file list and free list of an image.
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DiskArgs {
    #[arg(long, env = "CHAINFS_IMAGE")]
    pub image: PathBuf,

    #[arg(long, env = "CHAINFS_BLOCK_SIZE", default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: usize,

    #[arg(long, env = "CHAINFS_NUM_BLOCKS", default_value_t = DEFAULT_NUM_BLOCKS)]
    pub blocks: usize,
}

impl DiskArgs {
    /// # Errors
    /// Returns an error if the block size or count is out of range.
    pub fn geometry(&self) -> anyhow::Result<Geometry> {
        Geometry::new(self.block_size, self.blocks).with_context(|| {
            format!(
                "unsupported geometry: {} blocks of {} bytes",
                self.blocks, self.block_size
            )
        })
    }
}

#[derive(Args)]
pub struct MountArgs {
    #[arg(long)]
    pub mount_point: PathBuf,

    /// Reformat the image even if it already holds a filesystem.
    #[arg(long)]
    pub format: bool,

    #[command(flatten)]
    pub disk: DiskArgs,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Also hex dump every block.
    #[arg(long)]
    pub raw: bool,

    #[command(flatten)]
    pub disk: DiskArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_defaults_to_small_disk() {
        let cli = Cli::try_parse_from([
            "chainfs",
            "mount",
            "--mount-point",
            "/mnt/chain",
            "--image",
            "disk.img",
        ])
        .expect("parse");
        let Command::Mount(args) = cli.command else {
            panic!("expected mount");
        };
        assert!(!args.format);
        assert_eq!(args.disk.block_size, 64);
        assert_eq!(args.disk.blocks, 16);
        assert_eq!(args.disk.image, PathBuf::from("disk.img"));
    }

    #[test]
    fn geometry_is_validated() {
        let cli = Cli::try_parse_from([
            "chainfs", "format", "--image", "d.img", "--blocks", "300",
        ])
        .expect("parse");
        let Command::Format(disk) = cli.command else {
            panic!("expected format");
        };
        let err = disk.geometry().expect_err("too many blocks");
        assert!(err.to_string().contains("300 blocks"));
    }

    #[test]
    fn inspect_takes_raw_flag() {
        let cli = Cli::try_parse_from([
            "chainfs",
            "inspect",
            "--image",
            "d.img",
            "--raw",
            "--block-size",
            "128",
        ])
        .expect("parse");
        let Command::Inspect(args) = cli.command else {
            panic!("expected inspect");
        };
        assert!(args.raw);
        assert_eq!(args.disk.geometry().expect("geometry").block_size(), 128);
    }
}
