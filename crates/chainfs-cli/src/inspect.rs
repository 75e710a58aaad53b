use std::fmt::Write as _;

use anyhow::{Context, Result, bail};
use chainfs::{BlockDevice, BlockIndex, ChainFs, ImageDevice};

use crate::cli::InspectArgs;

const HEX_ROW: usize = 16;

pub(crate) fn run_inspect(args: &InspectArgs) -> Result<String> {
    let geometry = args.disk.geometry()?;
    let image = &args.disk.image;
    if !image.exists() {
        bail!("disk image {} does not exist", image.display());
    }
    let len = std::fs::metadata(image)
        .with_context(|| format!("failed to stat disk image {}", image.display()))?
        .len();
    if len == 0 {
        bail!("disk image {} is empty", image.display());
    }
    let dev = ImageDevice::open(image, geometry)?;
    let fs = ChainFs::open(dev)
        .with_context(|| format!("{} does not hold a chainfs filesystem", image.display()))?;
    render(&fs, args.raw)
}

/// `render` formats a human-readable report of the filesystem's lists.
pub(crate) fn render<B: BlockDevice>(fs: &ChainFs<B>, raw: bool) -> Result<String> {
    let mut out = String::new();
    let geometry = fs.geometry();
    let sb = fs.superblock();
    let link = |l: Option<BlockIndex>| l.map_or_else(|| "-".to_string(), |b| b.to_string());

    writeln!(out, "geometry:   {geometry}")?;
    writeln!(
        out,
        "superblock: first_file={} free_head={} handle={}",
        link(sb.first_file),
        link(sb.free_head),
        sb.handle
    )?;

    writeln!(out, "files:")?;
    writeln!(
        out,
        "  {:>5}  {:>7}  {:>5}  {:>6}  {:<16}  chain",
        "block", "mode", "nlink", "size", "path"
    )?;
    for entry in fs.entries().context("file list is corrupt")? {
        let chain = fs
            .data_chain(entry.block)
            .with_context(|| format!("chain of {} is corrupt", entry.path))?;
        let chain = chain.iter().map(ToString::to_string).collect::<Vec<_>>();
        writeln!(
            out,
            "  {:>5}  {:>7o}  {:>5}  {:>6}  {:<16}  [{}]",
            entry.block,
            entry.attr.st_mode,
            entry.attr.st_nlink,
            entry.attr.st_size,
            entry.path,
            chain.join(" ")
        )?;
    }

    let free = fs.free_blocks().context("free list is corrupt")?;
    let free = free.iter().map(ToString::to_string).collect::<Vec<_>>();
    writeln!(out, "free:       [{}]", free.join(" "))?;

    match fs.verify() {
        Ok(usage) => writeln!(
            out,
            "usage:      {} metadata, {} data, {} free",
            usage.metadata_blocks, usage.data_blocks, usage.free_blocks
        )?,
        Err(err) => writeln!(out, "usage:      inconsistent ({err})")?,
    }

    if raw {
        writeln!(out, "blocks:")?;
        for i in 0..geometry.num_blocks() {
            let bytes = fs.device().read_block(BlockIndex::new(i))?;
            for (row, chunk) in bytes.chunks(HEX_ROW).enumerate() {
                let hex = chunk
                    .iter()
                    .map(|b| format!("{b:02x}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                if row == 0 {
                    writeln!(out, "  {i:>3}: {hex}")?;
                } else {
                    writeln!(out, "       {hex}")?;
                }
            }
        }
    }
    Ok(out)
}
