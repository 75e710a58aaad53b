mod cli;
mod format;
mod fs;
mod inspect;
mod mount;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Format(disk) => format::run_format(&disk),
        Command::Mount(args) => mount::run_mount(&args),
        Command::Inspect(args) => {
            let report = inspect::run_inspect(&args)?;
            print!("{report}");
            Ok(())
        }
    }
}
