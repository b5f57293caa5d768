//! Shell completion scripts for the `plagscan` binary.

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{Shell, generate, generate_to};
use std::{fs, io, path::PathBuf};
use tracing::info;

use crate::cli::{AppContext, Cli, CompletionsArgs};

const BIN_NAME: &str = "plagscan";

pub fn run(
    args: CompletionsArgs,
    ctx: &AppContext,
) -> Result<()>
{
    match args.out_dir
    {
        None =>
        {
            write_script(args.shell, &mut io::stdout());
            Ok(())
        }
        Some(dir) =>
        {
            let path = write_script_to(args.shell, dir)?;
            info!(path = %path.display(), shell = %args.shell, "completion written");

            if !ctx.quiet
            {
                eprintln!("Wrote completion to {}", path.display());
            }
            Ok(())
        }
    }
}

/// Render the completion script for `shell` into `out`.
pub fn write_script(
    shell: Shell,
    out: &mut dyn io::Write,
)
{
    generate(shell, &mut Cli::command(), BIN_NAME, out);
}

/// Write the completion script into `dir`, returning the file path.
pub fn write_script_to(
    shell: Shell,
    dir: PathBuf,
) -> Result<PathBuf>
{
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    generate_to(shell, &mut Cli::command(), BIN_NAME, &dir)
        .with_context(|| format!("Failed to write {shell} completion"))
}
