use anyhow::Result;
use clap::Parser;
use plagscan::cli::{AppContext, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
    };

    plagscan::infra::logging::init(ctx.quiet);

    match cli.command {
        Commands::Check(args) => plagscan::check_run(args, &ctx),
        Commands::Init(args) => plagscan::infra::config::init(args, &ctx),
        Commands::Completions(args) => plagscan::completion::run(args, &ctx),
    }
}
