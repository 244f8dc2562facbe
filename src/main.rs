use anyhow::{Context, Result};
use clap::Parser;
use dir_squeeze::batch::run;
use dir_squeeze::cli::{normalize_args, Args};
use dir_squeeze::logger::{set_verbosity, Verbosity};
use dir_squeeze::{error, info, verbose};

fn main() {
    let args = Args::parse_from(normalize_args(std::env::args_os()));
    set_verbosity(Verbosity::from_flags(args.quiet, args.verbose));

    if let Err(e) = execute(args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn execute(args: Args) -> Result<()> {
    verbose!("Arguments: {:?}", args);
    info!("dir-squeeze {}", env!("CARGO_PKG_VERSION"));

    let show_progress = !args.quiet;
    let (config, choice) = args.into_config().context("Invalid arguments")?;
    let backend = choice
        .build(show_progress)
        .context("Failed to set up the optimization backend")?;

    run(&config, &backend).with_context(|| {
        format!(
            "Cannot mirror {} into {}",
            config.source, config.destination
        )
    })?;

    Ok(())
}
