use anyhow::Result;
use clap::Parser;
use colored::*;
use sitegrade::cli::Cli;
use sitegrade::{execute, resolve_args};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "sitegrade=debug"
    } else {
        "sitegrade=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let result = match resolve_args(Cli::parse()) {
        Ok(args) => {
            init_tracing(args.verbose);
            execute(args).await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
