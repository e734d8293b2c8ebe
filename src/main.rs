use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use fashion_nn::cli::{Cli, Command};
use fashion_nn::walkthrough::{self, Verbosity};
use fashion_nn::{viewer, Result};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "fashion_nn=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.into_command()? {
        Command::Serve(config) => viewer::serve(config.log_dir, &config.viewer_addr)?,
        Command::Train(config) => {
            walkthrough::run(&config, Verbosity::Interactive)?;
            println!(
                "Summaries written to {}; browse them with `fashion-nn serve --log-dir {}`",
                config.log_dir.display(),
                config.log_dir.display()
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
