use std::io;

use clap::Parser;
use eyre::Result;
use tracing_subscriber::{prelude::*, EnvFilter};

use newbp_loader::cli::{execute, Cli, Command};
use newbp_loader::{default_library_path, NativeProver};

fn main() -> Result<()> {
    let log_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_file(false)
                .with_line_number(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_writer(io::stderr)
                .with_filter(log_filter),
        )
        .init();

    let cli = Cli::parse();
    let path = cli.lib.unwrap_or_else(default_library_path);
    let prover = NativeProver::load(&path)?;
    if cli.native_logs {
        prover.init_native_logging();
    }

    let command = cli
        .command
        .unwrap_or_else(|| Command::Prove(Default::default()));
    execute(&prover, command, &mut io::stdout().lock())
}
