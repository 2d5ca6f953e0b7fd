//! `era5cfg` — ERA5 workflow configuration loader and validator

use clap::Parser;

use era5cfg::cli::{Cli, dispatch};
use era5cfg::error::ExitCode;
use era5cfg::observability::{LogSettings, init_logging};

fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(&LogSettings::from(&cli));
    }

    match dispatch(cli) {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
