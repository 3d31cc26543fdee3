use std::process;

use clap::error::ErrorKind;
use clap::Parser;

mod cli;
mod commands;

fn main() {
    tracing_subscriber::fmt::init();
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if err.kind() == ErrorKind::DisplayHelp {
                let _ = err.print();
                process::exit(cli::HELP_EXIT_CODE);
            }
            err.exit();
        }
    };
    process::exit(commands::run(cli));
}
