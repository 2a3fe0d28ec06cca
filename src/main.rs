use batchren::cli::{Cli, run_cli};
use batchren::output::OutputFormatter;
use clap::Parser;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run_cli(cli) {
        OutputFormatter::error(&e);
        std::process::exit(1);
    }
}
