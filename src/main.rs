use clap::Parser;
use sabia::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    sabia::log::init_logging(cli.verbose);
    run(cli)
}
