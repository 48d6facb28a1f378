use clap::Parser;

use secrets_env::cli::Cli;
use secrets_env::commands;

fn main() {
    let cli = Cli::parse();

    match commands::run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
