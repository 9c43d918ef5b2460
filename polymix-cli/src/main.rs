//! # Polymix
//!
//! Command line front end for the polymix channel mixer: play files through
//! the default output device or render a mix offline.

use log::error;

mod cli;
mod controls;
mod convert;
mod loader;
mod logging;
mod runner;
mod ui;

fn main() {
    let log_buffer = logging::init();
    let args = cli::args::build_cli().get_matches();

    let code = match runner::run(&args, log_buffer) {
        Ok(code) => code,
        Err(err) => {
            let message = format!("{:#}", err).to_lowercase();
            error!("{}", message);
            eprintln!("error: {}", message);
            -1
        }
    };

    std::process::exit(code)
}
