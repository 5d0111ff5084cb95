//! Main entry point for the blockzip CLI app

use std::process::ExitCode;

use blockzip::cli::{self, Action, Args};
use blockzip::BlockzipError;

fn main() -> ExitCode {
    let args = cli::run();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.debug { "debug" } else { "warn" }),
    )
    .init();

    match cli::execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&args, &e);
            ExitCode::FAILURE
        }
    }
}

fn report_error(args: &Args, e: &BlockzipError) {
    if e.is_user_error() {
        eprintln!("Error: {e}");
        return;
    }

    if args.debug {
        eprintln!("Unexpected error: {e}");
        eprintln!("{e:?}");
    } else {
        match args.action {
            Action::Compress => eprintln!("Unexpected error occurred. {e}"),
            Action::Decompress => {
                eprintln!("Unexpected error occurred. The destination file may be corrupted. {e}")
            }
        }
    }
}
