//! Command-line front-end: argument definitions and the command runner.
//!
//! Everything here is a thin collaborator over [`crate::pipeline`]: path
//! checks, stream opening, success messages, and cleanup of a partially
//! written destination when anything fails.

use std::fs::{self, File};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::pipeline::{self, DEFAULT_BLOCK_SIZE};
use crate::BlockzipError;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Action to perform on the source file.
    #[arg(value_enum)]
    pub action: Action,

    /// Path of the file to read.
    pub source: PathBuf,

    /// Path of the file to create. Must not exist yet.
    pub destination: PathBuf,

    /// Print debug information, including the full error chain on failure.
    #[arg(short, long)]
    pub debug: bool,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Compress the source file into a blockzip archive.
    Compress,
    /// Decompress a blockzip archive back into the original bytes.
    Decompress,
}

/// Parses command-line arguments using `clap`.
pub fn run() -> Args {
    Args::parse()
}

/// Executes one parsed command.
///
/// Validates both paths, opens the streams, runs the pipeline, and removes
/// the destination file again if anything fails along the way.
pub fn execute(args: &Args) -> Result<(), BlockzipError> {
    if !args.source.exists() {
        return Err(BlockzipError::User("source file doesn't exist".into()));
    }
    if args.destination.exists() {
        return Err(BlockzipError::User(
            "destination file already exists".into(),
        ));
    }

    let source = File::open(&args.source)
        .map_err(|e| BlockzipError::User(format!("source file can't be opened: {e}")))?;
    let destination = File::create(&args.destination)
        .map_err(|e| BlockzipError::User(format!("destination file can't be created: {e}")))?;

    let destination_path = args.destination.clone();
    let cleanup = scopeguard::guard((), move |_| {
        let _ = fs::remove_file(&destination_path);
    });

    match args.action {
        Action::Compress => pipeline::compress(source, destination, DEFAULT_BLOCK_SIZE)?,
        Action::Decompress => pipeline::decompress(source, destination)?,
    }

    // Success: keep the destination.
    scopeguard::ScopeGuard::into_inner(cleanup);

    match args.action {
        Action::Compress => println!("Archive created: {}", args.destination.display()),
        Action::Decompress => println!("File decompressed: {}", args.destination.display()),
    }
    Ok(())
}
