// Copyright (c) 2022, Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use time_sign::clock::ClockSource;
use time_sign::{RunConfig, RunSummary, TimeSignError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit status for missing arguments and truncated input.
const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "time-sign", version)]
#[command(about = "Sign fixed-size blocks of a file with an EC private key and record how long each signature took", long_about = None)]
struct Arguments {
    /// File with data to sign.
    #[clap(short = 'i', value_name = "FILE")]
    input: PathBuf,

    /// File to write the signatures to.
    #[clap(short = 'o', value_name = "FILE")]
    signatures: PathBuf,

    /// File to write the time to sign each block to.
    #[clap(short = 't', value_name = "FILE")]
    timings: PathBuf,

    /// File with the private key in PEM format (PKCS8).
    #[clap(short = 'k', value_name = "FILE")]
    key: PathBuf,

    /// Size of each block of data to sign, in bytes.
    #[clap(short = 's', value_name = "BYTES")]
    block_size: usize,

    /// Timestamp source: monotonic, wall-subsec or cycles.
    #[clap(long, default_value_t = ClockSource::Monotonic)]
    clock: ClockSource,
}

impl From<Arguments> for RunConfig {
    fn from(args: Arguments) -> Self {
        RunConfig {
            input: args.input,
            signatures: args.signatures,
            timings: args.timings,
            key: args.key,
            block_size: args.block_size,
            clock: args.clock,
        }
    }
}

fn main() {
    let args = match Arguments::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(EXIT_FAILURE);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    info!("Starting time-sign {}", env!("CARGO_PKG_VERSION"));

    match execute(args.into()) {
        Ok(_) => {
            std::process::exit(exitcode::OK);
        }
        Err(e) => {
            if e.is_setup_error() {
                error!("Setup failed, no block was signed");
            }
            eprintln!("Error: {}", e);
            std::process::exit(exit_code(&e));
        }
    }
}

fn execute(config: RunConfig) -> Result<RunSummary, TimeSignError> {
    let summary = time_sign::run(&config)?;
    info!(
        "Timing samples are {} in {} byte order",
        match summary.clock {
            ClockSource::Cycles => "CPU ticks",
            _ => "nanoseconds",
        },
        summary.byte_order
    );
    Ok(summary)
}

fn exit_code(e: &TimeSignError) -> exitcode::ExitCode {
    match e {
        TimeSignError::Truncated { .. } => EXIT_FAILURE,
        TimeSignError::InvalidBlockSize(_)
        | TimeSignError::BlockAllocation { .. }
        | TimeSignError::Pem(_)
        | TimeSignError::PemLabel(_)
        | TimeSignError::Pkcs8(_)
        | TimeSignError::NotEcKey(_)
        | TimeSignError::UnsupportedCurve(_) => exitcode::DATAERR,
        TimeSignError::Open { .. } | TimeSignError::Read { .. } | TimeSignError::Write { .. } => {
            exitcode::IOERR
        }
        TimeSignError::UnsupportedClock(_) => exitcode::CONFIG,
        TimeSignError::UnknownEndianness(_)
        | TimeSignError::Signing(_)
        | TimeSignError::SignatureStream(_) => exitcode::SOFTWARE,
    }
}
