// Copyright (c) 2022, Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Collection of errors to be used in time-sign.
//!
//! Every condition that stops a run is a variant of [TimeSignError]. Nothing in the pipeline
//! retries: an error either aborts the run during setup or ends the signing loop at the current
//! block boundary, leaving the output already written in place.

use std::path::PathBuf;
use thiserror::Error;

pub type TimeSignResult<T> = Result<T, TimeSignError>;

/// Collection of errors to be used in time-sign.
#[derive(Debug, Error)]
pub enum TimeSignError {
    /// The 16-bit probe pattern was laid out in memory in neither known byte order.
    #[error("Could not determine native endianness, probe bytes were {0:02x?}")]
    UnknownEndianness([u8; 2]),

    /// Block size must be a positive number of bytes.
    #[error("Block size must be positive, got {0}")]
    InvalidBlockSize(usize),

    /// The requested clock source cannot be read on this architecture.
    #[error("Clock source {0} is not available on this architecture")]
    UnsupportedClock(&'static str),

    /// A file could not be opened or created.
    #[error("Can't open {role} file {path}: {source}")]
    Open {
        role: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key file has no valid PEM armor.
    #[error("Malformed PEM in key file: {0}")]
    Pem(String),

    /// The PEM block does not carry a private key.
    #[error("Expected a PEM block labelled PRIVATE KEY, found {0}")]
    PemLabel(String),

    /// The PEM payload is not a PKCS8 private key structure.
    #[error("Can't parse PKCS8 private key: {0}")]
    Pkcs8(String),

    /// The private key is not an elliptic curve key.
    #[error("Private key is not an elliptic curve key (algorithm {0})")]
    NotEcKey(String),

    /// The private key is an elliptic curve key on a curve we cannot sign with.
    #[error("Unsupported elliptic curve {0}")]
    UnsupportedCurve(String),

    /// The final block of the input is shorter than the block size.
    #[error("read less data than expected (truncated file?): read {actual} bytes instead of {expected}")]
    Truncated { expected: usize, actual: usize },

    /// The buffer for one block could not be allocated.
    #[error("Can't allocate a block of {size} bytes: {source}")]
    BlockAllocation {
        size: usize,
        #[source]
        source: std::collections::TryReserveError,
    },

    /// Reading the input failed before end of file.
    #[error("Read error on input after {blocks} blocks: {source}")]
    Read {
        blocks: u64,
        #[source]
        source: std::io::Error,
    },

    /// Writing a signature or timing sample failed.
    #[error("Write error on {stream} after {blocks} blocks: {source}")]
    Write {
        stream: &'static str,
        blocks: u64,
        #[source]
        source: std::io::Error,
    },

    /// The signing primitive failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// A signature stream does not parse as consecutive DER sequences.
    #[error("Malformed DER signature at offset {0}")]
    SignatureStream(usize),
}

impl From<signature::Error> for TimeSignError {
    fn from(e: signature::Error) -> Self {
        TimeSignError::Signing(e.to_string())
    }
}

impl TimeSignError {
    /// Whether this error was raised before the first block was signed.
    pub fn is_setup_error(&self) -> bool {
        !matches!(
            self,
            TimeSignError::Truncated { .. }
                | TimeSignError::Read { .. }
                | TimeSignError::Write { .. }
                | TimeSignError::Signing(_)
                | TimeSignError::SignatureStream(_)
        )
    }
}
