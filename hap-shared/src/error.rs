#![allow(dead_code)]

use std::io;
use std::net;
use std::string::FromUtf8Error;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    //TLV8 errors
    /// An item header or value runs past the end of the buffer.
    #[error(
        "tlv8: item at offset {offset} needs {expected} bytes but only {actual} remain"
    )]
    ErrMalformedTlv {
        offset: usize,
        expected: usize,
        actual: usize,
    },
    /// A mandatory item is absent from an otherwise well-formed message.
    #[error("tlv8: missing required field {name} (type {typ:#04x})")]
    ErrMissingRequiredField { name: &'static str, typ: u8 },
    /// A single-valued item occurs more than once at one nesting level.
    #[error("tlv8: field type {typ:#04x} occurs {count} times, expected one")]
    ErrDuplicateField { typ: u8, count: usize },
    /// A fixed-width field carries the wrong number of bytes.
    #[error("tlv8: field {name} must be {expected} bytes long, got {actual}")]
    ErrInvalidFieldLength {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid value {value} for field {name}")]
    ErrInvalidFieldValue { name: &'static str, value: String },

    //Stream management errors
    /// The session id is not present in the session store.
    #[error("unknown session {0}")]
    ErrUnknownSession(String),
    #[error("unsupported selected stream request kind {0}")]
    ErrUnsupportedRequestKind(u8),
    #[error("unsupported capability: {0}")]
    ErrUnsupportedCapability(String),
    /// Spawning or killing the media sender process failed.
    #[error("stream process failure: {0}")]
    ErrStreamProcessFailure(String),
    #[error("all streaming slots are in use")]
    ErrStreamingBusy,
    #[error("no snapshot provider configured")]
    ErrNoSnapshotProvider,
    #[error("stream management closed")]
    ErrClosed,

    #[error("base64: {0}")]
    Base64(String),
    #[error("parse ip: {0}")]
    ParseIp(#[from] net::AddrParseError),
    #[error("utf8: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("{0}")]
    Io(#[source] IoError),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
#[error("io error: {0}")]
pub struct IoError(#[from] pub io::Error);

// Workaround for wanting PartialEq for io::Error.
impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(IoError(e))
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Error::Other(e.to_string())
    }
}

/// flatten_errs flattens multiple errors into one
pub fn flatten_errs(errs: Vec<impl Into<Error>>) -> Result<()> {
    if errs.is_empty() {
        Ok(())
    } else {
        let errs_strs: Vec<String> = errs.into_iter().map(|e| e.into().to_string()).collect();
        Err(Error::Other(errs_strs.join("\n")))
    }
}
