// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckrunError {
    /// Bad invocation or an unresolvable test identifier. Raised before any
    /// test has started.
    #[error("configuration error: {0}")]
    Config(String),

    /// A marker-file write or removal failed. The no-residue guarantee
    /// cannot be silently waived, so this aborts the whole run.
    #[error("bookkeeping failure: {0}")]
    Bookkeeping(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CheckrunError>;
