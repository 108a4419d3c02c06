// src/config/mod.rs

//! Descriptor file loading and invocation resolution.
//!
//! - [`model`] defines the raw and validated forms of `Checkrun.toml`.
//! - [`loader`] reads the descriptor and folds CLI arguments, environment
//!   variables and descriptor contents into one [`loader::Invocation`].

pub mod loader;
pub mod model;

pub use loader::{Invocation, resolve_invocation};
pub use model::{Checkfile, RawCheckfile};
