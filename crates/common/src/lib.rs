//! Shared types for the UP42 authentication workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
