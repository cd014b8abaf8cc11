//! Credential models: redacted secrets and the access/refresh token pair.

pub mod token;

pub use token::{pair::*, secret::*};
