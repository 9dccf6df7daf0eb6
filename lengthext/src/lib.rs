//! Merkle-Damgard length-extension toolbox.
//!
//! Given `SHA-1(secret || message)` and a guess for `|secret || message|`, computes the digest of
//! `secret || message || padding || suffix` without knowing the secret, for every guess in a range.

pub mod digest;
pub mod encode;
pub mod error;
pub mod extend;
pub mod padding;

pub use error::{Error, Result};
pub use extend::{
    enumerate, extend, par_enumerate, validate_range, Candidates, ExtensionResult, LengthExtender,
};
pub use padding::PaddingSpec;
