//! Typed commands and the wire argument mapping.
//!
//! Commands travel on the wire as a name plus an ordered list of
//! loosely-typed arguments. [`Command::from_args`] and
//! [`Command::to_args`] convert between that representation and the typed
//! variants, validating argument count and per-position type; status
//! notifications carry a nested [`StatusInfo`] object.

mod message;
mod status;

pub use message::Command;
pub use status::{StatusCode, StatusInfo, StatusLevel};
