//! Wire-value types and collaborator seams.
//!
//! This module holds what the session core shares with its two consumed
//! collaborators: the chunk framing codec ([`FrameIo`]) and the AMF
//! argument codec ([`AmfCodec`]). Neither is implemented here; the session
//! core only defines the contracts it drives them through.

mod amf;
mod frame;
mod value;

pub use amf::{AmfCodec, EncodingType};
pub use frame::{Frame, FrameIo, Message};
pub use value::Value;
