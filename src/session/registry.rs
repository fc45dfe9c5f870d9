//! Stream registry.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tokio::sync::mpsc;

use super::stream::{Outbound, Stream, StreamState};
use super::CONTROL_STREAM_ID;
use crate::error::{Result, RtmpError};

/// Tracks the logical streams multiplexed on one connection, keyed by id.
///
/// Owned exclusively by the connection session; nothing else mutates it.
/// The control stream is created first and survives until teardown.
#[derive(Debug)]
pub struct StreamRegistry {
    streams: HashMap<u32, Stream>,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl StreamRegistry {
    pub(crate) fn new(outbound: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            streams: HashMap::new(),
            outbound,
        }
    }

    /// Create a stream with the given id. Duplicate ids are rejected.
    pub fn create(&mut self, id: u32, state: StreamState) -> Result<&mut Stream> {
        match self.streams.entry(id) {
            Entry::Occupied(_) => Err(RtmpError::StreamExists(id)),
            Entry::Vacant(slot) => {
                tracing::debug!(stream_id = id, "stream created");
                Ok(slot.insert(Stream::new(id, state, self.outbound.clone())))
            }
        }
    }

    /// Look up a stream.
    pub fn get(&self, id: u32) -> Option<&Stream> {
        self.streams.get(&id)
    }

    /// Look up a stream for mutation.
    pub fn get_mut(&mut self, id: u32) -> Option<&mut Stream> {
        self.streams.get_mut(&id)
    }

    /// Remove a stream. The control stream is never deletable.
    pub fn delete(&mut self, id: u32) -> Result<()> {
        if id == CONTROL_STREAM_ID {
            return Err(RtmpError::ProtocolViolation(
                "control stream cannot be deleted".to_string(),
            ));
        }
        match self.streams.remove(&id) {
            Some(_) => {
                tracing::debug!(stream_id = id, "stream deleted");
                Ok(())
            }
            None => Err(RtmpError::StreamNotFound(id)),
        }
    }

    /// Whether a stream with this id exists.
    pub fn contains(&self, id: u32) -> bool {
        self.streams.contains_key(&id)
    }

    /// Number of registered streams.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// True when no streams are registered.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
