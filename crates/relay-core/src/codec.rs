//! Decoding of response bytes into typed payloads.

use serde::de::DeserializeOwned;

use crate::domain::EventType;
use crate::error::RelayError;

/// Decode the success bytes of a queue result.
///
/// Decode failures are never retried (the bytes will not change); callers
/// treat them like any other failed event and fall back.
pub fn decode<T: DeserializeOwned>(event_type: EventType, bytes: &[u8]) -> Result<T, RelayError> {
    serde_json::from_slice(bytes).map_err(|source| RelayError::Decode { event_type, source })
}
