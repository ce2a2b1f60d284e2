//! Domain identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Identity of one queued request.
///
/// A retry reinsertion keeps the id of the request it replaces, so the queue
/// never holds two live copies of the same logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Ulid);

impl RequestId {
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for RequestId {
    fn from(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_sort_by_generation_time() {
        let a = RequestId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = RequestId::generate();
        assert!(a < b);
    }

    #[test]
    fn id_serializes_as_plain_ulid() {
        let id = RequestId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let back: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
        // Transparent newtype: the JSON is just the ULID string.
        assert_eq!(json, format!("\"{}\"", id.as_ulid()));
    }

    #[test]
    fn display_carries_prefix() {
        let id = RequestId::generate();
        assert!(id.to_string().starts_with("req-"));
    }
}
