//! Tracker identifiers and remote document paths

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default prefix under which tracker documents live in the remote store
pub const DEFAULT_PATH_PREFIX: &str = "trackers";

/// Opaque identifier of one tracker (one remote document)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackerId(String);

impl TrackerId {
    /// Create tracker id
    ///
    /// # Errors
    /// - `ModelError::InvalidTrackerId` if the id is blank or contains `/`
    pub fn new(id: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        if id.trim().is_empty() || id.contains('/') {
            return Err(ModelError::InvalidTrackerId(id));
        }
        Ok(Self(id))
    }

    /// Get id as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TrackerId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TrackerId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TrackerId> for String {
    fn from(id: TrackerId) -> Self {
        id.0
    }
}

/// Location of a tracker document in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath(String);

impl DocumentPath {
    /// Path of the tracker state document under `prefix`
    #[must_use]
    pub fn for_tracker(prefix: &str, tracker: &TrackerId) -> Self {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            Self(format!("{tracker}/state"))
        } else {
            Self(format!("{prefix}/{tracker}/state"))
        }
    }

    /// Get path as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_id_rejects_blank_and_separators() {
        assert!(TrackerId::new("").is_err());
        assert!(TrackerId::new("   ").is_err());
        assert!(TrackerId::new("a/b").is_err());
        assert_eq!(TrackerId::new("run-42").unwrap().as_str(), "run-42");
    }

    #[test]
    fn document_path_for_tracker() {
        let id = TrackerId::new("abc").unwrap();
        assert_eq!(
            DocumentPath::for_tracker(DEFAULT_PATH_PREFIX, &id).as_str(),
            "trackers/abc/state"
        );
        assert_eq!(DocumentPath::for_tracker("rooms/", &id).as_str(), "rooms/abc/state");
        assert_eq!(DocumentPath::for_tracker("", &id).as_str(), "abc/state");
    }

    #[test]
    fn tracker_id_serde_validates() {
        let ok: TrackerId = serde_json::from_str("\"x1\"").unwrap();
        assert_eq!(ok.as_str(), "x1");
        assert!(serde_json::from_str::<TrackerId>("\"\"").is_err());
    }
}
