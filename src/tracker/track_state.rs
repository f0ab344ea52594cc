use std::fmt;

use serde::{Deserialize, Serialize};

/// Track state enumeration for object tracking lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrackState {
    /// Actively tracked object
    #[default]
    Tracked,
    /// Temporarily lost track, kept for at most `track_buffer` frames
    Lost,
    /// Removed from tracking
    Removed,
}

impl TrackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackState::Tracked => "Tracked",
            TrackState::Lost => "Lost",
            TrackState::Removed => "Removed",
        }
    }
}

impl fmt::Display for TrackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
