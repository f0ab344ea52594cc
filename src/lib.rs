//! Online multi-object tracking for per-frame detector output.
//!
//! Detections arrive as `{xywh, score, cls_idx}` and are turned into tracks with
//! stable identities using a constant-velocity Kalman filter and the two-stage
//! ByteTrack association (high score detections first, then the leftovers
//! against lost tracks).
//!
//! ```rust
//! use bytetrack_xywh::{BYTETracker, Detection, TrackerConfig};
//!
//! let mut tracker = BYTETracker::new(TrackerConfig::default()).unwrap();
//! let tracks = tracker
//!     .update(&[Detection::new([20.0, 20.0, 20.0, 20.0], 0.9, 0)])
//!     .unwrap();
//! assert_eq!(tracks[0].track_id, 0);
//! ```

pub mod integration;
pub mod tracker;

pub use integration::{DetectionBuilder, DetectionSource, IntoDetections, TrackerPipeline};
pub use tracker::{
    BYTETracker, Detection, Rect, TrackResult, TrackState, TrackerConfig, TrackerError,
};
