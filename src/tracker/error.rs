//! Error types for the tracker.

use thiserror::Error;

/// Numeric failure inside the Kalman filter.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KalmanError {
    /// The projected 4x4 innovation covariance could not be inverted.
    #[error("innovation covariance is singular or non-finite")]
    SingularInnovation,
}

/// Errors surfaced by [`BYTETracker`](crate::tracker::BYTETracker).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    /// A Kalman update hit a singular innovation covariance. The offending
    /// track is dropped; `track_id` is `None` for a candidate that was never
    /// promoted.
    #[error("singular covariance while updating track {track_id:?} on frame {frame_id}")]
    SingularCovariance { track_id: Option<u64>, frame_id: u32 },

    #[error("invalid tracker configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
