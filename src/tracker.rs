mod byte_tracker;
mod error;
mod kalman_filter;
mod matching;
mod pool;
mod rect;
mod strack;
mod track_state;

pub use byte_tracker::{BYTETracker, TrackerConfig};
pub use error::{KalmanError, Result, TrackerError};
pub use kalman_filter::{KalmanFilter, Measurement, StateCovariance, StateMean};
pub use matching::{AssignmentResult, Detection, associate, iou_distance, linear_assignment};
pub use pool::{ArrayPool, TrackPool};
pub use rect::Rect;
pub use strack::{STrack, TrackResult};
pub use track_state::TrackState;
