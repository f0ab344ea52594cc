//! Single object track (STrack) for multi-object tracking.

use serde::{Deserialize, Serialize};

use crate::tracker::error::{Result, TrackerError};
use crate::tracker::kalman_filter::{KalmanFilter, StateCovariance, StateMean};
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;

/// Snapshot of a tracked object emitted once per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackResult {
    pub track_id: u64,
    /// Box in TLWH format (top-left x, top-left y, width, height)
    pub tlwh: [f32; 4],
    pub score: f32,
    pub cls_idx: u32,
    pub state: TrackState,
}

/// Single object track.
///
/// Also used as the per-frame wrapper around a detection: such a candidate
/// has no `track_id` until the tracker promotes it.
#[derive(Debug, Clone)]
pub struct STrack {
    /// Unique track identifier, `None` while the track is still a candidate
    pub track_id: Option<u64>,
    /// Current track state
    pub state: TrackState,
    /// Whether the track has been confirmed by a spawn or an update
    pub is_activated: bool,
    /// Detection confidence score
    pub score: f32,
    /// Detection class index
    pub cls_idx: u32,
    /// Last frame this track was updated
    pub frame_id: u32,
    /// Current box in XYWH format, mirrors `mean[0..4]`
    pub xywh: [f32; 4],
    /// Kalman filter state mean (8-dim)
    pub mean: StateMean,
    /// Kalman filter state covariance (8x8)
    pub covariance: StateCovariance,
}

impl STrack {
    /// Create a new candidate from a detection.
    pub fn new(xywh: [f32; 4], score: f32, cls_idx: u32, kalman_filter: &KalmanFilter) -> Self {
        let (mean, covariance) = kalman_filter.initiate(xywh.map(f64::from));
        Self {
            track_id: None,
            state: TrackState::Tracked,
            is_activated: false,
            score,
            cls_idx,
            frame_id: 0,
            xywh,
            mean,
            covariance,
        }
    }

    /// Reinitialise a recycled track in place.
    pub(crate) fn reset(
        &mut self,
        track_id: Option<u64>,
        xywh: [f32; 4],
        score: f32,
        cls_idx: u32,
        kalman_filter: &KalmanFilter,
    ) {
        let (mean, covariance) = kalman_filter.initiate(xywh.map(f64::from));
        self.track_id = track_id;
        self.state = TrackState::Tracked;
        self.is_activated = false;
        self.score = score;
        self.cls_idx = cls_idx;
        self.frame_id = 0;
        self.xywh = xywh;
        self.mean = mean;
        self.covariance = covariance;
    }

    /// Get the current bounding box in TLWH format.
    pub fn tlwh(&self) -> [f32; 4] {
        self.rect().to_tlwh()
    }

    pub fn rect(&self) -> Rect {
        Rect::from_xywh(self.xywh)
    }

    pub fn end_frame(&self) -> u32 {
        self.frame_id
    }

    /// Promote a candidate to a live track with a fresh identity.
    pub fn activate(&mut self, track_id: u64, frame_id: u32) {
        self.track_id = Some(track_id);
        self.state = TrackState::Tracked;
        self.is_activated = true;
        self.frame_id = frame_id;
    }

    /// Fuse a matched detection into this track.
    ///
    /// On a numeric failure the track is left untouched and the error names it.
    pub fn update(
        &mut self,
        new_track: &STrack,
        kalman_filter: &KalmanFilter,
        frame_id: u32,
    ) -> Result<()> {
        let (mean, covariance) = kalman_filter
            .update(&self.mean, &self.covariance, new_track.xywh.map(f64::from))
            .map_err(|_| TrackerError::SingularCovariance {
                track_id: self.track_id,
                frame_id,
            })?;

        self.mean = mean;
        self.covariance = covariance;
        self.sync_xywh();
        self.score = new_track.score;
        self.cls_idx = new_track.cls_idx;
        self.frame_id = frame_id;
        self.state = TrackState::Tracked;
        self.is_activated = true;
        Ok(())
    }

    pub fn predict(&mut self, kalman_filter: &KalmanFilter) {
        let (mean, covariance) = kalman_filter.predict(&self.mean, &self.covariance);
        self.mean = mean;
        self.covariance = covariance;
        self.sync_xywh();
    }

    pub fn mark_lost(&mut self) {
        self.state = TrackState::Lost;
    }

    pub fn mark_removed(&mut self) {
        self.state = TrackState::Removed;
    }

    pub fn multi_predict(stracks: &mut [STrack], kalman_filter: &KalmanFilter) {
        for strack in stracks.iter_mut() {
            strack.predict(kalman_filter);
        }
    }

    /// Output record, `None` for a candidate that never got an id.
    pub fn to_result(&self) -> Option<TrackResult> {
        Some(TrackResult {
            track_id: self.track_id?,
            tlwh: self.tlwh(),
            score: self.score,
            cls_idx: self.cls_idx,
            state: self.state,
        })
    }

    fn sync_xywh(&mut self) {
        self.xywh = [
            self.mean[0] as f32,
            self.mean[1] as f32,
            self.mean[2] as f32,
            self.mean[3] as f32,
        ];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_candidate() {
        let kf = KalmanFilter::new();
        let track = STrack::new([20.0, 20.0, 20.0, 10.0], 0.9, 3, &kf);

        assert_eq!(track.track_id, None);
        assert!(!track.is_activated);
        assert_eq!(track.tlwh(), [10.0, 15.0, 20.0, 10.0]);
        assert!(track.to_result().is_none());
    }

    #[test]
    fn test_predict_syncs_xywh() {
        let kf = KalmanFilter::new();
        let mut track = STrack::new([20.0, 20.0, 20.0, 20.0], 0.9, 0, &kf);
        track.mean[4] = 3.0;
        track.predict(&kf);

        assert_relative_eq!(track.xywh[0], 23.0);
        for i in 0..4 {
            assert_eq!(track.xywh[i], track.mean[i] as f32);
        }
    }

    #[test]
    fn test_update_overwrites_detection_fields() {
        let kf = KalmanFilter::new();
        let mut track = STrack::new([20.0, 20.0, 20.0, 20.0], 0.9, 0, &kf);
        track.activate(7, 1);
        track.mark_lost();
        track.predict(&kf);

        let det = STrack::new([22.0, 21.0, 20.0, 20.0], 0.4, 2, &kf);
        track.update(&det, &kf, 5).unwrap();

        assert_eq!(track.state, TrackState::Tracked);
        assert_eq!(track.score, 0.4);
        assert_eq!(track.cls_idx, 2);
        assert_eq!(track.frame_id, 5);
        assert!(track.xywh[0] > 20.0 && track.xywh[0] <= 22.0);
        for i in 0..4 {
            assert_eq!(track.xywh[i], track.mean[i] as f32);
        }

        let result = track.to_result().unwrap();
        assert_eq!(result.track_id, 7);
        assert_eq!(result.state, TrackState::Tracked);
    }

    #[test]
    fn test_update_failure_leaves_track_untouched() {
        let kf = KalmanFilter::new();
        let mut track = STrack::new([20.0, 20.0, 20.0, 20.0], 0.9, 0, &kf);
        track.activate(3, 1);
        track.covariance = StateCovariance::from_element(f64::NAN);

        let det = STrack::new([22.0, 21.0, 20.0, 20.0], 0.5, 1, &kf);
        let err = track.update(&det, &kf, 2).unwrap_err();

        assert_eq!(
            err,
            TrackerError::SingularCovariance {
                track_id: Some(3),
                frame_id: 2
            }
        );
        assert_eq!(track.score, 0.9);
        assert_eq!(track.frame_id, 1);
    }

    #[test]
    fn test_state_transitions_are_pure() {
        let kf = KalmanFilter::new();
        let mut track = STrack::new([20.0, 20.0, 20.0, 20.0], 0.9, 0, &kf);
        let mean = track.mean;

        track.mark_lost();
        assert_eq!(track.state, TrackState::Lost);
        track.mark_removed();
        assert_eq!(track.state, TrackState::Removed);
        assert_eq!(track.mean, mean);
    }
}
