//! TrackerPipeline for combining detection with tracking.

use tracing::warn;

use crate::tracker::{BYTETracker, Detection, TrackResult, TrackerConfig, TrackerError};

use super::DetectionSource;

/// A combined tracker that bundles detection inference with the tracker.
///
/// Tracker failures never abort the session: the frame is logged and yields
/// no tracks. Detector failures are returned to the caller.
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    tracker: BYTETracker,
    min_confidence: Option<f32>,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Create a new tracking pipeline with the given detector and tracker config.
    pub fn new(detector: D, config: TrackerConfig) -> Result<Self, TrackerError> {
        Ok(Self {
            detector,
            tracker: BYTETracker::new(config)?,
            min_confidence: None,
        })
    }

    /// Create a new tracking pipeline with default tracker configuration.
    pub fn with_default_config(detector: D) -> Result<Self, TrackerError> {
        Self::new(detector, TrackerConfig::default())
    }

    /// Drop detections scoring at or below `threshold` before they reach the tracker.
    pub fn with_min_confidence(mut self, threshold: f32) -> Self {
        self.min_confidence = Some(threshold);
        self
    }

    /// Process a single frame and return active tracks.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<TrackResult>, D::Error> {
        let mut detections = self.detector.detect(input, width, height)?;
        if let Some(threshold) = self.min_confidence {
            detections.retain(|d| d.score > threshold);
        }
        Ok(self.track(&detections))
    }

    /// Feed already-detected objects to the tracker.
    pub fn track(&mut self, detections: &[Detection]) -> Vec<TrackResult> {
        match self.tracker.update(detections) {
            Ok(tracks) => tracks,
            Err(err) => {
                warn!(
                    %err,
                    frame_id = self.tracker.frame_id(),
                    "tracking failed, emitting empty frame"
                );
                Vec::new()
            }
        }
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &BYTETracker {
        &self.tracker
    }

    /// Get a mutable reference to the underlying tracker.
    pub fn tracker_mut(&mut self) -> &mut BYTETracker {
        &mut self.tracker
    }
}
