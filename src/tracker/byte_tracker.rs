//! Main BYTETracker algorithm implementation.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::tracker::error::{Result, TrackerError};
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::{self, AssignmentResult, Detection};
use crate::tracker::pool::{ArrayPool, TrackPool};
use crate::tracker::rect::Rect;
use crate::tracker::strack::{STrack, TrackResult};

/// Configuration for the BYTETracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Minimum score for the first association against tracked tracks
    pub track_high_thresh: f32,
    /// Candidates below this score are ignored by the second association
    pub track_low_thresh: f32,
    /// Minimum score for an unmatched detection to start a new track
    pub new_track_thresh: f32,
    /// Frames a lost track is kept before it is removed
    pub track_buffer: u32,
    /// Maximum IoU distance accepted as a match
    pub match_thresh: f32,
    /// Capacity of the recycled track free-list
    pub track_pool_size: usize,
    /// Capacity of the recycled candidate-buffer free-list
    pub array_pool_size: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            track_high_thresh: 0.25,
            track_low_thresh: 0.1,
            new_track_thresh: 0.25,
            track_buffer: 60,
            match_thresh: 0.8,
            track_pool_size: 200,
            array_pool_size: 20,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("track_high_thresh", self.track_high_thresh),
            ("track_low_thresh", self.track_low_thresh),
            ("new_track_thresh", self.new_track_thresh),
            ("match_thresh", self.match_thresh),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(TrackerError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.track_high_thresh < self.track_low_thresh {
            return Err(TrackerError::InvalidConfig(format!(
                "track_high_thresh ({}) is below track_low_thresh ({})",
                self.track_high_thresh, self.track_low_thresh
            )));
        }
        if self.new_track_thresh < self.track_low_thresh {
            return Err(TrackerError::InvalidConfig(format!(
                "new_track_thresh ({}) is below track_low_thresh ({})",
                self.new_track_thresh, self.track_low_thresh
            )));
        }
        Ok(())
    }
}

pub struct BYTETracker {
    tracked_stracks: Vec<STrack>,
    lost_stracks: Vec<STrack>,
    frame_id: u32,
    next_track_id: u64,
    config: TrackerConfig,
    kalman_filter: KalmanFilter,
    track_pool: TrackPool,
    array_pool: ArrayPool<Option<STrack>>,
}

impl BYTETracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tracked_stracks: Vec::new(),
            lost_stracks: Vec::new(),
            frame_id: 0,
            next_track_id: 0,
            track_pool: TrackPool::new(config.track_pool_size),
            array_pool: ArrayPool::new(config.array_pool_size),
            config,
            kalman_filter: KalmanFilter::default(),
        })
    }

    /// Advance the tracker by one frame and return the currently tracked objects.
    ///
    /// If a Kalman update fails, that track is dropped, the rest of the frame is
    /// still processed and the first failure is returned.
    pub fn update(&mut self, detections: &[Detection]) -> Result<Vec<TrackResult>> {
        self.frame_id += 1;
        let frame_id = self.frame_id;
        let mut failure: Option<TrackerError> = None;

        // Wrap detections as candidates without an identity
        let mut candidates = self.array_pool.acquire(detections.len());
        for det in detections {
            let track = self
                .track_pool
                .acquire(None, det.xywh, det.score, det.cls_idx, &self.kalman_filter);
            candidates.push(Some(track));
        }

        STrack::multi_predict(&mut self.tracked_stracks, &self.kalman_filter);
        STrack::multi_predict(&mut self.lost_stracks, &self.kalman_filter);

        // Step 1: First association, tracked tracks with high score detections
        let high_thresh = self.config.track_high_thresh;
        let high_score: Vec<usize> = candidate_indices(&candidates, |t| t.score >= high_thresh);

        let AssignmentResult {
            matches,
            unmatched_detections,
            ..
        } = matching::associate(
            &track_rects(&self.tracked_stracks),
            &candidate_rects(&candidates, &high_score),
            self.config.match_thresh,
        );

        let mut matched_det = vec![None; self.tracked_stracks.len()];
        for &(itracked, idet) in &matches {
            matched_det[itracked] = Some(high_score[idet]);
        }

        let mut survivors = Vec::with_capacity(self.tracked_stracks.len());
        for (mut track, det_idx) in self.tracked_stracks.drain(..).zip(matched_det) {
            match det_idx.and_then(|idx| candidates[idx].as_ref()) {
                Some(det) => match track.update(det, &self.kalman_filter, frame_id) {
                    Ok(()) => survivors.push(track),
                    Err(err) => drop_failed(&mut self.track_pool, track, &mut failure, err),
                },
                None => {
                    debug!(track_id = ?track.track_id, frame_id, "track lost");
                    track.mark_lost();
                    self.lost_stracks.push(track);
                }
            }
        }
        self.tracked_stracks = survivors;

        // Step 2: Second association, lost tracks with the leftover detections
        let low_thresh = self.config.track_low_thresh;
        let mut remaining: Vec<usize> =
            unmatched_detections.iter().map(|&i| high_score[i]).collect();
        remaining.extend(candidate_indices(&candidates, |t| {
            t.score < high_thresh && t.score >= low_thresh
        }));

        let AssignmentResult {
            matches: matches_second,
            unmatched_detections: unmatched_second,
            ..
        } = matching::associate(
            &track_rects(&self.lost_stracks),
            &candidate_rects(&candidates, &remaining),
            self.config.match_thresh,
        );

        let mut lost_slots: Vec<Option<STrack>> = self.lost_stracks.drain(..).map(Some).collect();
        for &(ilost, idet) in &matches_second {
            let Some(det) = candidates[remaining[idet]].as_ref() else {
                continue;
            };
            let Some(mut track) = lost_slots[ilost].take() else {
                continue;
            };
            match track.update(det, &self.kalman_filter, frame_id) {
                Ok(()) => {
                    debug!(track_id = ?track.track_id, frame_id, "lost track re-found");
                    self.tracked_stracks.push(track);
                }
                Err(err) => drop_failed(&mut self.track_pool, track, &mut failure, err),
            }
        }
        self.lost_stracks = lost_slots.into_iter().flatten().collect();

        // Step 3: Init new tracks from unmatched detections
        let new_thresh = self.config.new_track_thresh;
        for idet in unmatched_second {
            let slot = &mut candidates[remaining[idet]];
            let Some(mut track) = slot.take_if(|t| t.score >= new_thresh) else {
                continue;
            };
            let track_id = self.next_track_id;
            self.next_track_id += 1;
            track.activate(track_id, frame_id);
            debug!(track_id, frame_id, score = track.score, cls_idx = track.cls_idx, "new track");
            self.tracked_stracks.push(track);
        }

        // Step 4: Remove tracks lost for longer than the buffer
        let track_buffer = self.config.track_buffer;
        let mut kept = Vec::with_capacity(self.lost_stracks.len());
        for mut track in self.lost_stracks.drain(..) {
            if frame_id - track.end_frame() > track_buffer {
                debug!(track_id = ?track.track_id, frame_id, "track removed");
                track.mark_removed();
                self.track_pool.release(track);
            } else {
                kept.push(track);
            }
        }
        self.lost_stracks = kept;

        // Step 5: Recycle candidates that never became tracks
        for track in candidates.drain(..).flatten() {
            self.track_pool.release(track);
        }
        self.array_pool.release(candidates);

        trace!(
            frame_id,
            detections = detections.len(),
            matched_first = matches.len(),
            matched_second = matches_second.len(),
            tracked = self.tracked_stracks.len(),
            lost = self.lost_stracks.len(),
            "frame processed"
        );

        if let Some(err) = failure {
            return Err(err);
        }

        Ok(self
            .tracked_stracks
            .iter()
            .filter_map(STrack::to_result)
            .collect())
    }

    /// Start a new session: forget every track and restart frame and id counters.
    pub fn reset(&mut self) {
        for track in self.tracked_stracks.drain(..).chain(self.lost_stracks.drain(..)) {
            self.track_pool.release(track);
        }
        self.frame_id = 0;
        self.next_track_id = 0;
    }

    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    pub fn tracked_tracks(&self) -> &[STrack] {
        &self.tracked_stracks
    }

    #[cfg(test)]
    pub(crate) fn tracked_tracks_mut(&mut self) -> &mut [STrack] {
        &mut self.tracked_stracks
    }

    pub fn lost_tracks(&self) -> &[STrack] {
        &self.lost_stracks
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

fn candidate_indices(candidates: &[Option<STrack>], keep: impl Fn(&STrack) -> bool) -> Vec<usize> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(i, c)| c.as_ref().filter(|t| keep(t)).map(|_| i))
        .collect()
}

fn candidate_rects(candidates: &[Option<STrack>], indices: &[usize]) -> Vec<Rect> {
    indices
        .iter()
        .filter_map(|&i| candidates[i].as_ref().map(STrack::rect))
        .collect()
}

fn track_rects(tracks: &[STrack]) -> Vec<Rect> {
    tracks.iter().map(STrack::rect).collect()
}

/// Discard a track whose state could not be updated, remembering the first error.
fn drop_failed(
    pool: &mut TrackPool,
    mut track: STrack,
    failure: &mut Option<TrackerError>,
    err: TrackerError,
) {
    debug!(track_id = ?track.track_id, %err, "dropping track after failed update");
    track.mark_removed();
    pool.release(track);
    failure.get_or_insert(err);
}
