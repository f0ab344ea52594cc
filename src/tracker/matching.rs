//! Matching utilities for multi-object tracking.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::tracker::rect::Rect;

/// Pairs whose top-left corners are further apart (Manhattan) than this
/// multiple of the track's `w + h` get cost 1 without computing IoU.
const GATE_SCALE: f32 = 1.5;

/// Detection input for the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box in XYWH format (center x, center y, width, height)
    pub xywh: [f32; 4],
    /// Detection confidence score
    pub score: f32,
    /// Class index reported by the detector
    pub cls_idx: u32,
}

impl Detection {
    pub fn new(xywh: [f32; 4], score: f32, cls_idx: u32) -> Self {
        Self {
            xywh,
            score,
            cls_idx,
        }
    }

    pub fn from_rect(bbox: Rect, score: f32, cls_idx: u32) -> Self {
        Self::new(bbox.to_xywh(), score, cls_idx)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_xywh(self.xywh)
    }
}

/// Compute the gated IoU distance matrix between tracks (rows) and detections (columns).
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    let mut dists = Array2::ones((track_boxes.len(), det_boxes.len()));
    for (i, t) in track_boxes.iter().enumerate() {
        let gate = GATE_SCALE * (t.width + t.height);
        for (j, d) in det_boxes.iter().enumerate() {
            if t.corner_distance(d) > gate {
                continue;
            }
            dists[[i, j]] = 1.0 - t.iou(d);
        }
    }
    dists
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Minimum-cost assignment keeping only pairs with `cost <= thresh`.
///
/// Matches and unmatched tracks come out in ascending row order, unmatched
/// detections in ascending column order.
pub fn linear_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: vec![],
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    if num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: vec![],
        };
    }

    // lapjv needs a square matrix; padding cells are never accepted.
    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), 1e6);

    for i in 0..num_rows {
        for j in 0..num_cols {
            padded[[i, j]] = cost_matrix[[i, j]] as f64;
        }
    }

    let mut matches = vec![];
    let mut unmatched_tracks = vec![];
    let mut unmatched_detections_mask: Vec<bool> = vec![true; num_cols];

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (row_idx, &col_idx) in row_to_col.iter().enumerate().take(num_rows) {
                if col_idx < num_cols && cost_matrix[[row_idx, col_idx]] <= thresh {
                    matches.push((row_idx, col_idx));
                    unmatched_detections_mask[col_idx] = false;
                } else {
                    unmatched_tracks.push(row_idx);
                }
            }
        }
        Err(err) => {
            warn!(
                ?err,
                rows = num_rows,
                cols = num_cols,
                "assignment solver failed, leaving all unmatched"
            );
            unmatched_tracks = (0..num_rows).collect();
        }
    }

    let unmatched_detections: Vec<usize> = unmatched_detections_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| if u { Some(i) } else { None })
        .collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}

/// Associate tracks with detections by gated IoU distance.
pub fn associate(track_boxes: &[Rect], det_boxes: &[Rect], match_thresh: f32) -> AssignmentResult {
    if track_boxes.is_empty() {
        return AssignmentResult {
            unmatched_detections: (0..det_boxes.len()).collect(),
            ..Default::default()
        };
    }
    if det_boxes.is_empty() {
        return AssignmentResult {
            unmatched_tracks: (0..track_boxes.len()).collect(),
            ..Default::default()
        };
    }

    let dists = iou_distance(track_boxes, det_boxes);
    linear_assignment(&dists, match_thresh)
}
