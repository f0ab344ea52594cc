//! Trait for object detection inference backends.

use crate::tracker::Detection;

/// Trait for object detection inference backends.
///
/// Implement this trait to connect any detection model to the tracker. The
/// returned detections must already be in the output coordinate space and
/// past non-max suppression.
///
/// # Example
///
/// ```ignore
/// use bytetrack_xywh::{DetectionSource, Detection};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(
///         &mut self,
///         input: &[u8],
///         width: u32,
///         height: u32,
///     ) -> Result<Vec<Detection>, Self::Error> {
///         // Run inference and return detections
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error;

    /// Run inference on raw image data and return detections.
    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error>;
}

/// Helper trait for converting model-specific outputs to `Detection`.
pub trait IntoDetections {
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}

/// Raw `(xywh, score, cls_idx)` rows, as produced by most YOLO post-processing.
impl IntoDetections for Vec<([f32; 4], f32, u32)> {
    fn into_detections(self) -> Vec<Detection> {
        self.into_iter()
            .map(|(xywh, score, cls_idx)| Detection::new(xywh, score, cls_idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_rows_into_detections() {
        let rows: Vec<([f32; 4], f32, u32)> = vec![
            ([20.0, 20.0, 10.0, 10.0], 0.8, 1),
            ([5.0, 5.0, 2.0, 2.0], 0.3, 0),
        ];
        let dets = rows.into_detections();

        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0], Detection::new([20.0, 20.0, 10.0, 10.0], 0.8, 1));
        assert_eq!(dets[1].cls_idx, 0);
    }
}
