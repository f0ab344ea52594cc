//! Integration module for connecting object detection backends with the tracker.
//!
//! Inference, letterboxing and non-max suppression live outside this crate;
//! this module provides the traits and glue to feed their output in.

mod builder;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use pipeline::TrackerPipeline;
