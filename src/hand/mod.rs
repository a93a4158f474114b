//! Hand pose subsystem: landmark frames, geometry, pose classification and
//! hold-to-confirm debouncing.
//!
//! Provides:
//! - `landmarks`: 21-point frame model and validation
//! - `geometry`: 2-D vector helpers
//! - `pose`: stateless classifier (thumbs up / thumbs down / flat hand)
//! - `hold`: hold-confirmation state machine driven by external timestamps

pub mod geometry;
pub mod hold;
pub mod landmarks;
pub mod pose;

pub use hold::{HoldConfirm, HoldOutcome, HoldState};
pub use landmarks::{Finger, HandLandmark, LandmarkFrame, Point, LANDMARK_COUNT};
pub use pose::{classify, classify_points, FingerStates, Pose};
