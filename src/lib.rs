//! Hands-free flashcard answers from 2-D hand landmarks.
//!
//! Classifies each landmark frame as thumbs up, thumbs down, or flat hand,
//! and confirms a pose once it has been held for the configured duration.

pub mod config;
pub mod hand;
pub mod ipc;
pub mod session;

pub use config::SessionConfig;
pub use hand::{classify, HoldConfirm, HoldOutcome, LandmarkFrame, Point, Pose};
pub use session::{Answer, AnswerSink, Difficulty, RecentAnswers, Session, SessionUpdate};
