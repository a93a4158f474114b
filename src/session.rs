//! One hand-tracking session: camera gating, classification, hold
//! confirmation and answer dispatch.
//!
//! A session is created when the camera is enabled and owns exactly one
//! `HoldConfirm`.  Disabling the camera discards any hold in progress.

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::hand::{FingerStates, HoldConfirm, HoldOutcome, LandmarkFrame, Pose};

// ── Answers ────────────────────────────────────────────────

/// Flashcard answer grade, with the backend's numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Wrong = 0,
    Hard = 1,
    Easy = 2,
}

impl Difficulty {
    /// Grade a confirmed pose.  `Pose::None` is never an answer.
    pub fn from_pose(pose: Pose) -> Option<Self> {
        match pose {
            Pose::ThumbsUp => Some(Self::Easy),
            Pose::ThumbsDown => Some(Self::Wrong),
            Pose::FlatHand => Some(Self::Hard),
            Pose::None => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrong => "wrong",
            Self::Hard => "hard",
            Self::Easy => "easy",
        }
    }
}

/// A confirmed hands-free answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer {
    pub pose: Pose,
    pub difficulty: Difficulty,
    pub time_ms: u64,
}

/// Consumer of confirmed answers.
pub trait AnswerSink {
    fn submit(&mut self, answer: Answer);
}

impl AnswerSink for Vec<Answer> {
    fn submit(&mut self, answer: Answer) {
        self.push(answer);
    }
}

/// Default number of answers kept by `RecentAnswers`.
pub const RECENT_ANSWERS_CAPACITY: usize = 32;

/// Bounded log of the most recent answers; the oldest is dropped when full.
#[derive(Debug, Clone)]
pub struct RecentAnswers {
    capacity: usize,
    items: VecDeque<Answer>,
}

impl Default for RecentAnswers {
    fn default() -> Self {
        Self::new(RECENT_ANSWERS_CAPACITY)
    }
}

impl RecentAnswers {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last(&self) -> Option<&Answer> {
        self.items.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Answer> {
        self.items.iter()
    }
}

impl AnswerSink for RecentAnswers {
    fn submit(&mut self, answer: Answer) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(answer);
    }
}

// ── Updates ────────────────────────────────────────────────

/// What the UI needs after each sample or tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionUpdate {
    /// Live classification (the most recent frame's pose for ticks).
    pub pose: Pose,
    pub outcome: HoldOutcome,
    /// Set on the single step that confirms a hold.
    pub answer: Option<Answer>,
}

impl SessionUpdate {
    pub fn progress(&self) -> f32 {
        self.outcome.progress()
    }
}

// ── Session ────────────────────────────────────────────────

pub struct Session {
    config: SessionConfig,
    hold: HoldConfirm,
    camera_active: bool,
    current_pose: Pose,
    last_tick_ms: Option<u64>,
    answers_given: u64,
}

impl Session {
    /// Create a session with the camera enabled.
    pub fn new(config: SessionConfig) -> Self {
        let hold = HoldConfirm::new(config.hold_duration_ms);
        Self {
            config,
            hold,
            camera_active: true,
            current_pose: Pose::None,
            last_tick_ms: None,
            answers_given: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Apply a validated config.  The hold in progress is kept.
    pub fn set_config(&mut self, config: SessionConfig) {
        self.hold.set_hold_duration_ms(config.hold_duration_ms);
        self.config = config;
    }

    pub fn camera_active(&self) -> bool {
        self.camera_active
    }

    pub fn current_pose(&self) -> Pose {
        self.current_pose
    }

    pub fn hold(&self) -> &HoldConfirm {
        &self.hold
    }

    pub fn answers_given(&self) -> u64 {
        self.answers_given
    }

    /// Enable or disable the input source.
    ///
    /// Either transition starts from a fresh idle machine; disabling never
    /// fires a trigger.
    pub fn set_camera_active(&mut self, active: bool) {
        if self.camera_active == active {
            return;
        }
        info!("camera {}", if active { "enabled" } else { "disabled" });
        self.camera_active = active;
        self.reset();
    }

    /// Discard the in-progress hold and live pose.
    pub fn reset(&mut self) {
        self.hold.reset();
        self.current_pose = Pose::None;
        self.last_tick_ms = None;
    }

    /// Classify one frame (or an explicit "no hand") and feed the result to
    /// the hold machine.  Returns `None` while the camera is disabled.
    pub fn process_frame(
        &mut self,
        frame: Option<&LandmarkFrame>,
        now_ms: u64,
    ) -> Option<SessionUpdate> {
        if !self.camera_active {
            return None;
        }
        let states = frame.map(FingerStates::from_frame);
        let pose = states.as_ref().map_or(Pose::None, FingerStates::pose);
        if pose != self.current_pose {
            let fingers = states.as_ref().map_or_else(|| "nil".to_string(), FingerStates::sexp);
            debug!(
                states = %fingers,
                "pose {} -> {} at {}ms",
                self.current_pose.as_str(),
                pose.as_str(),
                now_ms
            );
        }
        self.current_pose = pose;
        let outcome = self.hold.observe(pose, now_ms);
        Some(self.finish(pose, outcome, now_ms))
    }

    /// Timer tick.  Every tick advances the hold, so a threshold crossing is
    /// never delayed.  Progress-only updates closer than `tick_interval_ms`
    /// to the previous reported tick are coalesced and return `None`, as do
    /// ticks while the camera is off.
    pub fn tick(&mut self, now_ms: u64) -> Option<SessionUpdate> {
        if !self.camera_active {
            return None;
        }
        let outcome = self.hold.advance(now_ms);
        let too_soon = self
            .last_tick_ms
            .is_some_and(|last| now_ms < last.saturating_add(self.config.tick_interval_ms));
        if too_soon && outcome.triggered().is_none() {
            return None;
        }
        self.last_tick_ms = Some(now_ms);
        Some(self.finish(self.current_pose, outcome, now_ms))
    }

    /// Forward a confirmed answer, if the update carries one.
    pub fn dispatch(update: &SessionUpdate, sink: &mut dyn AnswerSink) {
        if let Some(answer) = update.answer {
            sink.submit(answer);
        }
    }

    fn finish(&mut self, pose: Pose, outcome: HoldOutcome, now_ms: u64) -> SessionUpdate {
        let answer = outcome.triggered().and_then(|held| {
            Difficulty::from_pose(held).map(|difficulty| Answer {
                pose: held,
                difficulty,
                time_ms: now_ms,
            })
        });
        if let Some(a) = answer {
            self.answers_given += 1;
            info!(
                "answer confirmed: {} -> {} ({})",
                a.pose.as_str(),
                a.difficulty.as_str(),
                a.difficulty.code()
            );
        }
        SessionUpdate {
            pose,
            outcome,
            answer,
        }
    }

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self, now_ms: u64) -> String {
        format!(
            "(:camera {} :pose :{} :answers {} :hold {} :config {})",
            if self.camera_active { "t" } else { "nil" },
            self.current_pose.as_str(),
            self.answers_given,
            self.hold.status_sexp(now_ms),
            self.config.config_sexp(),
        )
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::pose::{flat_hand, thumbs_down_hand, thumbs_up_hand};
    use crate::hand::{HoldState, Point};

    fn frame(points: Vec<Point>) -> LandmarkFrame {
        LandmarkFrame::from_points(&points).unwrap()
    }

    #[test]
    fn test_difficulty_mapping() {
        assert_eq!(Difficulty::from_pose(Pose::ThumbsUp), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_pose(Pose::ThumbsDown), Some(Difficulty::Wrong));
        assert_eq!(Difficulty::from_pose(Pose::FlatHand), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_pose(Pose::None), None);
        assert_eq!(Difficulty::Wrong.code(), 0);
        assert_eq!(Difficulty::Hard.code(), 1);
        assert_eq!(Difficulty::Easy.code(), 2);
    }

    #[test]
    fn test_held_thumbs_up_answers_easy_once() {
        let mut session = Session::new(SessionConfig::default());
        let up = frame(thumbs_up_hand());
        let mut sink: Vec<Answer> = Vec::new();

        for t in [0, 1000, 2000, 3000] {
            let update = session.process_frame(Some(&up), t).unwrap();
            assert_eq!(update.pose, Pose::ThumbsUp);
            Session::dispatch(&update, &mut sink);
        }

        assert_eq!(
            sink,
            vec![Answer {
                pose: Pose::ThumbsUp,
                difficulty: Difficulty::Easy,
                time_ms: 3000
            }]
        );
        assert_eq!(session.answers_given(), 1);
    }

    #[test]
    fn test_no_hand_cancels_hold() {
        let mut session = Session::new(SessionConfig::default());
        let down = frame(thumbs_down_hand());
        session.process_frame(Some(&down), 0);
        let update = session.process_frame(None, 2950).unwrap();
        assert_eq!(update.pose, Pose::None);
        assert_eq!(
            update.outcome,
            HoldOutcome::Cancelled {
                pose: Pose::ThumbsDown
            }
        );
        assert_eq!(session.hold().state(), HoldState::Idle);
    }

    #[test]
    fn test_tick_confirms_between_frames() {
        let mut session = Session::new(SessionConfig::default());
        let flat = frame(flat_hand());
        session.process_frame(Some(&flat), 0);

        let update = session.tick(2950).unwrap();
        assert!(update.answer.is_none());
        assert_eq!(update.pose, Pose::FlatHand);

        let update = session.tick(3000).unwrap();
        let answer = update.answer.unwrap();
        assert_eq!(answer.difficulty, Difficulty::Hard);
        assert_eq!(update.progress(), 1.0);
    }

    #[test]
    fn test_ticks_closer_than_interval_are_coalesced() {
        let mut session = Session::new(SessionConfig::new(3000, 50).unwrap());
        assert!(session.tick(100).is_some());
        assert!(session.tick(120).is_none());
        assert!(session.tick(150).is_some());
    }

    #[test]
    fn test_tick_inside_interval_still_triggers() {
        let mut session = Session::new(SessionConfig::new(3000, 50).unwrap());
        let up = frame(thumbs_up_hand());
        session.process_frame(Some(&up), 0);

        let update = session.tick(2990).unwrap();
        assert!(update.answer.is_none());

        let update = session.tick(3000).unwrap();
        assert_eq!(update.answer.map(|a| a.difficulty), Some(Difficulty::Easy));
        assert!(!session.hold().is_holding());
    }

    #[test]
    fn test_recent_answers_drops_oldest() {
        let mut recent = RecentAnswers::new(2);
        for t in [1, 2, 3] {
            recent.submit(Answer {
                pose: Pose::FlatHand,
                difficulty: Difficulty::Hard,
                time_ms: t,
            });
        }
        let times: Vec<u64> = recent.iter().map(|a| a.time_ms).collect();
        assert_eq!(times, vec![2, 3]);
        assert_eq!(recent.last().map(|a| a.time_ms), Some(3));
    }

    #[test]
    fn test_camera_disabled_ignores_input_and_discards_hold() {
        let mut session = Session::new(SessionConfig::default());
        let up = frame(thumbs_up_hand());
        session.process_frame(Some(&up), 0);
        assert!(session.hold().is_holding());

        session.set_camera_active(false);
        assert_eq!(session.hold().state(), HoldState::Idle);
        assert_eq!(session.current_pose(), Pose::None);
        assert!(session.process_frame(Some(&up), 3000).is_none());
        assert!(session.tick(3000).is_none());

        session.set_camera_active(true);
        let update = session.process_frame(Some(&up), 3100).unwrap();
        assert!(update.answer.is_none());
        assert_eq!(update.progress(), 0.0);
    }

    #[test]
    fn test_set_config_changes_duration() {
        let mut session = Session::new(SessionConfig::default());
        session.set_config(SessionConfig::new(1000, 50).unwrap());
        let up = frame(thumbs_up_hand());
        session.process_frame(Some(&up), 0);
        let update = session.process_frame(Some(&up), 1000).unwrap();
        assert!(update.answer.is_some());
    }

    #[test]
    fn test_status_sexp() {
        let session = Session::new(SessionConfig::default());
        let sexp = session.status_sexp(0);
        assert!(sexp.contains(":camera t"));
        assert!(sexp.contains(":pose :none"));
        assert!(sexp.contains(":hold (:state :idle"));
        assert!(lexpr::from_str(&sexp).is_ok());
    }
}
