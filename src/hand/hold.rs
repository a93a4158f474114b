//! Hold-to-confirm debouncing of classified poses.
//!
//! A pose must be observed continuously for `hold_duration_ms` before it
//! counts as a confirmed answer.  Samples and ticks carry caller-supplied
//! monotonic timestamps in milliseconds; the machine never reads a clock or
//! spawns a timer.

use tracing::{debug, info};

use super::pose::Pose;

/// Default time a pose must be held before it triggers.
pub const DEFAULT_HOLD_DURATION_MS: u64 = 3000;

// ── State ──────────────────────────────────────────────────

/// Hold state.  `Triggered` is not stored: the transition that reaches the
/// threshold reports `HoldOutcome::Triggered` and leaves the machine `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldState {
    #[default]
    Idle,
    Holding { pose: Pose, started_ms: u64 },
}

/// Result of feeding one sample or tick into the machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldOutcome {
    /// Nothing is being held.
    Idle,
    /// A hold was cancelled by pose loss.
    Cancelled { pose: Pose },
    /// `pose` is being held; `progress` in `[0, 1)`.
    Holding { pose: Pose, progress: f32 },
    /// The hold reached its duration.  Emitted once per continuous hold.
    Triggered { pose: Pose },
}

impl HoldOutcome {
    pub fn triggered(&self) -> Option<Pose> {
        match self {
            Self::Triggered { pose } => Some(*pose),
            _ => None,
        }
    }

    /// Countdown progress for display; 1.0 on the triggering step.
    pub fn progress(&self) -> f32 {
        match self {
            Self::Holding { progress, .. } => *progress,
            Self::Triggered { .. } => 1.0,
            _ => 0.0,
        }
    }
}

// ── Machine ────────────────────────────────────────────────

/// Debounces a per-frame pose signal into one-shot triggers.
///
/// Owned by exactly one session; not thread-safe by itself, callers
/// serialize access through `&mut self`.
#[derive(Debug, Clone)]
pub struct HoldConfirm {
    hold_duration_ms: u64,
    state: HoldState,
}

impl Default for HoldConfirm {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD_DURATION_MS)
    }
}

impl HoldConfirm {
    /// Create an idle machine.  A zero duration is raised to 1 ms so that
    /// progress stays well defined.
    pub fn new(hold_duration_ms: u64) -> Self {
        Self {
            hold_duration_ms: hold_duration_ms.max(1),
            state: HoldState::Idle,
        }
    }

    pub fn hold_duration_ms(&self) -> u64 {
        self.hold_duration_ms
    }

    /// Change the hold duration.  An in-progress hold keeps its start time
    /// and is measured against the new duration from the next sample on.
    pub fn set_hold_duration_ms(&mut self, hold_duration_ms: u64) {
        self.hold_duration_ms = hold_duration_ms.max(1);
    }

    pub fn state(&self) -> HoldState {
        self.state
    }

    pub fn is_holding(&self) -> bool {
        matches!(self.state, HoldState::Holding { .. })
    }

    /// Pose currently being held, if any.
    pub fn held_pose(&self) -> Option<Pose> {
        match self.state {
            HoldState::Holding { pose, .. } => Some(pose),
            HoldState::Idle => None,
        }
    }

    /// Feed one classifier output.
    pub fn observe(&mut self, observed: Pose, now_ms: u64) -> HoldOutcome {
        match (self.state, observed) {
            (HoldState::Idle, Pose::None) => HoldOutcome::Idle,
            (HoldState::Holding { pose, .. }, Pose::None) => {
                debug!("Hold cancelled: {} lost at {}ms", pose.as_str(), now_ms);
                self.state = HoldState::Idle;
                HoldOutcome::Cancelled { pose }
            }
            (HoldState::Holding { pose, started_ms }, new_pose) if pose == new_pose => {
                self.check_elapsed(pose, started_ms, now_ms)
            }
            (_, new_pose) => {
                debug!("Hold started: {} at {}ms", new_pose.as_str(), now_ms);
                self.state = HoldState::Holding {
                    pose: new_pose,
                    started_ms: now_ms,
                };
                HoldOutcome::Holding {
                    pose: new_pose,
                    progress: 0.0,
                }
            }
        }
    }

    /// Timer tick: update progress and detect the threshold crossing between
    /// frames.  A no-op while idle.
    pub fn advance(&mut self, now_ms: u64) -> HoldOutcome {
        match self.state {
            HoldState::Idle => HoldOutcome::Idle,
            HoldState::Holding { pose, started_ms } => self.check_elapsed(pose, started_ms, now_ms),
        }
    }

    /// Discard any in-progress hold without triggering.
    pub fn reset(&mut self) {
        if let HoldState::Holding { pose, .. } = self.state {
            debug!("Hold reset: {} discarded", pose.as_str());
        }
        self.state = HoldState::Idle;
    }

    /// Hold progress in `[0, 1]` at `now_ms`; 0 while idle.
    pub fn progress(&self, now_ms: u64) -> f32 {
        match self.state {
            HoldState::Idle => 0.0,
            HoldState::Holding { started_ms, .. } => self.fraction(started_ms, now_ms),
        }
    }

    /// Whole seconds left on the countdown, rounded up; 0 while idle.
    pub fn remaining_secs(&self, now_ms: u64) -> u64 {
        match self.state {
            HoldState::Idle => 0,
            HoldState::Holding { started_ms, .. } => {
                let elapsed = now_ms.saturating_sub(started_ms);
                self.hold_duration_ms.saturating_sub(elapsed).div_ceil(1000)
            }
        }
    }

    fn fraction(&self, started_ms: u64, now_ms: u64) -> f32 {
        let elapsed = now_ms.saturating_sub(started_ms);
        (elapsed as f64 / self.hold_duration_ms as f64).min(1.0) as f32
    }

    fn check_elapsed(&mut self, pose: Pose, started_ms: u64, now_ms: u64) -> HoldOutcome {
        let elapsed = now_ms.saturating_sub(started_ms);
        if elapsed >= self.hold_duration_ms {
            info!("Hold complete: {} after {}ms", pose.as_str(), elapsed);
            self.state = HoldState::Idle;
            return HoldOutcome::Triggered { pose };
        }
        HoldOutcome::Holding {
            pose,
            progress: self.fraction(started_ms, now_ms),
        }
    }

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self, now_ms: u64) -> String {
        match self.state {
            HoldState::Idle => format!("(:state :idle :hold-ms {})", self.hold_duration_ms),
            HoldState::Holding { pose, started_ms } => format!(
                "(:state :holding :pose :{} :started-ms {} :progress {:.3} :remaining-s {} :hold-ms {})",
                pose.as_str(),
                started_ms,
                self.progress(now_ms),
                self.remaining_secs(now_ms),
                self.hold_duration_ms,
            ),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────
