//! Static pose classification from a single landmark frame.
//!
//! Recognizes thumbs up, thumbs down, and flat hand.  Each finger is tested
//! for extension by the angle at its middle joint; the thumb additionally
//! gets a "pointing down" test combining an angle and a position signal.
//! Classification is a pure function of the frame.

use std::f32::consts::FRAC_PI_2;

use super::geometry::{angle_between, vector};
use super::landmarks::{Finger, HandLandmark, LandmarkFrame, Point};

/// Thumb bend (radians) past which the thumb counts as pointing down: 100°.
pub const THUMB_DOWN_ANGLE: f32 = 5.0 * std::f32::consts::PI / 9.0;

// ── Pose types ─────────────────────────────────────────────

/// Recognized hand poses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Pose {
    ThumbsUp,
    ThumbsDown,
    FlatHand,
    /// No hand, malformed landmarks, or no rule matched.
    #[default]
    None,
}

impl Pose {
    /// String representation for IPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThumbsUp => "thumbs-up",
            Self::ThumbsDown => "thumbs-down",
            Self::FlatHand => "flat-hand",
            Self::None => "none",
        }
    }

    /// Short label shown next to the live camera view.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ThumbsUp => "Easy",
            Self::ThumbsDown => "Wrong",
            Self::FlatHand => "Hard",
            Self::None => "",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

// ── Per-finger predicates ──────────────────────────────────

/// Whether a finger is extended.
///
/// True iff the angle between (tip - mid) and (mid - wrist) is strictly below
/// 90°.  A curled finger bends back toward the palm and produces an angle of
/// 90° or more.  Coincident points make the angle undefined, which counts as
/// not extended.
pub fn is_finger_extended(tip: Point, mid: Point, wrist: Point) -> bool {
    let finger = vector(mid, tip);
    let palm = vector(wrist, mid);
    matches!(angle_between(finger, palm), Some(angle) if angle < FRAC_PI_2)
}

/// Whether the thumb is pointing down.
///
/// Either signal is sufficient:
/// - the thumb bends more than 100° away from the wrist→base direction, or
/// - the tip sits lower on screen (larger y) than both the wrist and the base.
///
/// Degenerate geometry (base coincident with wrist or tip) is never down.
pub fn is_thumb_down(tip: Point, base: Point, wrist: Point) -> bool {
    let wrist_to_base = vector(wrist, base);
    let base_to_tip = vector(base, tip);
    let Some(angle) = angle_between(wrist_to_base, base_to_tip) else {
        return false;
    };

    let below_wrist = tip.y > wrist.y;
    let pointing_downward = tip.y > base.y;

    angle > THUMB_DOWN_ANGLE || (below_wrist && pointing_downward)
}

// ── Frame-level classification ─────────────────────────────

/// Extension flags for all fingers plus the thumb-down signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerStates {
    /// Indexed in `Finger::ALL` order (thumb first).
    pub extended: [bool; 5],
    pub thumb_down: bool,
}

impl FingerStates {
    /// Evaluate every predicate for one frame.
    pub fn from_frame(frame: &LandmarkFrame) -> Self {
        let wrist = frame.wrist();
        let mut extended = [false; 5];
        for (slot, finger) in extended.iter_mut().zip(Finger::ALL) {
            *slot = is_finger_extended(
                frame.get(finger.tip()),
                frame.get(finger.mid_joint()),
                wrist,
            );
        }
        let thumb_down = is_thumb_down(
            frame.get(HandLandmark::ThumbTip),
            frame.get(HandLandmark::ThumbMcp),
            wrist,
        );
        Self {
            extended,
            thumb_down,
        }
    }

    pub fn is_extended(&self, finger: Finger) -> bool {
        self.extended[finger as usize]
    }

    /// Whether any of index, middle, ring, pinky is extended.
    fn any_other_extended(&self) -> bool {
        self.extended[1..].iter().any(|&e| e)
    }

    /// Apply the precedence rules: thumbs up, then thumbs down, then flat hand.
    pub fn pose(&self) -> Pose {
        let thumb = self.is_extended(Finger::Thumb);

        if thumb && !self.any_other_extended() && !self.thumb_down {
            return Pose::ThumbsUp;
        }

        // Checked before flat hand: an open hand tipping downward reports as
        // thumbs down.
        if self.thumb_down {
            return Pose::ThumbsDown;
        }

        if self.extended.iter().all(|&e| e) {
            return Pose::FlatHand;
        }

        Pose::None
    }

    /// Compact s-expression for debug output.
    pub fn sexp(&self) -> String {
        let mut s = String::from("(");
        for (i, finger) in Finger::ALL.iter().enumerate() {
            if i > 0 {
                s.push(' ');
            }
            s.push_str(&format!(
                ":{} {}",
                finger.as_str(),
                if self.extended[i] { "t" } else { "nil" }
            ));
        }
        s.push_str(&format!(
            " :thumb-down {})",
            if self.thumb_down { "t" } else { "nil" }
        ));
        s
    }
}

/// Classify one frame.  An absent frame is `Pose::None`.
pub fn classify(frame: Option<&LandmarkFrame>) -> Pose {
    match frame {
        Some(frame) => FingerStates::from_frame(frame).pose(),
        None => Pose::None,
    }
}

/// Validate raw detector points and classify them.
pub fn classify_points(points: &[Point]) -> Pose {
    classify(LandmarkFrame::from_points(points).as_ref())
}

// ── Test helpers ───────────────────────────────────────────

/// Build a 21-point hand from a wrist and (mid joint, tip) pairs per finger.
/// Landmarks the classifier does not read are placed on the wrist.
#[cfg(test)]
pub(crate) fn make_hand(wrist: (f32, f32), fingers: [((f32, f32), (f32, f32)); 5]) -> Vec<Point> {
    let mut points = vec![Point::new(wrist.0, wrist.1); super::landmarks::LANDMARK_COUNT];
    for (finger, (mid, tip)) in Finger::ALL.iter().zip(fingers) {
        points[finger.mid_joint().index()] = Point::new(mid.0, mid.1);
        points[finger.tip().index()] = Point::new(tip.0, tip.1);
    }
    points
}

/// Thumb up and away from the palm, other fingertips curled back down.
#[cfg(test)]
pub(crate) fn thumbs_up_hand() -> Vec<Point> {
    make_hand(
        (100.0, 200.0),
        [
            ((70.0, 150.0), (60.0, 90.0)),
            ((100.0, 130.0), (100.0, 170.0)),
            ((110.0, 130.0), (110.0, 170.0)),
            ((120.0, 135.0), (120.0, 172.0)),
            ((130.0, 140.0), (130.0, 175.0)),
        ],
    )
}

/// Thumb hanging below wrist and base, other fingers curled.
#[cfg(test)]
pub(crate) fn thumbs_down_hand() -> Vec<Point> {
    make_hand(
        (100.0, 100.0),
        [
            ((80.0, 140.0), (75.0, 190.0)),
            ((100.0, 140.0), (100.0, 120.0)),
            ((110.0, 140.0), (110.0, 120.0)),
            ((120.0, 140.0), (120.0, 122.0)),
            ((130.0, 135.0), (130.0, 120.0)),
        ],
    )
}

/// All five fingers straight up.
#[cfg(test)]
pub(crate) fn flat_hand() -> Vec<Point> {
    make_hand(
        (100.0, 200.0),
        [
            ((60.0, 160.0), (30.0, 120.0)),
            ((90.0, 110.0), (90.0, 60.0)),
            ((100.0, 105.0), (100.0, 50.0)),
            ((110.0, 110.0), (112.0, 60.0)),
            ((125.0, 120.0), (130.0, 80.0)),
        ],
    )
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    // ── Predicates ──────────────────────────────────────────

    #[test]
    fn test_finger_extended_straight() {
        assert!(is_finger_extended(p(0.0, -100.0), p(0.0, -50.0), p(0.0, 0.0)));
    }

    #[test]
    fn test_finger_curled_back() {
        assert!(!is_finger_extended(p(0.0, -30.0), p(0.0, -50.0), p(0.0, 0.0)));
    }

    #[test]
    fn test_finger_bent_past_right_angle() {
        assert!(!is_finger_extended(p(30.0, -45.0), p(0.0, -50.0), p(0.0, 0.0)));
    }

    #[test]
    fn test_finger_degenerate_is_not_extended() {
        assert!(!is_finger_extended(p(1.0, 1.0), p(1.0, 1.0), p(0.0, 0.0)));
        assert!(!is_finger_extended(p(0.0, -5.0), p(0.0, 0.0), p(0.0, 0.0)));
    }

    #[test]
    fn test_thumb_down_by_position() {
        assert!(is_thumb_down(p(75.0, 190.0), p(80.0, 140.0), p(100.0, 100.0)));
    }

    #[test]
    fn test_thumb_down_by_angle_only() {
        // Base above wrist, tip folded back past 100° but still above the wrist.
        assert!(is_thumb_down(p(100.0, 190.0), p(100.0, 150.0), p(100.0, 200.0)));
    }

    #[test]
    fn test_thumb_below_wrist_but_not_below_base() {
        // Tip lower than wrist, higher than base, bend under 100°.
        assert!(!is_thumb_down(p(0.0, 205.0), p(50.0, 210.0), p(100.0, 200.0)));
    }

    #[test]
    fn test_thumb_up_is_not_down() {
        assert!(!is_thumb_down(p(60.0, 90.0), p(70.0, 150.0), p(100.0, 200.0)));
    }

    #[test]
    fn test_thumb_down_degenerate() {
        assert!(!is_thumb_down(p(100.0, 300.0), p(100.0, 200.0), p(100.0, 200.0)));
        assert!(!is_thumb_down(p(80.0, 140.0), p(80.0, 140.0), p(100.0, 100.0)));
    }

    // ── Classification ──────────────────────────────────────

    #[test]
    fn test_absent_frame_is_none() {
        assert_eq!(classify(None), Pose::None);
    }

    #[test]
    fn test_short_frame_is_none() {
        let mut pts = thumbs_up_hand();
        pts.truncate(20);
        assert_eq!(classify_points(&pts), Pose::None);
        assert_eq!(classify_points(&[]), Pose::None);
    }

    #[test]
    fn test_thumbs_up_detection() {
        assert_eq!(classify_points(&thumbs_up_hand()), Pose::ThumbsUp);
    }

    #[test]
    fn test_thumbs_down_detection() {
        assert_eq!(classify_points(&thumbs_down_hand()), Pose::ThumbsDown);
    }

    #[test]
    fn test_thumbs_down_wins_over_open_hand() {
        // Every finger extended, pointing down the image.
        let pts = make_hand(
            (100.0, 100.0),
            [
                ((80.0, 140.0), (75.0, 190.0)),
                ((95.0, 150.0), (95.0, 200.0)),
                ((105.0, 150.0), (105.0, 205.0)),
                ((115.0, 150.0), (115.0, 200.0)),
                ((125.0, 145.0), (125.0, 190.0)),
            ],
        );
        let frame = LandmarkFrame::from_points(&pts).unwrap();
        let states = FingerStates::from_frame(&frame);
        assert!(states.extended.iter().all(|&e| e));
        assert!(states.thumb_down);
        assert_eq!(states.pose(), Pose::ThumbsDown);
    }

    #[test]
    fn test_flat_hand_detection() {
        assert_eq!(classify_points(&flat_hand()), Pose::FlatHand);
    }

    #[test]
    fn test_partial_open_hand_is_none() {
        // Thumb and index extended, the rest curled: no rule matches.
        let pts = make_hand(
            (100.0, 200.0),
            [
                ((60.0, 160.0), (30.0, 120.0)),
                ((90.0, 110.0), (90.0, 60.0)),
                ((110.0, 130.0), (110.0, 170.0)),
                ((120.0, 135.0), (120.0, 172.0)),
                ((130.0, 140.0), (130.0, 175.0)),
            ],
        );
        assert_eq!(classify_points(&pts), Pose::None);
    }

    #[test]
    fn test_all_points_coincident_is_none() {
        let pts = vec![p(50.0, 50.0); 21];
        assert_eq!(classify_points(&pts), Pose::None);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let frame = LandmarkFrame::from_points(&thumbs_up_hand()).unwrap();
        let first = classify(Some(&frame));
        let second = classify(Some(&frame));
        assert_eq!(first, second);
        assert_eq!(first, Pose::ThumbsUp);
    }

    #[test]
    fn test_finger_states_sexp() {
        let frame = LandmarkFrame::from_points(&thumbs_up_hand()).unwrap();
        let sexp = FingerStates::from_frame(&frame).sexp();
        assert!(sexp.contains(":thumb t"));
        assert!(sexp.contains(":index nil"));
        assert!(sexp.contains(":thumb-down nil"));
        assert!(lexpr::from_str(&sexp).is_ok());
    }

    #[test]
    fn test_pose_as_str_and_label() {
        assert_eq!(Pose::ThumbsUp.as_str(), "thumbs-up");
        assert_eq!(Pose::ThumbsDown.as_str(), "thumbs-down");
        assert_eq!(Pose::FlatHand.as_str(), "flat-hand");
        assert_eq!(Pose::None.as_str(), "none");
        assert_eq!(Pose::ThumbsUp.label(), "Easy");
        assert_eq!(Pose::ThumbsDown.label(), "Wrong");
        assert_eq!(Pose::FlatHand.label(), "Hard");
        assert!(Pose::default().is_none());
    }
}
