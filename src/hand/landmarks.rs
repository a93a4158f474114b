//! 2-D hand landmark data structures.
//!
//! Models the 21-point hand skeleton produced by palm/landmark detectors
//! (wrist, then four points per finger from base to tip).  A frame is
//! either fully valid or absent; partial frames never get past
//! `LandmarkFrame::from_points`.

use tracing::debug;

// ── Landmark definitions ───────────────────────────────────

/// The 21 landmarks of a detected hand, in detector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }
}

// ── Fingers ────────────────────────────────────────────────

/// The five fingers, thumb first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Self::Thumb,
        Self::Index,
        Self::Middle,
        Self::Ring,
        Self::Pinky,
    ];

    /// Fingertip landmark.
    pub fn tip(&self) -> HandLandmark {
        match self {
            Self::Thumb => HandLandmark::ThumbTip,
            Self::Index => HandLandmark::IndexTip,
            Self::Middle => HandLandmark::MiddleTip,
            Self::Ring => HandLandmark::RingTip,
            Self::Pinky => HandLandmark::PinkyTip,
        }
    }

    /// Middle joint used as the pivot of the extension test.
    ///
    /// For the thumb this is the MCP (index 2, the "thumb base"); for the
    /// other fingers it is the PIP.
    pub fn mid_joint(&self) -> HandLandmark {
        match self {
            Self::Thumb => HandLandmark::ThumbMcp,
            Self::Index => HandLandmark::IndexPip,
            Self::Middle => HandLandmark::MiddlePip,
            Self::Ring => HandLandmark::RingPip,
            Self::Pinky => HandLandmark::PinkyPip,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thumb => "thumb",
            Self::Index => "index",
            Self::Middle => "middle",
            Self::Ring => "ring",
            Self::Pinky => "pinky",
        }
    }
}

// ── Point ──────────────────────────────────────────────────

/// A 2-D landmark coordinate (pixel or normalized image space, y down).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// ── Frame ──────────────────────────────────────────────────

/// One validated landmark frame: exactly 21 finite points.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    points: [Point; LANDMARK_COUNT],
}

impl LandmarkFrame {
    /// Validate raw detector output.
    ///
    /// Returns `None` for fewer than 21 points or any non-finite coordinate.
    /// Points past the 21st are ignored.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        if points.len() < LANDMARK_COUNT {
            debug!(
                "landmark frame: expected {} points, got {}",
                LANDMARK_COUNT,
                points.len(),
            );
            return None;
        }
        let mut out = [Point::default(); LANDMARK_COUNT];
        for (i, p) in points.iter().take(LANDMARK_COUNT).enumerate() {
            if !p.is_finite() {
                debug!(index = i, "landmark frame: non-finite point {:?}", p);
                return None;
            }
            out[i] = *p;
        }
        Some(Self { points: out })
    }

    /// Position of a named landmark.
    pub fn get(&self, landmark: HandLandmark) -> Point {
        self.points[landmark.index()]
    }

    pub fn wrist(&self) -> Point {
        self.get(HandLandmark::Wrist)
    }

    pub fn points(&self) -> &[Point; LANDMARK_COUNT] {
        &self.points
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> Vec<Point> {
        (0..n).map(|i| Point::new(i as f32, (i * 2) as f32)).collect()
    }

    #[test]
    fn test_landmark_indices_follow_detector_order() {
        assert_eq!(HandLandmark::Wrist.index(), 0);
        assert_eq!(HandLandmark::ThumbMcp.index(), 2);
        assert_eq!(HandLandmark::ThumbTip.index(), 4);
        assert_eq!(HandLandmark::IndexPip.index(), 6);
        assert_eq!(HandLandmark::IndexTip.index(), 8);
        assert_eq!(HandLandmark::MiddleTip.index(), 12);
        assert_eq!(HandLandmark::RingTip.index(), 16);
        assert_eq!(HandLandmark::PinkyPip.index(), 18);
        assert_eq!(HandLandmark::PinkyTip.index(), 20);
    }

    #[test]
    fn test_finger_joint_table() {
        let pairs: Vec<(usize, usize)> = Finger::ALL
            .iter()
            .map(|f| (f.tip().index(), f.mid_joint().index()))
            .collect();
        assert_eq!(pairs, vec![(4, 2), (8, 6), (12, 10), (16, 14), (20, 18)]);
    }

    #[test]
    fn test_frame_requires_21_points() {
        assert!(LandmarkFrame::from_points(&grid(20)).is_none());
        assert!(LandmarkFrame::from_points(&[]).is_none());
        assert!(LandmarkFrame::from_points(&grid(21)).is_some());
    }

    #[test]
    fn test_frame_ignores_extra_points() {
        let frame = LandmarkFrame::from_points(&grid(25)).unwrap();
        assert_eq!(frame.get(HandLandmark::PinkyTip), Point::new(20.0, 40.0));
    }

    #[test]
    fn test_frame_rejects_non_finite() {
        let mut pts = grid(21);
        pts[7].y = f32::NAN;
        assert!(LandmarkFrame::from_points(&pts).is_none());
        pts[7].y = f32::INFINITY;
        assert!(LandmarkFrame::from_points(&pts).is_none());
    }

    #[test]
    fn test_finger_as_str() {
        assert_eq!(Finger::Thumb.as_str(), "thumb");
        assert_eq!(Finger::Pinky.as_str(), "pinky");
    }
}
