use std::time::Instant;

use serde::Deserialize;

pub const NUM_LANDMARKS: usize = 21;

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: None }
    }

    /// Distance in the image plane; depth is ignored.
    pub fn planar_distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Hand {
    pub landmarks: Vec<Landmark>,
    #[serde(default = "default_hand_score")]
    pub score: f32,
}

fn default_hand_score() -> f32 {
    1.0
}

impl Hand {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self {
            landmarks,
            score: default_hand_score(),
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }
}

/// One detector output. An empty `hands` list is the explicit "no hand" signal.
#[derive(Clone, Debug)]
pub struct LandmarkFrame {
    pub hands: Vec<Hand>,
    pub timestamp: Instant,
}

impl LandmarkFrame {
    pub fn new(hands: Vec<Hand>) -> Self {
        Self {
            hands,
            timestamp: Instant::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn single(hand: Hand) -> Self {
        Self::new(vec![hand])
    }

    pub fn primary_hand(&self) -> Option<&Hand> {
        self.hands.first()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandCenter {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureState {
    pub pinch_active: bool,
    pub fist_active: bool,
    pub pinch_intensity: f32,
    pub hand_center: HandCenter,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlTargets {
    pub rot_x: f32,
    pub rot_y: f32,
    pub scale: f32,
    pub speed_multiplier: f32,
}

impl ControlTargets {
    pub const NEUTRAL: ControlTargets = ControlTargets {
        rot_x: 0.0,
        rot_y: 0.0,
        scale: 1.0,
        speed_multiplier: 1.0,
    };
}

impl Default for ControlTargets {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlOutputs {
    pub rot_x: f32,
    pub rot_y: f32,
    pub scale: f32,
    pub speed: f32,
}

impl ControlOutputs {
    pub const NEUTRAL: ControlOutputs = ControlOutputs {
        rot_x: 0.0,
        rot_y: 0.0,
        scale: 1.0,
        speed: 1.0,
    };
}

impl Default for ControlOutputs {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Glow intensities the renderer derives from the smoothed outputs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Energy {
    pub boost: f32,
    pub pinch: f32,
    pub level: f32,
}

impl Energy {
    const SPEED_SPAN: f32 = 3.5;
    const SCALE_SPAN: f32 = 0.9;

    pub fn from_outputs(outputs: &ControlOutputs) -> Self {
        let boost = ((outputs.speed - 1.0) / Self::SPEED_SPAN).clamp(0.0, 1.0);
        let pinch = ((outputs.scale - 1.0) / Self::SCALE_SPAN).clamp(0.0, 1.0);
        let level = (pinch * 0.7 + boost * 0.9).clamp(0.0, 1.0);
        Self {
            boost,
            pinch,
            level,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackingStatus {
    Idle,
    Searching,
    Tracking,
    Pinch,
    FistBoost,
    PinchAndFist,
    Error,
    Denied,
}

impl TrackingStatus {
    /// Level-triggered: a pure function of the latest classification flags.
    pub fn derive(tracking: bool, hand_present: bool, pinch: bool, fist: bool) -> Self {
        if !tracking {
            return TrackingStatus::Idle;
        }
        if !hand_present {
            return TrackingStatus::Searching;
        }
        match (pinch, fist) {
            (true, true) => TrackingStatus::PinchAndFist,
            (false, true) => TrackingStatus::FistBoost,
            (true, false) => TrackingStatus::Pinch,
            (false, false) => TrackingStatus::Tracking,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrackingStatus::Idle => "IDLE",
            TrackingStatus::Searching => "SEARCHING...",
            TrackingStatus::Tracking => "TRACKING",
            TrackingStatus::Pinch => "PINCH",
            TrackingStatus::FistBoost => "FIST BOOST",
            TrackingStatus::PinchAndFist => "PINCH + FIST",
            TrackingStatus::Error => "ERROR",
            TrackingStatus::Denied => "DENIED / ERROR",
        }
    }
}

/// Short user-facing messages for whatever UI hosts the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    RequestingCamera,
    CameraReady,
    CameraBlocked,
    HandLibsMissing,
    TrackingStopped,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::RequestingCamera => "Requesting camera…",
            Notice::CameraReady => "Camera OK.\nPinch = resize • Fist = speed",
            Notice::CameraBlocked => "Camera blocked or unavailable",
            Notice::HandLibsMissing => "Hand libs not loaded",
            Notice::TrackingStopped => "Tracking stopped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_recomputed_from_flags() {
        assert_eq!(
            TrackingStatus::derive(false, true, true, true),
            TrackingStatus::Idle
        );
        assert_eq!(
            TrackingStatus::derive(true, false, true, true),
            TrackingStatus::Searching
        );
        assert_eq!(
            TrackingStatus::derive(true, true, false, false),
            TrackingStatus::Tracking
        );
        assert_eq!(
            TrackingStatus::derive(true, true, true, false),
            TrackingStatus::Pinch
        );
        assert_eq!(
            TrackingStatus::derive(true, true, false, true),
            TrackingStatus::FistBoost
        );
        assert_eq!(
            TrackingStatus::derive(true, true, true, true),
            TrackingStatus::PinchAndFist
        );
    }

    #[test]
    fn energy_is_zero_at_rest_and_saturates() {
        assert_eq!(Energy::from_outputs(&ControlOutputs::NEUTRAL), Energy::default());

        let hot = Energy::from_outputs(&ControlOutputs {
            rot_x: 0.0,
            rot_y: 0.0,
            scale: 1.95,
            speed: 4.0,
        });
        assert_eq!(hot.pinch, 1.0);
        assert!((hot.boost - 3.0 / 3.5).abs() < 1e-6);
        assert_eq!(hot.level, 1.0);
    }
}
