use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::types::{ControlTargets, GestureState};

/// `f32` stored as its bit pattern.
#[derive(Debug)]
pub(crate) struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

/// State written by the sensor path and read by the render tick.
///
/// Every field has exactly one writer: the sensor worker while tracking, the
/// controller once the worker has been joined. Readers may see a mix of two
/// consecutive updates across fields, never a torn value within one.
#[derive(Debug)]
pub(crate) struct SensorState {
    rot_x: AtomicF32,
    rot_y: AtomicF32,
    scale: AtomicF32,
    speed_multiplier: AtomicF32,
    hand_present: AtomicBool,
    pinch: AtomicBool,
    fist: AtomicBool,
}

impl SensorState {
    pub fn new() -> Self {
        let n = ControlTargets::NEUTRAL;
        Self {
            rot_x: AtomicF32::new(n.rot_x),
            rot_y: AtomicF32::new(n.rot_y),
            scale: AtomicF32::new(n.scale),
            speed_multiplier: AtomicF32::new(n.speed_multiplier),
            hand_present: AtomicBool::new(false),
            pinch: AtomicBool::new(false),
            fist: AtomicBool::new(false),
        }
    }

    pub fn targets(&self) -> ControlTargets {
        ControlTargets {
            rot_x: self.rot_x.load(),
            rot_y: self.rot_y.load(),
            scale: self.scale.load(),
            speed_multiplier: self.speed_multiplier.load(),
        }
    }

    pub fn publish(&self, targets: &ControlTargets, gesture: Option<&GestureState>) {
        self.rot_x.store(targets.rot_x);
        self.rot_y.store(targets.rot_y);
        self.scale.store(targets.scale);
        self.speed_multiplier.store(targets.speed_multiplier);

        let (present, pinch, fist) = gesture
            .map(|g| (true, g.pinch_active, g.fist_active))
            .unwrap_or((false, false, false));
        self.hand_present.store(present, Ordering::Release);
        self.pinch.store(pinch, Ordering::Release);
        self.fist.store(fist, Ordering::Release);
    }

    /// `(hand_present, pinch, fist)` from the latest classification.
    pub fn flags(&self) -> (bool, bool, bool) {
        (
            self.hand_present.load(Ordering::Acquire),
            self.pinch.load(Ordering::Acquire),
            self.fist.load(Ordering::Acquire),
        )
    }

    pub fn reset(&self) {
        self.publish(&ControlTargets::NEUTRAL, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HandCenter;

    #[test]
    fn atomic_f32_keeps_exact_bits() {
        let cell = AtomicF32::new(1.0);
        for v in [0.0, -0.0, 1.95, f32::MIN_POSITIVE, -3.25] {
            cell.store(v);
            assert_eq!(cell.load().to_bits(), v.to_bits());
        }
    }

    #[test]
    fn publish_then_reset() {
        let state = SensorState::new();
        let targets = ControlTargets {
            rot_x: 0.2,
            rot_y: -0.3,
            scale: 1.4,
            speed_multiplier: 4.0,
        };
        let gesture = GestureState {
            pinch_active: true,
            fist_active: true,
            pinch_intensity: 0.5,
            hand_center: HandCenter::default(),
        };

        state.publish(&targets, Some(&gesture));
        assert_eq!(state.targets(), targets);
        assert_eq!(state.flags(), (true, true, true));

        state.reset();
        assert_eq!(state.targets(), ControlTargets::NEUTRAL);
        assert_eq!(state.flags(), (false, false, false));
    }
}
