use std::time::Duration;

use crate::{
    config::ResolverConfig,
    types::{ControlTargets, GestureState, TrackingStatus},
};

/// Turns the latest classification into control targets.
///
/// Pinch scale and fist speed are assigned directly; only the relaxation back to
/// neutral is decayed here. Everything else is left to the render-side smoother.
#[derive(Clone, Debug, Default)]
pub struct TargetResolver {
    cfg: ResolverConfig,
}

impl TargetResolver {
    pub fn new(cfg: ResolverConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.cfg
    }

    pub fn resolve(
        &self,
        prev: ControlTargets,
        gesture: Option<&GestureState>,
        dt_hint: Option<Duration>,
    ) -> ControlTargets {
        let Some(gesture) = gesture else {
            // No new directional information; keep rotation, relax the rest.
            let rate = self.rate_for(self.cfg.search_decay, dt_hint);
            return ControlTargets {
                scale: decay_toward(prev.scale, 1.0, rate),
                speed_multiplier: decay_toward(prev.speed_multiplier, 1.0, rate),
                ..prev
            };
        };

        let scale = if gesture.pinch_active {
            1.0 + gesture.pinch_intensity.clamp(0.0, 1.0) * self.cfg.max_pinch_boost
        } else {
            let rate = self.rate_for(self.cfg.release_decay, dt_hint);
            decay_toward(prev.scale, 1.0, rate)
        };

        let speed_multiplier = if gesture.fist_active {
            self.cfg.speed_boost
        } else {
            1.0
        };

        ControlTargets {
            rot_x: gesture.hand_center.y * self.cfg.rotation_gain_x,
            rot_y: gesture.hand_center.x * self.cfg.rotation_gain_y,
            scale: scale.clamp(1.0, 1.0 + self.cfg.max_pinch_boost),
            speed_multiplier: speed_multiplier.max(1.0),
        }
    }

    /// Rescales a per-tick rate for a detector interval of `dt`.
    ///
    /// `dt == nominal_interval` (or no hint) applies `rate` unchanged; the ratio is
    /// capped at `max_catch_up` so a stalled detector cannot snap to neutral.
    fn rate_for(&self, rate: f32, dt_hint: Option<Duration>) -> f32 {
        let Some(dt) = dt_hint else {
            return rate;
        };
        let nominal = self.cfg.nominal_interval.as_secs_f32();
        if nominal <= 0.0 {
            return rate;
        }
        let ticks = (dt.as_secs_f32() / nominal).clamp(0.0, self.cfg.max_catch_up);
        1.0 - (1.0 - rate).powf(ticks)
    }

    /// Resolver calls without a hand after which a target at `from` is within
    /// `tolerance` of neutral.
    pub fn ticks_to_neutral(&self, from: f32, tolerance: f32) -> u32 {
        ticks_to_settle(self.cfg.search_decay, (from - 1.0).abs(), tolerance)
    }
}

pub fn status_for(gesture: Option<&GestureState>, tracking: bool) -> TrackingStatus {
    match gesture {
        Some(g) => TrackingStatus::derive(tracking, true, g.pinch_active, g.fist_active),
        None => TrackingStatus::derive(tracking, false, false, false),
    }
}

pub(crate) fn decay_toward(current: f32, target: f32, rate: f32) -> f32 {
    current + (target - current) * rate
}

/// Ticks of geometric decay at `rate` needed to shrink `gap` below `tolerance`.
pub fn ticks_to_settle(rate: f32, gap: f32, tolerance: f32) -> u32 {
    if gap <= tolerance {
        return 0;
    }
    if rate >= 1.0 {
        return 1;
    }
    let keep = (1.0 - rate as f64).ln();
    ((tolerance as f64 / gap as f64).ln() / keep).ceil() as u32
}
