use std::f32::consts::TAU;

use crate::{
    config::SmoothingConfig,
    resolver::{decay_toward, ticks_to_settle},
    types::{ControlOutputs, ControlTargets},
};

/// Render-side exponential smoothing. Ticked once per drawn frame, independent of
/// how often the detector delivers.
#[derive(Clone, Debug)]
pub struct Smoother {
    cfg: SmoothingConfig,
    outputs: ControlOutputs,
    pose: (f32, f32),
    spin: (f32, f32),
}

impl Smoother {
    pub fn new(cfg: SmoothingConfig) -> Self {
        Self {
            cfg,
            outputs: ControlOutputs::NEUTRAL,
            pose: (0.0, 0.0),
            spin: (0.0, 0.0),
        }
    }

    pub fn outputs(&self) -> ControlOutputs {
        self.outputs
    }

    pub fn tick(&mut self, targets: &ControlTargets) -> ControlOutputs {
        let cfg = &self.cfg;
        let out = &mut self.outputs;

        out.speed = decay_toward(out.speed, targets.speed_multiplier, cfg.speed_alpha).max(1.0);
        out.scale = decay_toward(out.scale, targets.scale, cfg.alpha).max(1.0);

        self.pose.0 = decay_toward(self.pose.0, targets.rot_x, cfg.alpha);
        self.pose.1 = decay_toward(self.pose.1, targets.rot_y, cfg.alpha);

        // Spin accumulates outside the smoothed pose so it never settles; a fist
        // speeds it up. Wrapped to keep f32 precision over long sessions.
        let spin = cfg.idle_spin * out.speed;
        self.spin.0 = (self.spin.0 + spin * cfg.spin_x_ratio) % TAU;
        self.spin.1 = (self.spin.1 + spin) % TAU;

        out.rot_x = self.pose.0 + self.spin.0;
        out.rot_y = self.pose.1 + self.spin.1;

        *out
    }

    /// Render ticks until scale and speed are within `tolerance` of a constant
    /// target, starting from a gap of `gap`.
    pub fn ticks_to_converge(&self, gap: f32, tolerance: f32) -> u32 {
        let slowest = self.cfg.alpha.min(self.cfg.speed_alpha);
        ticks_to_settle(slowest, gap.abs(), tolerance)
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(SmoothingConfig::default())
    }
}
