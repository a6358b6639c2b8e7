use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

use crate::error::ConfigError;

/// Geometric thresholds used by the gesture classifier.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Mean fingertip-to-palm distance over wrist-to-palm distance. Lower is stricter.
    pub fist_ratio_threshold: f32,
    /// Thumb-to-index distance under which a pinch is active.
    pub pinch_threshold: f32,
    /// Distance at which pinch intensity reaches zero.
    pub pinch_open: f32,
    /// Distance at which pinch intensity reaches one.
    pub pinch_closed: f32,
    /// Wrist-to-palm distances below this are treated as degenerate.
    pub min_palm_span: f32,
    /// Scale substituted for a degenerate wrist-to-palm distance.
    pub fallback_palm_span: f32,
    /// Hands scored below this by the detector count as absent.
    pub min_hand_score: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            fist_ratio_threshold: 1.15,
            pinch_threshold: 0.055,
            pinch_open: 0.14,
            pinch_closed: 0.04,
            min_palm_span: 1e-4,
            fallback_palm_span: 0.15,
            min_hand_score: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Radians of yaw per unit of horizontal hand offset.
    pub rotation_gain_y: f32,
    /// Radians of pitch per unit of vertical hand offset.
    pub rotation_gain_x: f32,
    pub max_pinch_boost: f32,
    /// Speed multiplier while a fist is held.
    pub speed_boost: f32,
    /// Per-tick fraction of the remaining gap closed while no hand is visible.
    pub search_decay: f32,
    /// Per-tick fraction of the scale gap closed after a pinch is released.
    pub release_decay: f32,
    /// Detector interval at which the decay factors apply unscaled.
    #[serde(with = "millis")]
    pub nominal_interval: Duration,
    /// Upper bound on how many nominal ticks one late frame may catch up.
    pub max_catch_up: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            rotation_gain_y: 2.4,
            rotation_gain_x: 1.6,
            max_pinch_boost: 0.95,
            speed_boost: 4.0,
            search_decay: 0.08,
            release_decay: 0.08,
            nominal_interval: Duration::from_millis(33),
            max_catch_up: 4.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Responsiveness of rotation and scale. Higher reacts faster but jitters more.
    pub alpha: f32,
    /// Responsiveness of speed; kept lower so boosts feel weighty.
    pub speed_alpha: f32,
    /// Base spin per render tick at speed 1.0, in radians.
    pub idle_spin: f32,
    /// Fraction of the yaw spin also applied to pitch.
    pub spin_x_ratio: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            alpha: 0.18,
            speed_alpha: 0.1,
            idle_spin: 0.0045,
            spin_x_ratio: 0.42,
        }
    }
}

/// Options handed to the pose detector when tracking starts.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub max_hands: usize,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            max_hands: 1,
            min_detection_confidence: 0.65,
            min_tracking_confidence: 0.6,
            frame_width: 640,
            frame_height: 480,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub classifier: ClassifierConfig,
    pub resolver: ResolverConfig,
    pub smoothing: SmoothingConfig,
    pub detector: DetectorSettings,
}

impl GestureConfig {
    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let config: GestureConfig =
            serde_json::from_str(raw).context("failed to parse gesture config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read gesture config {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.classifier;
        if c.pinch_closed >= c.pinch_open {
            return Err(ConfigError::InvertedPinchRamp {
                closed: c.pinch_closed,
                open: c.pinch_open,
            });
        }
        at_least("fallback_palm_span", c.fallback_palm_span, f32::EPSILON)?;

        let r = &self.resolver;
        unit_rate("search_decay", r.search_decay)?;
        unit_rate("release_decay", r.release_decay)?;
        at_least("speed_boost", r.speed_boost, 1.0)?;
        at_least("max_pinch_boost", r.max_pinch_boost, 0.0)?;
        at_least("max_catch_up", r.max_catch_up, 1.0)?;

        let s = &self.smoothing;
        unit_rate("alpha", s.alpha)?;
        unit_rate("speed_alpha", s.speed_alpha)?;
        at_least("idle_spin", s.idle_spin, 0.0)?;

        Ok(())
    }
}

fn unit_rate(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::RateOutOfRange { name, value })
    }
}

fn at_least(name: &'static str, value: f32, min: f32) -> Result<(), ConfigError> {
    // Written so NaN fails too.
    if value >= min {
        Ok(())
    } else {
        Err(ConfigError::BelowMinimum { name, value, min })
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
