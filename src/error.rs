use thiserror::Error;

use crate::types::{Notice, TrackingStatus};

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("hand detector unavailable: {0}")]
    DetectorUnavailable(String),
    #[error("camera access denied")]
    PermissionDenied,
    #[error("camera device error: {0}")]
    Device(String),
}

impl TrackingError {
    /// Status the controller parks in after a failed start.
    pub fn status(&self) -> TrackingStatus {
        match self {
            TrackingError::DetectorUnavailable(_) => TrackingStatus::Error,
            TrackingError::PermissionDenied | TrackingError::Device(_) => TrackingStatus::Denied,
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            TrackingError::DetectorUnavailable(_) => Notice::HandLibsMissing,
            TrackingError::PermissionDenied | TrackingError::Device(_) => Notice::CameraBlocked,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("pinch ramp is inverted: closed {closed} must be below open {open}")]
    InvertedPinchRamp { closed: f32, open: f32 },
    #[error("{name} must be in (0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f32 },
    #[error("{name} must be at least {min}, got {value}")]
    BelowMinimum {
        name: &'static str,
        value: f32,
        min: f32,
    },
}
