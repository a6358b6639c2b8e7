//! Hand gesture control signals: landmark frames in, smoothed rotation, scale and
//! speed out.

pub mod config;
pub mod error;
pub mod gesture;
pub mod pipeline;
pub mod resolver;
pub mod smoother;
pub mod types;

pub use config::GestureConfig;
pub use error::{ConfigError, TrackingError};
pub use pipeline::{GestureController, PoseDetector, ScriptedDetector};
pub use types::{ControlOutputs, ControlTargets, GestureState, LandmarkFrame, TrackingStatus};
