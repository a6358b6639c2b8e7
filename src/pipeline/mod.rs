mod controller;
mod scripted;
mod sensor;
mod shared;

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::{config::DetectorSettings, error::TrackingError, types::LandmarkFrame};

// Re-exports for convenience
pub use controller::GestureController;
pub use scripted::{ScriptedDetector, demo_script, fist_hand, open_hand, pinch_hand};
pub use sensor::SensorStage;

/// The external hand tracker. `open` acquires the camera and model and returns
/// the stream of detections; a frame without hands means "no hand this cycle".
pub trait PoseDetector: Send + 'static {
    fn open(
        &mut self,
        settings: &DetectorSettings,
    ) -> Result<Receiver<LandmarkFrame>, TrackingError>;

    /// Releases the camera. Dropping the sender ends the stream.
    fn close(&mut self);
}

/// Waits up to `timeout` for a frame, then drops any stale frames queued behind it.
fn recv_latest_frame(
    frame_rx: &Receiver<LandmarkFrame>,
    timeout: Duration,
) -> Result<LandmarkFrame, RecvTimeoutError> {
    let mut frame = frame_rx.recv_timeout(timeout)?;
    while let Ok(newer) = frame_rx.try_recv() {
        frame = newer;
    }
    Ok(frame)
}
