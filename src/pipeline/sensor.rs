use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use super::{recv_latest_frame, shared::SensorState};
use crate::{
    gesture::GestureClassifier,
    resolver::TargetResolver,
    types::{ControlTargets, GestureState, LandmarkFrame},
};

// How long the worker waits for a frame before re-checking the stop flag.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Classify + resolve for one detection, writing the result into shared state.
///
/// Owns the only writable copy of the targets while tracking is active.
pub struct SensorStage {
    classifier: GestureClassifier,
    resolver: TargetResolver,
    shared: Arc<SensorState>,
    targets: ControlTargets,
    last_frame_at: Option<Instant>,
}

impl SensorStage {
    pub(crate) fn new(
        classifier: GestureClassifier,
        resolver: TargetResolver,
        shared: Arc<SensorState>,
    ) -> Self {
        let targets = shared.targets();
        Self {
            classifier,
            resolver,
            shared,
            targets,
            last_frame_at: None,
        }
    }

    /// Standalone stage with its own state, for driving the pipeline by hand.
    pub fn detached(classifier: GestureClassifier, resolver: TargetResolver) -> Self {
        Self::new(classifier, resolver, Arc::new(SensorState::new()))
    }

    pub fn targets(&self) -> ControlTargets {
        self.targets
    }

    /// Processes one detection cycle. `None` is an explicit "no hand" signal.
    ///
    /// The interval since the previous frame is passed to the resolver so decay
    /// keeps its pace when the detector drops or bunches frames.
    pub fn process(&mut self, frame: Option<&LandmarkFrame>) -> Option<GestureState> {
        let dt_hint = match (frame, self.last_frame_at) {
            (Some(frame), Some(last)) => Some(frame.timestamp.saturating_duration_since(last)),
            _ => None,
        };
        if let Some(frame) = frame {
            self.last_frame_at = Some(frame.timestamp);
        }

        let gesture = self.classifier.classify(frame);
        self.targets = self
            .resolver
            .resolve(self.targets, gesture.as_ref(), dt_hint);
        self.shared.publish(&self.targets, gesture.as_ref());
        gesture
    }

    /// Drops back to neutral targets and forgets the last frame time.
    pub fn reset(&mut self) {
        self.targets = ControlTargets::NEUTRAL;
        self.last_frame_at = None;
        self.shared.reset();
    }
}

#[derive(Debug)]
pub(crate) struct SensorWorker {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SensorWorker {
    pub fn spawn(mut stage: SensorStage, frame_rx: Receiver<LandmarkFrame>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let handle = thread::spawn(move || {
            let mut processed: u64 = 0;
            while !stop_flag.load(Ordering::Relaxed) {
                let frame = match recv_latest_frame(&frame_rx, STOP_POLL_INTERVAL) {
                    Ok(frame) => frame,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => {
                        log::info!("pose detector stream closed after {processed} frames");
                        // Still the only writer until this thread returns.
                        stage.reset();
                        break;
                    }
                };
                stage.process(Some(&frame));
                processed += 1;
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("sensor worker panicked");
            }
        }
    }
}

impl Drop for SensorWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
