use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};

use super::{
    PoseDetector,
    sensor::{SensorStage, SensorWorker},
    shared::SensorState,
};
use crate::{
    config::{DetectorSettings, GestureConfig},
    error::TrackingError,
    gesture::GestureClassifier,
    resolver::TargetResolver,
    smoother::Smoother,
    types::{ControlOutputs, ControlTargets, Energy, Notice, TrackingStatus},
};

/// Owns both halves of the pipeline.
///
/// The sensor half runs on a worker thread fed by the detector and writes targets;
/// the render half is [`GestureController::render_tick`], called by the host's
/// animation loop, and is the only writer of the outputs.
pub struct GestureController {
    classifier: GestureClassifier,
    resolver: TargetResolver,
    settings: DetectorSettings,
    detector: Option<Box<dyn PoseDetector>>,
    shared: Arc<SensorState>,
    worker: Option<SensorWorker>,
    smoother: Smoother,
    failure: Option<TrackingStatus>,
    last_status: TrackingStatus,
    notice_tx: Sender<Notice>,
    notice_rx: Receiver<Notice>,
}

impl GestureController {
    pub fn new(config: GestureConfig) -> Self {
        let (notice_tx, notice_rx) = unbounded();
        Self {
            classifier: GestureClassifier::new(config.classifier),
            resolver: TargetResolver::new(config.resolver),
            settings: config.detector,
            detector: None,
            shared: Arc::new(SensorState::new()),
            worker: None,
            smoother: Smoother::new(config.smoothing),
            failure: None,
            last_status: TrackingStatus::Idle,
            notice_tx,
            notice_rx,
        }
    }

    pub fn with_detector<D: PoseDetector>(mut self, detector: D) -> Self {
        self.detector = Some(Box::new(detector));
        self
    }

    /// Opens the detector and starts the sensor worker. Fails fast and leaves
    /// tracking stopped if the detector cannot be opened; calling again retries.
    pub fn start(&mut self) -> Result<(), TrackingError> {
        if self.is_tracking() {
            return Ok(());
        }
        // A worker whose stream ended on its own still needs joining.
        if let Some(stale) = self.worker.take() {
            stale.stop();
        }

        self.notify(Notice::RequestingCamera);

        let opened = match self.detector.as_mut() {
            Some(detector) => detector.open(&self.settings),
            None => Err(TrackingError::DetectorUnavailable(
                "no pose detector configured".to_string(),
            )),
        };

        let frame_rx = match opened {
            Ok(frame_rx) => frame_rx,
            Err(err) => {
                log::warn!("failed to start hand tracking: {err}");
                self.failure = Some(err.status());
                self.notify(err.notice());
                return Err(err);
            }
        };

        let stage = SensorStage::new(
            self.classifier.clone(),
            self.resolver.clone(),
            self.shared.clone(),
        );
        self.worker = Some(SensorWorker::spawn(stage, frame_rx));
        self.failure = None;
        self.notify(Notice::CameraReady);
        log::info!("hand tracking started");
        Ok(())
    }

    /// Releases the detector and relaxes targets to neutral. Safe to call any
    /// number of times.
    pub fn stop(&mut self) {
        if let Some(detector) = self.detector.as_mut() {
            detector.close();
        }
        if let Some(worker) = self.worker.take() {
            worker.stop();
            self.notify(Notice::TrackingStopped);
            log::info!("hand tracking stopped");
        }
        // The worker is joined, so this thread is now the only writer.
        self.shared.reset();
        self.failure = None;
    }

    pub fn is_tracking(&self) -> bool {
        self.worker
            .as_ref()
            .map(SensorWorker::is_running)
            .unwrap_or(false)
    }

    /// One animation frame: reads the latest targets and advances the outputs.
    pub fn render_tick(&mut self) -> ControlOutputs {
        let targets = self.shared.targets();
        let outputs = self.smoother.tick(&targets);

        let status = self.status();
        if status != self.last_status {
            log::debug!(
                "status {} -> {}",
                self.last_status.label(),
                status.label()
            );
            self.last_status = status;
        }

        outputs
    }

    pub fn outputs(&self) -> ControlOutputs {
        self.smoother.outputs()
    }

    pub fn targets(&self) -> ControlTargets {
        self.shared.targets()
    }

    pub fn energy(&self) -> Energy {
        Energy::from_outputs(&self.smoother.outputs())
    }

    pub fn status(&self) -> TrackingStatus {
        if let Some(failure) = self.failure {
            return failure;
        }
        let (hand_present, pinch, fist) = self.shared.flags();
        TrackingStatus::derive(self.is_tracking(), hand_present, pinch, fist)
    }

    pub fn notices(&self) -> Receiver<Notice> {
        self.notice_rx.clone()
    }

    fn notify(&self, notice: Notice) {
        log::debug!("notice: {}", notice.message().replace('\n', " "));
        let _ = self.notice_tx.send(notice);
    }
}

impl Drop for GestureController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        thread,
        time::{Duration, Instant},
    };

    use super::*;
    use crate::{
        pipeline::{ScriptedDetector, fist_hand, open_hand},
        types::LandmarkFrame,
    };

    /// Detector whose frames are pushed by the test.
    struct ManualDetector {
        #[allow(dead_code)]
        frame_tx: Option<Sender<LandmarkFrame>>,
        handoff: Sender<Sender<LandmarkFrame>>,
        fail_with: Option<fn() -> TrackingError>,
    }

    impl PoseDetector for ManualDetector {
        fn open(
            &mut self,
            _settings: &DetectorSettings,
        ) -> Result<Receiver<LandmarkFrame>, TrackingError> {
            if let Some(make_err) = self.fail_with {
                return Err(make_err());
            }
            let (tx, rx) = unbounded();
            let _ = self.handoff.send(tx.clone());
            self.frame_tx = Some(tx);
            Ok(rx)
        }

        fn close(&mut self) {
            self.frame_tx = None;
        }
    }

    fn manual(
        fail_with: Option<fn() -> TrackingError>,
    ) -> (ManualDetector, Receiver<Sender<LandmarkFrame>>) {
        let (handoff, senders) = unbounded();
        (
            ManualDetector {
                frame_tx: None,
                handoff,
                fail_with,
            },
            senders,
        )
    }

    fn wait_for(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        done()
    }

    #[test]
    fn starts_idle() {
        let controller = GestureController::new(GestureConfig::default());
        assert_eq!(controller.status(), TrackingStatus::Idle);
        assert!(!controller.is_tracking());
        assert_eq!(controller.outputs(), ControlOutputs::NEUTRAL);
    }

    #[test]
    fn missing_detector_fails_into_error() {
        let mut controller = GestureController::new(GestureConfig::default());
        let notices = controller.notices();

        let err = controller.start().unwrap_err();
        assert!(matches!(err, TrackingError::DetectorUnavailable(_)));
        assert_eq!(controller.status(), TrackingStatus::Error);
        assert!(!controller.is_tracking());

        let seen: Vec<Notice> = notices.try_iter().collect();
        assert_eq!(seen, vec![Notice::RequestingCamera, Notice::HandLibsMissing]);

        // Render loop keeps working at neutral.
        let out = controller.render_tick();
        assert_eq!(out.scale, 1.0);
        assert_eq!(out.speed, 1.0);
    }

    #[test]
    fn denied_camera_reports_distinct_status_and_can_retry() {
        let (detector, _senders) = manual(Some(|| TrackingError::PermissionDenied));
        let mut controller =
            GestureController::new(GestureConfig::default()).with_detector(detector);

        assert!(matches!(
            controller.start(),
            Err(TrackingError::PermissionDenied)
        ));
        assert_eq!(controller.status(), TrackingStatus::Denied);
        assert!(matches!(
            controller.start(),
            Err(TrackingError::PermissionDenied)
        ));
        assert!(!controller.is_tracking());
    }

    #[test]
    fn frames_flow_from_worker_to_outputs() {
        let (detector, senders) = manual(None);
        let mut controller =
            GestureController::new(GestureConfig::default()).with_detector(detector);
        controller.start().unwrap();
        assert!(controller.is_tracking());
        assert_eq!(controller.status(), TrackingStatus::Searching);

        let frame_tx = senders.recv_timeout(Duration::from_secs(1)).unwrap();
        frame_tx
            .send(LandmarkFrame::single(fist_hand(0.5, 0.5, 0.5)))
            .unwrap();
        assert!(wait_for(|| controller.status() == TrackingStatus::FistBoost));
        assert_eq!(controller.targets().speed_multiplier, 4.0);

        let first = controller.render_tick();
        assert!(first.speed > 1.0 && first.speed < 4.0);
        for _ in 0..200 {
            controller.render_tick();
        }
        assert!((controller.outputs().speed - 4.0).abs() < 1e-3);
        assert!(controller.energy().boost > 0.8);

        frame_tx
            .send(LandmarkFrame::single(open_hand(0.5, 0.5)))
            .unwrap();
        assert!(wait_for(|| controller.status() == TrackingStatus::Tracking));
    }

    #[test]
    fn stop_is_idempotent_and_relaxes() {
        let (detector, senders) = manual(None);
        let mut controller =
            GestureController::new(GestureConfig::default()).with_detector(detector);
        let notices = controller.notices();
        controller.start().unwrap();

        let frame_tx = senders.recv_timeout(Duration::from_secs(1)).unwrap();
        frame_tx
            .send(LandmarkFrame::single(fist_hand(0.8, 0.2, 0.5)))
            .unwrap();
        assert!(wait_for(|| controller.targets().speed_multiplier == 4.0));
        for _ in 0..10 {
            controller.render_tick();
        }

        controller.stop();
        let once = (
            controller.status(),
            controller.is_tracking(),
            controller.targets(),
            controller.outputs(),
        );
        controller.stop();
        let twice = (
            controller.status(),
            controller.is_tracking(),
            controller.targets(),
            controller.outputs(),
        );
        assert_eq!(once, twice);
        assert_eq!(once.0, TrackingStatus::Idle);
        assert_eq!(once.2, ControlTargets::NEUTRAL);

        let stopped = notices
            .try_iter()
            .filter(|n| *n == Notice::TrackingStopped)
            .count();
        assert_eq!(stopped, 1);

        // Outputs relax toward neutral instead of freezing at the last pose.
        let before = controller.outputs().speed;
        let after = controller.render_tick().speed;
        assert!(after < before);
    }

    #[test]
    fn restart_after_stop_reopens_detector() {
        let (detector, senders) = manual(None);
        let mut controller =
            GestureController::new(GestureConfig::default()).with_detector(detector);
        controller.start().unwrap();
        controller.start().unwrap();
        controller.stop();
        controller.start().unwrap();
        assert!(controller.is_tracking());
        assert_eq!(senders.try_iter().count(), 2);
    }

    #[test]
    fn finished_stream_drops_back_to_idle() {
        let detector = ScriptedDetector::new(vec![Some(fist_hand(0.8, 0.2, 0.5))], 200);
        let mut controller =
            GestureController::new(GestureConfig::default()).with_detector(detector);
        controller.start().unwrap();
        assert!(wait_for(|| !controller.is_tracking()));
        assert_eq!(controller.status(), TrackingStatus::Idle);
        assert_eq!(controller.targets(), ControlTargets::NEUTRAL);

        // Outputs relax instead of spinning at fist boost under an idle label.
        for _ in 0..500 {
            controller.render_tick();
        }
        assert!((controller.outputs().speed - 1.0).abs() < 1e-3);
        assert!((controller.outputs().scale - 1.0).abs() < 1e-3);
        controller.start().unwrap();
        controller.stop();
    }
}
