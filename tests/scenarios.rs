use std::{
    thread,
    time::{Duration, Instant},
};

use gesture_signal::{
    ControlTargets, GestureConfig, GestureController, LandmarkFrame, ScriptedDetector,
    TrackingStatus,
    gesture::{GestureClassifier, pinch_intensity},
    pipeline::{SensorStage, fist_hand, open_hand, pinch_hand},
    resolver::{TargetResolver, status_for},
    smoother::Smoother,
};

fn stage() -> SensorStage {
    SensorStage::detached(GestureClassifier::default(), TargetResolver::default())
}

fn wait_for(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    done()
}

#[test]
fn open_hand_at_center_keeps_neutral_targets() {
    let mut stage = stage();
    let gesture = stage
        .process(Some(&LandmarkFrame::single(open_hand(0.5, 0.5))))
        .expect("hand should be detected");

    assert!(!gesture.fist_active);
    assert!(!gesture.pinch_active);
    assert_eq!(stage.targets(), ControlTargets::NEUTRAL);
    assert_eq!(status_for(Some(&gesture), true), TrackingStatus::Tracking);
}

#[test]
fn open_hand_reports_tracking_through_the_controller() {
    let detector = ScriptedDetector::new(vec![Some(open_hand(0.5, 0.5))], 60).looping(true);
    let mut controller = GestureController::new(GestureConfig::default()).with_detector(detector);
    controller.start().unwrap();

    assert!(wait_for(|| controller.status() == TrackingStatus::Tracking));
    assert_eq!(controller.targets(), ControlTargets::NEUTRAL);
    controller.stop();
    assert_eq!(controller.status(), TrackingStatus::Idle);
}

#[test]
fn pinch_sets_scale_target_without_decay() {
    let config = GestureConfig::default();
    let mut stage = stage();

    let gesture = stage
        .process(Some(&LandmarkFrame::single(pinch_hand(0.5, 0.5, 0.02))))
        .unwrap();
    assert!(gesture.pinch_active);

    let expected_intensity = pinch_intensity(
        0.02,
        config.classifier.pinch_open,
        config.classifier.pinch_closed,
    );
    assert_eq!(expected_intensity, 1.0);
    assert!((gesture.pinch_intensity - expected_intensity).abs() < 1e-5);

    let expected_scale = 1.0 + expected_intensity * config.resolver.max_pinch_boost;
    assert!((stage.targets().scale - expected_scale).abs() < 1e-5);

    // The output only moves a fraction of the way on the first render tick.
    let mut smoother = Smoother::new(config.smoothing.clone());
    let out = smoother.tick(&stage.targets());
    assert!(out.scale > 1.0 && out.scale < expected_scale);
}

#[test]
fn partial_pinch_scales_proportionally() {
    let mut stage = stage();
    let gesture = stage
        .process(Some(&LandmarkFrame::single(pinch_hand(0.5, 0.5, 0.05))))
        .unwrap();
    assert!(gesture.pinch_active);
    // (0.14 - 0.05) / 0.1 = 0.9
    assert!((gesture.pinch_intensity - 0.9).abs() < 1e-4);
    assert!((stage.targets().scale - (1.0 + 0.9 * 0.95)).abs() < 1e-4);
}

#[test]
fn sustained_fist_boosts_then_decays_after_loss() {
    let resolver = TargetResolver::default();
    let mut stage = stage();

    for _ in 0..30 {
        let gesture = stage
            .process(Some(&LandmarkFrame::single(fist_hand(0.5, 0.5, 0.5))))
            .unwrap();
        assert!(gesture.fist_active);
        assert_eq!(stage.targets().speed_multiplier, 4.0);
    }

    let bound = resolver.ticks_to_neutral(4.0, 0.01);
    for _ in 0..bound {
        stage.process(None);
        assert!(stage.targets().speed_multiplier >= 1.0);
    }
    assert!(stage.targets().speed_multiplier - 1.0 < 0.01);
}

#[test]
fn render_rate_smoothing_is_independent_of_detector_rate() {
    // Two render ticks per detection, the usual 60 Hz render over a 30 Hz tracker.
    let mut stage = stage();
    let mut smoother = Smoother::default();
    let mut last_speed = smoother.outputs().speed;

    for _ in 0..30 {
        stage.process(Some(&LandmarkFrame::single(fist_hand(0.5, 0.5, 0.5))));
        for _ in 0..2 {
            let out = smoother.tick(&stage.targets());
            assert!(out.speed >= last_speed);
            assert!(out.speed <= 4.0);
            last_speed = out.speed;
        }
    }
    assert!(last_speed > 3.9);
}
