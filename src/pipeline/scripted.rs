use std::{
    fs,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender, bounded};
use serde::Deserialize;

use super::PoseDetector;
use crate::{
    config::DetectorSettings,
    error::TrackingError,
    types::{Hand, Landmark, LandmarkFrame, NUM_LANDMARKS},
};

const FRAME_QUEUE: usize = 4;

/// Plays back a fixed list of detections at a steady rate, standing in for a
/// camera + hand tracker.
pub struct ScriptedDetector {
    script: Arc<Vec<Option<Hand>>>,
    interval: Duration,
    looping: bool,
    playback: Option<Playback>,
}

#[derive(Deserialize)]
struct RecordedFrame {
    #[serde(default)]
    hands: Vec<Hand>,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Option<Hand>>, fps: u32) -> Self {
        Self {
            script: Arc::new(script),
            interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            looping: false,
            playback: None,
        }
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Loads a recording: a JSON array of `{ "hands": [{ "landmarks": [...] }] }`.
    pub fn from_json_file(path: &Path, fps: u32) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read landmark script {}", path.display()))?;
        let frames: Vec<RecordedFrame> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse landmark script {}", path.display()))?;
        let script = frames
            .into_iter()
            .map(|frame| frame.hands.into_iter().next())
            .collect();
        Ok(Self::new(script, fps))
    }

    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

impl PoseDetector for ScriptedDetector {
    fn open(
        &mut self,
        settings: &DetectorSettings,
    ) -> Result<Receiver<LandmarkFrame>, TrackingError> {
        if self.script.is_empty() {
            return Err(TrackingError::DetectorUnavailable(
                "landmark script is empty".to_string(),
            ));
        }
        self.close();

        log::info!(
            "scripted detector playing {} frames every {:?} ({}x{}, max {} hand)",
            self.script.len(),
            self.interval,
            settings.frame_width,
            settings.frame_height,
            settings.max_hands
        );

        let (frame_tx, frame_rx) = bounded(FRAME_QUEUE);
        self.playback = Some(Playback::spawn(
            self.script.clone(),
            self.interval,
            self.looping,
            frame_tx,
        ));
        Ok(frame_rx)
    }

    fn close(&mut self) {
        if let Some(playback) = self.playback.take() {
            playback.stop();
        }
    }
}

struct Playback {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Playback {
    fn spawn(
        script: Arc<Vec<Option<Hand>>>,
        interval: Duration,
        looping: bool,
        frame_tx: Sender<LandmarkFrame>,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let handle = thread::spawn(move || {
            loop {
                for step in script.iter() {
                    if stop_flag.load(Ordering::Relaxed) {
                        return;
                    }
                    let frame = match step {
                        Some(hand) => LandmarkFrame::single(hand.clone()),
                        None => LandmarkFrame::empty(),
                    };
                    // Drop the frame if the consumer is busy, like a live tracker would.
                    let _ = frame_tx.try_send(frame);
                    thread::sleep(interval);
                }
                if !looping {
                    return;
                }
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Open hand: palm at `(cx, cy)`, wrist 0.1 below, fingers spread.
pub fn open_hand(cx: f32, cy: f32) -> Hand {
    let mut pts = vec![Landmark::new(cx, cy); NUM_LANDMARKS];
    pts[0] = Landmark::new(cx, cy + 0.1);
    pts[4] = Landmark::new(cx - 0.15, cy - 0.02);
    pts[8] = Landmark::new(cx - 0.06, cy - 0.18);
    pts[12] = Landmark::new(cx, cy - 0.2);
    pts[16] = Landmark::new(cx + 0.05, cy - 0.18);
    pts[20] = Landmark::new(cx + 0.1, cy - 0.14);
    Hand::new(pts)
}

/// Fingertips curled to `ratio` wrist-to-palm lengths from the palm. The thumb
/// is tucked below the wrist, clear of every index tip position.
pub fn fist_hand(cx: f32, cy: f32, ratio: f32) -> Hand {
    let mut hand = open_hand(cx, cy);
    let r = 0.1 * ratio;
    hand.landmarks[4] = Landmark::new(cx + 0.04, cy + 0.25);
    hand.landmarks[8] = Landmark::new(cx - r, cy);
    hand.landmarks[12] = Landmark::new(cx, cy - r);
    hand.landmarks[16] = Landmark::new(cx + r, cy);
    hand.landmarks[20] = Landmark::new(cx, cy + r);
    hand
}

/// Open hand with the thumb tip `distance` from the index tip.
pub fn pinch_hand(cx: f32, cy: f32, distance: f32) -> Hand {
    let mut hand = open_hand(cx, cy);
    let index = hand.landmarks[8];
    hand.landmarks[4] = Landmark::new(index.x - distance, index.y);
    hand
}

/// A short session: sweep, pinch, release, fist, then the hand leaves the frame.
pub fn demo_script() -> Vec<Option<Hand>> {
    let mut script = Vec::new();

    for i in 0..60 {
        let t = i as f32 / 59.0;
        script.push(Some(open_hand(0.25 + 0.5 * t, 0.5)));
    }
    for i in 0..30 {
        let t = i as f32 / 29.0;
        script.push(Some(pinch_hand(0.5, 0.5, 0.16 - 0.14 * t)));
    }
    script.extend((0..20).map(|_| Some(open_hand(0.5, 0.5))));
    script.extend((0..30).map(|_| Some(fist_hand(0.5, 0.45, 0.5))));
    script.extend((0..60).map(|_| None));

    script
}
