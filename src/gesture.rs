use crate::{
    config::ClassifierConfig,
    types::{GestureState, Hand, HandCenter, Landmark, LandmarkFrame},
};

const WRIST: usize = 0;
const THUMB_TIP: usize = 4;
const INDEX_TIP: usize = 8;
const MIDDLE_MCP: usize = 9;
const MIDDLE_TIP: usize = 12;
const RING_TIP: usize = 16;
const PINKY_TIP: usize = 20;

const FIST_TIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Memoryless per-frame classifier. Temporal stability comes from the smoother,
/// never from state kept here.
#[derive(Clone, Debug, Default)]
pub struct GestureClassifier {
    cfg: ClassifierConfig,
}

impl GestureClassifier {
    pub fn new(cfg: ClassifierConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.cfg
    }

    pub fn classify(&self, frame: Option<&LandmarkFrame>) -> Option<GestureState> {
        let hand = frame?.primary_hand()?;
        if hand.score < self.cfg.min_hand_score {
            log::trace!(
                "ignoring hand scored {:.2} below {:.2}",
                hand.score,
                self.cfg.min_hand_score
            );
            return None;
        }
        self.classify_hand(hand)
    }

    pub fn classify_hand(&self, hand: &Hand) -> Option<GestureState> {
        let points = &hand.landmarks;
        let Some(anchors) = HandAnchors::pick(points) else {
            log::warn!(
                "malformed hand with {} landmarks, treating as no hand",
                points.len()
            );
            return None;
        };

        let pinch_distance = anchors.thumb_tip.planar_distance(&anchors.index_tip);
        let fist_ratio = self.fist_ratio(&anchors);

        Some(GestureState {
            pinch_active: pinch_distance < self.cfg.pinch_threshold,
            fist_active: fist_ratio < self.cfg.fist_ratio_threshold,
            pinch_intensity: pinch_intensity(
                pinch_distance,
                self.cfg.pinch_open,
                self.cfg.pinch_closed,
            ),
            hand_center: HandCenter {
                x: anchors.palm.x - 0.5,
                y: anchors.palm.y - 0.5,
            },
        })
    }

    /// Mean fingertip-to-palm distance in units of the wrist-to-palm distance, so
    /// the value does not change as the hand moves toward or away from the camera.
    fn fist_ratio(&self, anchors: &HandAnchors) -> f32 {
        let avg = anchors
            .tips
            .iter()
            .map(|tip| tip.planar_distance(&anchors.palm))
            .sum::<f32>()
            / anchors.tips.len() as f32;

        let span = anchors.wrist.planar_distance(&anchors.palm);
        let span = if span < self.cfg.min_palm_span {
            self.cfg.fallback_palm_span
        } else {
            span
        };

        avg / span
    }
}

/// Linear ramp from 0 at `open` down to 1 at `closed`, clamped.
pub fn pinch_intensity(distance: f32, open: f32, closed: f32) -> f32 {
    let range = (open - closed).max(f32::EPSILON);
    ((open - distance) / range).clamp(0.0, 1.0)
}

struct HandAnchors {
    wrist: Landmark,
    palm: Landmark,
    thumb_tip: Landmark,
    index_tip: Landmark,
    tips: [Landmark; 4],
}

impl HandAnchors {
    fn pick(points: &[Landmark]) -> Option<Self> {
        let wrist = *points.get(WRIST)?;
        let palm = points.get(MIDDLE_MCP).copied().unwrap_or(wrist);
        let mut tips = [Landmark::default(); 4];
        for (slot, idx) in tips.iter_mut().zip(FIST_TIPS) {
            *slot = *points.get(idx)?;
        }

        let anchors = Self {
            wrist,
            palm,
            thumb_tip: *points.get(THUMB_TIP)?,
            index_tip: *points.get(INDEX_TIP)?,
            tips,
        };
        anchors.is_finite().then_some(anchors)
    }

    // A single NaN here would reach the targets and stick in the smoothed pose.
    fn is_finite(&self) -> bool {
        [self.wrist, self.palm, self.thumb_tip, self.index_tip]
            .iter()
            .chain(self.tips.iter())
            .all(|p| p.x.is_finite() && p.y.is_finite())
    }
}
