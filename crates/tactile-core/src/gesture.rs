//! Multi-touch gesture recognition.
//!
//! [`TouchProcessor`] consumes per-contact samples (`point_down`,
//! `point_moved`, `point_up`) and classifies the point set once per frame in
//! [`TouchProcessor::parse`]. Recognized gestures are queued and can be
//! drained either as [`Gesture`] values or as ordinary [`Event`]s ready for
//! dispatch.
//!
//! # Recognized gestures
//!
//! - Tap, double tap and triple tap (single contact, short and still)
//! - Flick (single contact, fast release)
//! - Drag with one, two or three fingers
//! - Pinch and turn with two or more fingers
//! - Opposable three (three contacts moving in any other way)

use crate::clock;
use crate::event::{Event, Modifiers, TapEvent, TouchId};
use crate::motion::{Dof, MotionEvent};
use crate::shortcut::{ShortcutKind, ShortcutRegistry};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};
use tracing::trace;

/// Tap id.
pub const TAP_ID: i32 = 100;
/// Flick id.
pub const FLICK_ID: i32 = 101;
/// One-finger drag id.
pub const DRAG_ONE_ID: i32 = 102;
/// Two-finger drag id.
pub const DRAG_TWO_ID: i32 = 103;
/// Three-finger drag id.
pub const DRAG_THREE_ID: i32 = 104;
/// Two-finger pinch id.
pub const PINCH_TWO_ID: i32 = 105;
/// Pinch with three or more fingers.
pub const PINCH_THREE_ID: i32 = 106;
/// Two-finger turn id.
pub const TURN_TWO_ID: i32 = 107;
/// Turn with three or more fingers.
pub const TURN_THREE_ID: i32 = 108;
/// Opposable-three id.
pub const OPPOSABLE_THREE_ID: i32 = 109;

static GESTURE_IDS: Lazy<()> = Lazy::new(|| {
    let registry = ShortcutRegistry::global();
    registry.register_id(ShortcutKind::Tap, TAP_ID, "Tap with one finger");
    for (id, description) in [
        (FLICK_ID, "Flick with one finger"),
        (DRAG_ONE_ID, "Drag with one finger"),
        (DRAG_TWO_ID, "Drag with two fingers"),
        (DRAG_THREE_ID, "Drag with three fingers"),
        (PINCH_TWO_ID, "Pinch with two fingers"),
        (PINCH_THREE_ID, "Pinch with three or more fingers"),
        (TURN_TWO_ID, "Turn with two fingers"),
        (TURN_THREE_ID, "Turn with three or more fingers"),
        (OPPOSABLE_THREE_ID, "Opposable three-finger motion"),
    ] {
        registry.register_id(ShortcutKind::Motion, id, description);
    }
});

/// Register the gesture ids in the global shortcut registry.
pub fn register_gesture_ids() {
    Lazy::force(&GESTURE_IDS);
}

/// Recognizer thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Maximum contact time of a tap and maximum gap between taps (ms).
    pub tap_interval_ms: u64,
    /// Maximum distance between consecutive taps of a multi-tap.
    pub double_tap_distance: f32,
    /// Maximum travel for a contact to still count as a tap.
    pub tap_slop: f32,
    /// Minimum release velocity of a flick (pixels per ms).
    pub flick_velocity: f32,
    /// Minimum mean angle change of a turn (radians).
    pub turn_angle: f32,
    /// Minimum mean distance change of a pinch (pixels).
    pub pinch_distance: f32,
    /// Maximum distance of any finger from the centroid during a drag.
    pub max_multi_drag_distance: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tap_interval_ms: 300,
            double_tap_distance: 30.0,
            tap_slop: 10.0,
            flick_velocity: 1.0,
            turn_angle: 0.02,
            pinch_distance: 1.0,
            max_multi_drag_distance: 150.0,
        }
    }
}

/// A synthesized gesture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Gesture {
    /// One or more taps at a position.
    Tap {
        /// X position.
        x: f32,
        /// Y position.
        y: f32,
        /// Tap count, 1 to 3.
        count: u8,
    },
    /// Fast single-finger release.
    Flick {
        /// Release x.
        x: f32,
        /// Release y.
        y: f32,
        /// Mean x velocity (px/ms).
        vx: f32,
        /// Mean y velocity (px/ms).
        vy: f32,
    },
    /// Fingers moving together.
    Drag {
        /// Number of contacts.
        fingers: usize,
        /// Mean x movement.
        dx: f32,
        /// Mean y movement.
        dy: f32,
    },
    /// Fingers moving toward or away from their centroid.
    Pinch {
        /// Number of contacts.
        fingers: usize,
        /// Mean distance change.
        delta: f32,
    },
    /// Fingers rotating about their centroid.
    Turn {
        /// Number of contacts.
        fingers: usize,
        /// Mean angle change in radians.
        delta: f32,
    },
    /// Three contacts moving without a drag, pinch or turn.
    OpposableThree {
        /// Mean x movement.
        dx: f32,
        /// Mean y movement.
        dy: f32,
    },
}

impl Gesture {
    /// Shortcut id of the gesture.
    pub const fn id(&self) -> i32 {
        match self {
            Self::Tap { .. } => TAP_ID,
            Self::Flick { .. } => FLICK_ID,
            Self::Drag { fingers, .. } => match *fingers {
                0 | 1 => DRAG_ONE_ID,
                2 => DRAG_TWO_ID,
                _ => DRAG_THREE_ID,
            },
            Self::Pinch { fingers, .. } => {
                if *fingers <= 2 {
                    PINCH_TWO_ID
                } else {
                    PINCH_THREE_ID
                }
            }
            Self::Turn { fingers, .. } => {
                if *fingers <= 2 {
                    TURN_TWO_ID
                } else {
                    TURN_THREE_ID
                }
            }
            Self::OpposableThree { .. } => OPPOSABLE_THREE_ID,
        }
    }

    /// Convert to a dispatchable event.
    ///
    /// Taps become [`TapEvent`]s; everything else becomes an absolute motion
    /// event (two axes for flick, drag and opposable three, one axis for
    /// pinch and turn).
    pub fn to_event(&self, timestamp: u64) -> Event {
        let id = self.id();
        let none = Modifiers::empty();
        match *self {
            Self::Tap { x, y, count } => {
                TapEvent::new(x, y, none, id, i32::from(count)).at(timestamp).into()
            }
            Self::Flick { vx, vy, .. } => {
                MotionEvent::absolute_at(Dof::Two, &[vx, vy], none, id, timestamp).into()
            }
            Self::Drag { dx, dy, .. } | Self::OpposableThree { dx, dy } => {
                MotionEvent::absolute_at(Dof::Two, &[dx, dy], none, id, timestamp).into()
            }
            Self::Pinch { delta, .. } | Self::Turn { delta, .. } => {
                MotionEvent::absolute_at(Dof::One, &[delta], none, id, timestamp).into()
            }
        }
    }
}

/// An active contact.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchPoint {
    /// Contact id.
    pub id: TouchId,
    /// Current x.
    pub x: f32,
    /// Current y.
    pub y: f32,
    /// X at the last classification pass.
    pub previous_x: f32,
    /// Y at the last classification pass.
    pub previous_y: f32,
    /// X at contact start.
    pub start_x: f32,
    /// Y at contact start.
    pub start_y: f32,
    /// Contact start time (ms).
    pub down_at: u64,
    /// Angle around the centroid.
    pub angle: f32,
    /// Angle at the previous pass.
    pub previous_angle: f32,
    /// Distance to the centroid.
    pub pinch_distance: f32,
    /// Distance at the previous pass.
    pub previous_pinch_distance: f32,
}

impl TouchPoint {
    fn new(id: TouchId, x: f32, y: f32, at: u64) -> Self {
        Self {
            id,
            x,
            y,
            previous_x: x,
            previous_y: y,
            start_x: x,
            start_y: y,
            down_at: at,
            angle: 0.0,
            previous_angle: 0.0,
            pinch_distance: 0.0,
            previous_pinch_distance: 0.0,
        }
    }

    /// Distance travelled since contact start.
    pub fn travel(&self) -> f32 {
        (self.x - self.start_x).hypot(self.y - self.start_y)
    }

    fn polar(&self, center: (f32, f32)) -> (f32, f32) {
        let dx = self.x - center.0;
        let dy = self.y - center.1;
        (dy.atan2(dx), dx.hypot(dy))
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingTap {
    x: f32,
    y: f32,
    at: u64,
    count: u8,
}

#[derive(Debug, Default)]
struct TouchState {
    points: Vec<TouchPoint>,
    centroid: (f32, f32),
    previous_centroid: (f32, f32),
    tap_candidate: Option<TouchId>,
    pending_tap: Option<PendingTap>,
    rotation: f32,
    scale: f32,
    queue: VecDeque<(Gesture, u64)>,
    dirty: bool,
}

/// Wrap an angle difference into `(-PI, PI]`.
fn wrap_angle(angle: f32) -> f32 {
    let a = angle % TAU;
    if a > PI {
        a - TAU
    } else if a <= -PI {
        a + TAU
    } else {
        a
    }
}

fn same_sign(deltas: &[f32]) -> bool {
    deltas.iter().all(|d| *d > 0.0) || deltas.iter().all(|d| *d < 0.0)
}

fn mean(values: impl Iterator<Item = f32>, n: usize) -> f32 {
    values.sum::<f32>() / n as f32
}

impl TouchState {
    fn compute_centroid(&self) -> (f32, f32) {
        if self.points.is_empty() {
            return self.centroid;
        }
        let n = self.points.len();
        (
            mean(self.points.iter().map(|p| p.x), n),
            mean(self.points.iter().map(|p| p.y), n),
        )
    }

    /// Reset every reference so the next pass sees no change.
    fn reseed(&mut self) {
        self.centroid = self.compute_centroid();
        self.previous_centroid = self.centroid;
        let center = self.centroid;
        for p in &mut self.points {
            let (angle, distance) = p.polar(center);
            p.angle = angle;
            p.previous_angle = angle;
            p.pinch_distance = distance;
            p.previous_pinch_distance = distance;
            p.previous_x = p.x;
            p.previous_y = p.y;
        }
        self.dirty = false;
    }

    fn emit(&mut self, gesture: Gesture, at: u64) {
        trace!(?gesture, at, "gesture");
        self.queue.push_back((gesture, at));
    }

    fn emit_pending(&mut self, tap: PendingTap) {
        self.emit(
            Gesture::Tap {
                x: tap.x,
                y: tap.y,
                count: tap.count,
            },
            tap.at,
        );
    }

    fn register_tap(&mut self, config: &GestureConfig, x: f32, y: f32, at: u64) {
        match self.pending_tap.take() {
            Some(mut pending)
                if at.saturating_sub(pending.at) < config.tap_interval_ms
                    && (x - pending.x).hypot(y - pending.y) < config.double_tap_distance =>
            {
                pending.count += 1;
                pending.at = at;
                if pending.count >= 3 {
                    self.emit_pending(pending);
                } else {
                    self.pending_tap = Some(pending);
                }
            }
            Some(pending) => {
                self.emit_pending(pending);
                self.pending_tap = Some(PendingTap { x, y, at, count: 1 });
            }
            None => {
                self.pending_tap = Some(PendingTap { x, y, at, count: 1 });
            }
        }
    }

    fn classify(&mut self, config: &GestureConfig, now: u64) {
        let n = self.points.len();
        let dxs: Vec<f32> = self.points.iter().map(|p| p.x - p.previous_x).collect();
        let dys: Vec<f32> = self.points.iter().map(|p| p.y - p.previous_y).collect();
        let mean_dx = mean(dxs.iter().copied(), n);
        let mean_dy = mean(dys.iter().copied(), n);

        let center = self.centroid;
        let compact = self.points.iter().all(|p| {
            (p.x - center.0).hypot(p.y - center.1) <= config.max_multi_drag_distance
        });
        if (1..=3).contains(&n) && (same_sign(&dxs) || same_sign(&dys)) && compact {
            self.emit(
                Gesture::Drag {
                    fingers: n,
                    dx: mean_dx,
                    dy: mean_dy,
                },
                now,
            );
            return;
        }

        if n >= 2 {
            let pinch = mean(
                self.points
                    .iter()
                    .map(|p| p.pinch_distance - p.previous_pinch_distance),
                n,
            );
            if pinch.abs() > config.pinch_distance {
                self.scale += pinch;
                self.emit(
                    Gesture::Pinch {
                        fingers: n,
                        delta: pinch,
                    },
                    now,
                );
                return;
            }

            let turn = mean(
                self.points
                    .iter()
                    .map(|p| wrap_angle(p.angle - p.previous_angle)),
                n,
            );
            if turn.abs() > config.turn_angle {
                self.rotation += turn;
                self.emit(
                    Gesture::Turn {
                        fingers: n,
                        delta: turn,
                    },
                    now,
                );
                return;
            }
        }

        let moved = dxs.iter().chain(&dys).any(|d| *d != 0.0);
        if n == 3 && moved {
            self.emit(
                Gesture::OpposableThree {
                    dx: mean_dx,
                    dy: mean_dy,
                },
                now,
            );
        }
    }
}

/// Thread-safe multi-touch gesture recognizer.
#[derive(Debug)]
pub struct TouchProcessor {
    config: GestureConfig,
    state: Mutex<TouchState>,
}

impl Default for TouchProcessor {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl TouchProcessor {
    /// Create a recognizer; registers the gesture ids on first use.
    pub fn new(config: GestureConfig) -> Self {
        register_gesture_ids();
        Self {
            config,
            state: Mutex::new(TouchState::default()),
        }
    }

    /// Thresholds in use.
    pub const fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Contact started, stamped with the process clock.
    pub fn point_down(&self, x: f32, y: f32, id: TouchId) {
        self.point_down_at(x, y, id, clock::now_ms());
    }

    /// Contact started at `at`.
    ///
    /// A contact reusing an active id replaces it.
    pub fn point_down_at(&self, x: f32, y: f32, id: TouchId, at: u64) {
        let mut state = self.state.lock();
        state.points.retain(|p| p.id != id);
        state.points.push(TouchPoint::new(id, x, y, at));
        state.tap_candidate = if state.points.len() == 1 { Some(id) } else { None };
        state.reseed();
    }

    /// Contact moved. Unknown ids are ignored.
    pub fn point_moved(&self, x: f32, y: f32, id: TouchId) {
        let mut state = self.state.lock();
        if let Some(point) = state.points.iter_mut().find(|p| p.id == id) {
            point.x = x;
            point.y = y;
            state.dirty = true;
        } else {
            trace!(id = id.0, "move for unknown contact ignored");
        }
    }

    /// Contact ended, stamped with the process clock.
    pub fn point_up(&self, id: TouchId) {
        self.point_up_at(id, clock::now_ms());
    }

    /// Contact ended at `at`; may produce a flick or a tap.
    pub fn point_up_at(&self, id: TouchId, at: u64) {
        let mut state = self.state.lock();
        let Some(index) = state.points.iter().position(|p| p.id == id) else {
            trace!(id = id.0, "release for unknown contact ignored");
            return;
        };
        let point = state.points.remove(index);

        if state.tap_candidate == Some(id) {
            state.tap_candidate = None;
            let travel = point.travel();
            let elapsed = at.saturating_sub(point.down_at);
            if travel > self.config.tap_slop {
                let velocity = if elapsed == 0 {
                    travel
                } else {
                    travel / elapsed as f32
                };
                if velocity > self.config.flick_velocity {
                    let span = elapsed.max(1) as f32;
                    state.emit(
                        Gesture::Flick {
                            x: point.x,
                            y: point.y,
                            vx: (point.x - point.start_x) / span,
                            vy: (point.y - point.start_y) / span,
                        },
                        at,
                    );
                }
            } else if elapsed < self.config.tap_interval_ms {
                state.register_tap(&self.config, point.start_x, point.start_y, at);
            }
        }

        state.reseed();
    }

    /// Classify using the process clock.
    pub fn parse(&self) -> usize {
        self.parse_at(clock::now_ms())
    }

    /// Run one classification pass; returns the number of gestures queued.
    ///
    /// Emits a pending tap whose interval elapsed, then, if any contact
    /// moved, emits at most one of drag, pinch, turn or opposable three.
    pub fn parse_at(&self, now: u64) -> usize {
        let mut state = self.state.lock();
        let before = state.queue.len();

        let expired = state
            .pending_tap
            .filter(|tap| now.saturating_sub(tap.at) >= self.config.tap_interval_ms);
        if let Some(tap) = expired {
            state.pending_tap = None;
            state.emit_pending(tap);
        }

        if state.dirty && !state.points.is_empty() {
            state.previous_centroid = state.centroid;
            state.centroid = state.compute_centroid();
            let center = state.centroid;
            for p in &mut state.points {
                let (angle, distance) = p.polar(center);
                p.previous_angle = p.angle;
                p.previous_pinch_distance = p.pinch_distance;
                p.angle = angle;
                p.pinch_distance = distance;
            }

            state.classify(&self.config, now);

            for p in &mut state.points {
                p.previous_x = p.x;
                p.previous_y = p.y;
            }
        }
        state.dirty = false;

        state.queue.len() - before
    }

    /// Take every queued gesture with its timestamp.
    pub fn drain(&self) -> Vec<(Gesture, u64)> {
        self.state.lock().queue.drain(..).collect()
    }

    /// Take every queued gesture as a dispatchable event.
    pub fn drain_events(&self) -> Vec<Event> {
        self.drain()
            .into_iter()
            .map(|(gesture, at)| gesture.to_event(at))
            .collect()
    }

    /// Drop every contact, pending tap and queued gesture.
    pub fn reset(&self) {
        *self.state.lock() = TouchState::default();
    }

    /// Number of active contacts.
    pub fn point_count(&self) -> usize {
        self.state.lock().points.len()
    }

    /// Centroid of the active contacts.
    pub fn centroid(&self) -> (f32, f32) {
        self.state.lock().centroid
    }

    /// Centroid at the previous pass.
    pub fn previous_centroid(&self) -> (f32, f32) {
        self.state.lock().previous_centroid
    }

    /// Accumulated turn angle.
    pub fn rotation(&self) -> f32 {
        self.state.lock().rotation
    }

    /// Accumulated pinch distance.
    pub fn scale(&self) -> f32 {
        self.state.lock().scale
    }

    /// Snapshot of one contact.
    pub fn point(&self, id: TouchId) -> Option<TouchPoint> {
        self.state.lock().points.iter().find(|p| p.id == id).cloned()
    }
}
