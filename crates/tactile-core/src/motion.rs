//! Motion events with 1, 2, 3 or 6 degrees of freedom.
//!
//! A [`MotionEvent`] is either absolute (only per-axis deltas are known) or
//! relative (built from the previous sample, with delta, distance, speed and
//! delay derived once at construction by [`derive_relative`]).

use crate::clock;
use crate::event::{EventMeta, InputEvent, Lifecycle, Modifiers};
use crate::shortcut::Shortcut;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Maximum number of axes any motion event carries.
pub const MAX_AXES: usize = 6;

/// Degrees of freedom of a motion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dof {
    /// Single axis (wheel, pinch, turn).
    One = 1,
    /// Planar `(x, y)`.
    Two = 2,
    /// Spatial `(x, y, z)`.
    Three = 3,
    /// Spatial plus rotation `(x, y, z, rx, ry, rz)`.
    Six = 6,
}

impl Dof {
    /// Number of active axes.
    pub const fn axes(self) -> usize {
        self as usize
    }
}

/// State of a motion sample needed to derive the next relative one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionSnapshot {
    /// Dimensionality.
    pub dof: Dof,
    /// Device id.
    pub id: i32,
    /// Sample time in milliseconds.
    pub timestamp: u64,
    /// Position per axis; inactive axes are zero.
    pub current: [f32; MAX_AXES],
}

/// Fields derived from two consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DerivedMotion {
    /// Per-axis difference.
    pub delta: [f32; MAX_AXES],
    /// Euclidean norm of the delta.
    pub distance: f32,
    /// Elapsed milliseconds.
    pub delay: u64,
    /// Distance per millisecond, or the distance itself when no time elapsed.
    pub speed: f32,
}

/// Derive delta, distance, delay and speed of a sample against the previous
/// one.
///
/// Every derived field is zero when the previous sample has a different id or
/// dimensionality.
pub fn derive_relative(
    dof: Dof,
    id: i32,
    timestamp: u64,
    current: &[f32; MAX_AXES],
    previous: &MotionSnapshot,
) -> DerivedMotion {
    if previous.id != id || previous.dof != dof {
        return DerivedMotion::default();
    }

    let mut delta = [0.0; MAX_AXES];
    for (i, d) in delta.iter_mut().enumerate().take(dof.axes()) {
        *d = current[i] - previous.current[i];
    }
    let distance = delta.iter().map(|d| d * d).sum::<f32>().sqrt();
    let delay = timestamp.saturating_sub(previous.timestamp);
    let speed = if delay == 0 {
        distance
    } else {
        distance / delay as f32
    };

    DerivedMotion {
        delta,
        distance,
        delay,
        speed,
    }
}

/// Copy up to `dof.axes()` values into a zero-padded axis array.
fn pad(dof: Dof, values: &[f32]) -> [f32; MAX_AXES] {
    let mut out = [0.0; MAX_AXES];
    for (slot, value) in out.iter_mut().zip(values).take(dof.axes()) {
        *slot = *value;
    }
    out
}

/// Motion along one or more axes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionEvent {
    meta: EventMeta,
    dof: Dof,
    current: [f32; MAX_AXES],
    delta: [f32; MAX_AXES],
    distance: f32,
    speed: f32,
    delay: u64,
    relative: bool,
}

impl MotionEvent {
    /// Absolute event from per-axis deltas, stamped with the process clock.
    ///
    /// Extra values beyond `dof.axes()` are ignored; missing ones are zero.
    pub fn absolute(dof: Dof, deltas: &[f32], modifiers: Modifiers, id: i32) -> Self {
        Self::absolute_at(dof, deltas, modifiers, id, clock::now_ms())
    }

    /// Absolute event with an explicit timestamp.
    pub fn absolute_at(
        dof: Dof,
        deltas: &[f32],
        modifiers: Modifiers,
        id: i32,
        timestamp: u64,
    ) -> Self {
        Self {
            meta: EventMeta::at(modifiers, id, timestamp),
            dof,
            current: [0.0; MAX_AXES],
            delta: pad(dof, deltas),
            distance: 0.0,
            speed: 0.0,
            delay: 0,
            relative: false,
        }
    }

    /// Relative event from positions, stamped with the process clock.
    pub fn relative(
        dof: Dof,
        axes: &[f32],
        previous: Option<&Self>,
        modifiers: Modifiers,
        id: i32,
    ) -> Self {
        Self::relative_at(dof, axes, previous, modifiers, id, clock::now_ms())
    }

    /// Relative event with an explicit timestamp.
    ///
    /// Without a previous event, or against one with another id or
    /// dimensionality, the derived fields are zero.
    pub fn relative_at(
        dof: Dof,
        axes: &[f32],
        previous: Option<&Self>,
        modifiers: Modifiers,
        id: i32,
        timestamp: u64,
    ) -> Self {
        let snapshot = previous.map(Self::snapshot);
        Self::from_snapshot(
            dof,
            pad(dof, axes),
            snapshot.as_ref(),
            EventMeta::at(modifiers, id, timestamp),
        )
    }

    pub(crate) fn from_snapshot(
        dof: Dof,
        current: [f32; MAX_AXES],
        previous: Option<&MotionSnapshot>,
        meta: EventMeta,
    ) -> Self {
        let derived = previous.map_or_else(DerivedMotion::default, |prev| {
            derive_relative(dof, meta.id(), meta.timestamp(), &current, prev)
        });
        Self {
            meta,
            dof,
            current,
            delta: derived.delta,
            distance: derived.distance,
            speed: derived.speed,
            delay: derived.delay,
            relative: true,
        }
    }

    pub(crate) fn from_absolute_parts(dof: Dof, delta: [f32; MAX_AXES], meta: EventMeta) -> Self {
        Self {
            meta,
            dof,
            current: [0.0; MAX_AXES],
            delta,
            distance: 0.0,
            speed: 0.0,
            delay: 0,
            relative: false,
        }
    }

    /// Dimensionality.
    pub const fn dof(&self) -> Dof {
        self.dof
    }

    /// Whether the event was derived from a previous sample.
    pub const fn is_relative(&self) -> bool {
        self.relative
    }

    /// Whether the event only carries deltas.
    pub const fn is_absolute(&self) -> bool {
        !self.relative
    }

    /// Active position values.
    pub fn current(&self) -> &[f32] {
        &self.current[..self.dof.axes()]
    }

    /// Active delta values.
    pub fn delta(&self) -> &[f32] {
        &self.delta[..self.dof.axes()]
    }

    /// Euclidean norm of the delta (relative events only).
    pub const fn distance(&self) -> f32 {
        self.distance
    }

    /// Distance per millisecond (relative events only).
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Milliseconds since the previous sample (relative events only).
    pub const fn delay(&self) -> u64 {
        self.delay
    }

    /// X position.
    pub const fn x(&self) -> f32 {
        self.current[0]
    }

    /// Y position.
    pub const fn y(&self) -> f32 {
        self.current[1]
    }

    /// Z position.
    pub const fn z(&self) -> f32 {
        self.current[2]
    }

    /// Rotation about x.
    pub const fn rx(&self) -> f32 {
        self.current[3]
    }

    /// Rotation about y.
    pub const fn ry(&self) -> f32 {
        self.current[4]
    }

    /// Rotation about z.
    pub const fn rz(&self) -> f32 {
        self.current[5]
    }

    /// X delta.
    pub const fn dx(&self) -> f32 {
        self.delta[0]
    }

    /// Y delta.
    pub const fn dy(&self) -> f32 {
        self.delta[1]
    }

    /// Z delta.
    pub const fn dz(&self) -> f32 {
        self.delta[2]
    }

    /// Rotation delta about x.
    pub const fn drx(&self) -> f32 {
        self.delta[3]
    }

    /// Rotation delta about y.
    pub const fn dry(&self) -> f32 {
        self.delta[4]
    }

    /// Rotation delta about z.
    pub const fn drz(&self) -> f32 {
        self.delta[5]
    }

    /// State needed to derive the next relative sample from this one.
    pub fn snapshot(&self) -> MotionSnapshot {
        MotionSnapshot {
            dof: self.dof,
            id: self.meta.id(),
            timestamp: self.meta.timestamp(),
            current: self.current,
        }
    }

    /// Reconstruct the sample this event was derived from.
    ///
    /// Position is `current - delta` and time is `timestamp - delay`.
    pub fn previous_snapshot(&self) -> MotionSnapshot {
        let mut current = self.current;
        for (c, d) in current.iter_mut().zip(self.delta) {
            *c -= d;
        }
        MotionSnapshot {
            dof: self.dof,
            id: self.meta.id(),
            timestamp: self.meta.timestamp().saturating_sub(self.delay),
            current,
        }
    }

    /// Copy with each delta scaled by the matching sensitivity.
    ///
    /// Only absolute events are scaled; a relative event is returned
    /// unchanged.
    pub fn modulate(&self, sensitivities: &[f32; MAX_AXES]) -> Self {
        if self.relative {
            warn!(id = self.meta.id(), "modulate called on a relative motion event");
            return self.clone();
        }
        let mut out = self.clone();
        for (d, s) in out.delta.iter_mut().zip(sensitivities).take(self.dof.axes()) {
            *d *= s;
        }
        out
    }
}

impl InputEvent for MotionEvent {
    fn meta(&self) -> &EventMeta {
        &self.meta
    }

    fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.meta = self.meta.with_lifecycle(lifecycle);
        self
    }

    fn shortcut(&self) -> Shortcut {
        Shortcut::motion(self.meta.modifiers(), self.meta.id())
    }

    fn is_null(&self) -> bool {
        self.meta.lifecycle() == Lifecycle::Intermediate && self.delta().iter().all(|d| *d == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NO_ID;
    use proptest::prelude::*;

    fn rel3(pos: [f32; 3], previous: Option<&MotionEvent>, id: i32, t: u64) -> MotionEvent {
        MotionEvent::relative_at(Dof::Three, &pos, previous, Modifiers::empty(), id, t)
    }

    #[test]
    fn test_dof_axes() {
        assert_eq!(Dof::One.axes(), 1);
        assert_eq!(Dof::Two.axes(), 2);
        assert_eq!(Dof::Three.axes(), 3);
        assert_eq!(Dof::Six.axes(), 6);
    }

    #[test]
    fn test_absolute_has_zero_derived_fields() {
        let e = MotionEvent::absolute(Dof::Two, &[3.0, -1.0], Modifiers::empty(), 7);
        assert!(e.is_absolute());
        assert!(!e.is_relative());
        assert_eq!(e.delta(), &[3.0, -1.0]);
        assert_eq!(e.current(), &[0.0, 0.0]);
        assert_eq!(e.distance(), 0.0);
        assert_eq!(e.speed(), 0.0);
        assert_eq!(e.delay(), 0);
    }

    #[test]
    fn test_absolute_ignores_extra_values() {
        let e = MotionEvent::absolute(Dof::One, &[2.0, 9.0, 9.0], Modifiers::empty(), 1);
        assert_eq!(e.delta(), &[2.0]);
        assert_eq!(e.dy(), 0.0);
    }

    #[test]
    fn test_relative_distance_delay_speed() {
        let a = rel3([0.0, 0.0, 0.0], None, NO_ID, 0);
        let b = rel3([3.0, 4.0, 0.0], Some(&a), NO_ID, 100);
        assert_eq!(b.delta(), &[3.0, 4.0, 0.0]);
        assert!((b.distance() - 5.0).abs() < 1e-6);
        assert_eq!(b.delay(), 100);
        assert!((b.speed() - 0.05).abs() < 1e-6);
        assert_eq!((b.x(), b.y(), b.z()), (3.0, 4.0, 0.0));
    }

    #[test]
    fn test_relative_without_previous_is_relative_with_zero_fields() {
        let e = rel3([1.0, 2.0, 3.0], None, NO_ID, 10);
        assert!(e.is_relative());
        assert_eq!(e.delta(), &[0.0, 0.0, 0.0]);
        assert_eq!(e.distance(), 0.0);
    }

    #[test]
    fn test_relative_id_mismatch_zeroes_fields() {
        let a = rel3([0.0, 0.0, 0.0], None, 1, 0);
        let b = rel3([3.0, 4.0, 0.0], Some(&a), 2, 100);
        assert!(b.is_relative());
        assert_eq!(b.distance(), 0.0);
        assert_eq!(b.delay(), 0);
        assert_eq!(b.speed(), 0.0);
    }

    #[test]
    fn test_relative_dof_mismatch_zeroes_fields() {
        let a = MotionEvent::relative_at(Dof::Two, &[0.0, 0.0], None, Modifiers::empty(), 0, 0);
        let b = rel3([3.0, 4.0, 0.0], Some(&a), 0, 100);
        assert_eq!(b.distance(), 0.0);
    }

    #[test]
    fn test_zero_delay_speed_is_distance() {
        let a = rel3([0.0, 0.0, 0.0], None, 0, 50);
        let b = rel3([0.0, 2.0, 0.0], Some(&a), 0, 50);
        assert_eq!(b.delay(), 0);
        assert_eq!(b.speed(), b.distance());
    }

    #[test]
    fn test_earlier_timestamp_saturates_delay() {
        let a = rel3([0.0, 0.0, 0.0], None, 0, 80);
        let b = rel3([1.0, 0.0, 0.0], Some(&a), 0, 40);
        assert_eq!(b.delay(), 0);
        assert_eq!(b.speed(), 1.0);
    }

    #[test]
    fn test_previous_snapshot_reconstructs_source() {
        let a = rel3([1.0, 1.0, 1.0], None, 0, 10);
        let b = rel3([4.0, 5.0, 1.0], Some(&a), 0, 30);
        let prev = b.previous_snapshot();
        assert_eq!(prev, a.snapshot());
    }

    #[test]
    fn test_modulate_absolute_scales_deltas() {
        let e = MotionEvent::absolute(Dof::Two, &[2.0, 3.0], Modifiers::empty(), 0);
        let m = e.modulate(&[0.5, 2.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(m.delta(), &[1.0, 6.0]);
        assert_eq!(e.delta(), &[2.0, 3.0]);
    }

    #[test]
    fn test_modulate_relative_is_unchanged() {
        let a = rel3([0.0, 0.0, 0.0], None, 0, 0);
        let b = rel3([1.0, 1.0, 1.0], Some(&a), 0, 10);
        assert_eq!(b.modulate(&[3.0; MAX_AXES]), b);
    }

    #[test]
    fn test_is_null_respects_lifecycle() {
        let e = MotionEvent::absolute(Dof::Two, &[0.0, 0.0], Modifiers::empty(), 0);
        assert!(e.is_null());
        assert!(!e.fire().is_null());
        assert!(!e.flush().is_null());
        let moved = MotionEvent::absolute(Dof::Two, &[0.0, 1.0], Modifiers::empty(), 0);
        assert!(!moved.is_null());
    }

    #[test]
    fn test_motion_shortcut() {
        let e = MotionEvent::absolute(Dof::One, &[1.0], Modifiers::CTRL, 8);
        assert_eq!(e.shortcut(), Shortcut::motion(Modifiers::CTRL, 8));
    }

    #[test]
    fn test_six_dof_accessors() {
        let a = MotionEvent::relative_at(Dof::Six, &[0.0; 6], None, Modifiers::empty(), 0, 0);
        let b = MotionEvent::relative_at(
            Dof::Six,
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            Some(&a),
            Modifiers::empty(),
            0,
            1,
        );
        assert_eq!((b.rx(), b.ry(), b.rz()), (4.0, 5.0, 6.0));
        assert_eq!((b.drx(), b.dry(), b.drz()), (4.0, 5.0, 6.0));
        assert_eq!((b.dx(), b.dy(), b.dz()), (1.0, 2.0, 3.0));
    }

    proptest! {
        #[test]
        fn prop_delta_is_componentwise_difference(
            a in prop::array::uniform3(-1000.0f32..1000.0),
            b in prop::array::uniform3(-1000.0f32..1000.0),
            t0 in 0u64..10_000,
            dt in 0u64..10_000,
        ) {
            let first = rel3(a, None, 0, t0);
            let second = rel3(b, Some(&first), 0, t0 + dt);
            for i in 0..3 {
                prop_assert_eq!(second.delta()[i], b[i] - a[i]);
            }
            let norm = second.delta().iter().map(|d| d * d).sum::<f32>().sqrt();
            prop_assert!((second.distance() - norm).abs() <= 1e-3 * norm.max(1.0));
            prop_assert_eq!(second.delay(), dt);
            if dt == 0 {
                prop_assert_eq!(second.speed(), second.distance());
            } else {
                prop_assert!((second.speed() - second.distance() / dt as f32).abs() < 1e-3);
            }
        }

        #[test]
        fn prop_mismatched_id_zeroes(id_a in 0i32..10, id_b in 10i32..20, x in -100.0f32..100.0) {
            let first = rel3([0.0, 0.0, 0.0], None, id_a, 0);
            let second = rel3([x, x, x], Some(&first), id_b, 5);
            prop_assert_eq!(second.distance(), 0.0);
            prop_assert_eq!(second.delay(), 0);
            prop_assert_eq!(second.speed(), 0.0);
        }
    }
}
