//! Dimensional reduction of motion events.
//!
//! Reductions pick a subset of axes from a source event. Relative events are
//! re-derived against the reduced previous sample (reconstructed from the
//! source), so distance and speed describe only the kept axes. The source is
//! never modified.

use crate::event::InputEvent;
use crate::motion::{Dof, MotionEvent, MotionSnapshot, MAX_AXES};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which half of a six-axis event to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Triplet {
    /// `(x, y, z)`.
    Translation,
    /// `(rx, ry, rz)`.
    Rotation,
}

/// A single axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// First axis.
    X,
    /// Second axis.
    Y,
    /// Third axis.
    Z,
    /// Rotation about x.
    Rx,
    /// Rotation about y.
    Ry,
    /// Rotation about z.
    Rz,
}

impl Axis {
    /// Index into the axis arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
            Self::Rx => 3,
            Self::Ry => 4,
            Self::Rz => 5,
        }
    }
}

fn pick(values: &[f32; MAX_AXES], indices: &[usize]) -> [f32; MAX_AXES] {
    let mut out = [0.0; MAX_AXES];
    for (slot, &i) in out.iter_mut().zip(indices) {
        *slot = values[i];
    }
    out
}

fn reduce(event: &MotionEvent, dof: Dof, indices: &[usize]) -> MotionEvent {
    let meta = *event.meta();
    let full_current = event.snapshot().current;

    if event.is_absolute() {
        let mut full_delta = [0.0; MAX_AXES];
        full_delta[..event.dof().axes()].copy_from_slice(event.delta());
        return MotionEvent::from_absolute_parts(dof, pick(&full_delta, indices), meta);
    }

    let previous = event.previous_snapshot();
    let reduced_previous = MotionSnapshot {
        dof,
        id: previous.id,
        timestamp: previous.timestamp,
        current: pick(&previous.current, indices),
    };
    MotionEvent::from_snapshot(
        dof,
        pick(&full_current, indices),
        Some(&reduced_previous),
        meta,
    )
}

/// Keep the translation or rotation triplet of a six-axis event.
pub fn to_dof3(event: &MotionEvent, triplet: Triplet) -> Option<MotionEvent> {
    if event.dof() != Dof::Six {
        warn!(dof = event.dof().axes(), "reduction to 3 axes needs a 6-axis event");
        return None;
    }
    let indices: &[usize] = match triplet {
        Triplet::Translation => &[0, 1, 2],
        Triplet::Rotation => &[3, 4, 5],
    };
    Some(reduce(event, Dof::Three, indices))
}

/// Keep `(x, y)` of a three- or six-axis event.
pub fn to_dof2(event: &MotionEvent) -> Option<MotionEvent> {
    if event.dof() < Dof::Three {
        warn!(dof = event.dof().axes(), "reduction to 2 axes needs at least 3 axes");
        return None;
    }
    Some(reduce(event, Dof::Two, &[0, 1]))
}

/// Keep one axis of an event with at least two axes.
pub fn to_dof1(event: &MotionEvent, axis: Axis) -> Option<MotionEvent> {
    if event.dof() < Dof::Two || axis.index() >= event.dof().axes() {
        warn!(
            dof = event.dof().axes(),
            axis = axis.index(),
            "axis not available for reduction to 1 axis"
        );
        return None;
    }
    Some(reduce(event, Dof::One, &[axis.index()]))
}
