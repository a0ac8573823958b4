//! Input events delivered to grabbers.
//!
//! Every occurrence carries an [`EventMeta`] header (modifier mask, device id,
//! timestamp and lifecycle). Concrete shapes are closed over by [`Event`]:
//! keys, pointer clicks, synthesized touch taps and [`MotionEvent`]s.

use crate::clock;
use crate::motion::MotionEvent;
use crate::shortcut::{normalize_count, Shortcut, ShortcutKind};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Device id used by events that carry pure motion (no button or key).
pub const NO_ID: i32 = 0;

bitflags! {
    /// Modifier keys held while an event was produced.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        /// Shift key.
        const SHIFT = 1;
        /// Control key.
        const CTRL = 1 << 1;
        /// Meta key (Windows/Command).
        const META = 1 << 2;
        /// Alt key (Option on Mac).
        const ALT = 1 << 3;
        /// AltGr key.
        const ALT_GRAPH = 1 << 4;
    }
}

impl Modifiers {
    /// Display string such as `Shift+Ctrl`; empty when no modifier is held.
    pub fn display(&self) -> String {
        let mut parts = Vec::new();
        if self.contains(Self::SHIFT) {
            parts.push("Shift");
        }
        if self.contains(Self::CTRL) {
            parts.push("Ctrl");
        }
        if self.contains(Self::META) {
            parts.push("Meta");
        }
        if self.contains(Self::ALT) {
            parts.push("Alt");
        }
        if self.contains(Self::ALT_GRAPH) {
            parts.push("AltGr");
        }
        parts.join("+")
    }
}

/// Gesture lifecycle marker.
///
/// A single enum keeps `fired` and `flushed` mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Lifecycle {
    /// A sample in the middle of a gesture.
    #[default]
    Intermediate,
    /// First sample of a gesture.
    Fired,
    /// Last sample of a gesture.
    Flushed,
}

/// Header shared by every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EventMeta {
    modifiers: Modifiers,
    id: i32,
    timestamp: u64,
    lifecycle: Lifecycle,
}

impl EventMeta {
    /// Header stamped with the process clock.
    #[must_use]
    pub fn new(modifiers: Modifiers, id: i32) -> Self {
        Self::at(modifiers, id, clock::now_ms())
    }

    /// Header with an explicit timestamp in milliseconds.
    #[must_use]
    pub const fn at(modifiers: Modifiers, id: i32, timestamp: u64) -> Self {
        Self {
            modifiers,
            id,
            timestamp,
            lifecycle: Lifecycle::Intermediate,
        }
    }

    /// Modifier mask.
    #[must_use]
    pub const fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Device-specific id.
    #[must_use]
    pub const fn id(&self) -> i32 {
        self.id
    }

    /// Creation time in milliseconds.
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Lifecycle marker.
    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub(crate) const fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub(crate) const fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Behavior shared by every event shape.
pub trait InputEvent: Clone {
    /// The event header.
    fn meta(&self) -> &EventMeta;

    /// Consume the event and return it with a different lifecycle marker.
    fn with_lifecycle(self, lifecycle: Lifecycle) -> Self;

    /// The match key derived from this event.
    fn shortcut(&self) -> Shortcut;

    /// Whether the event carries no meaningful change.
    fn is_null(&self) -> bool;

    /// Modifier mask.
    fn modifiers(&self) -> Modifiers {
        self.meta().modifiers()
    }

    /// Device-specific id.
    fn id(&self) -> i32 {
        self.meta().id()
    }

    /// Creation time in milliseconds.
    fn timestamp(&self) -> u64 {
        self.meta().timestamp()
    }

    /// Whether this event starts a gesture.
    fn fired(&self) -> bool {
        self.meta().lifecycle() == Lifecycle::Fired
    }

    /// Whether this event ends a gesture.
    fn flushed(&self) -> bool {
        self.meta().lifecycle() == Lifecycle::Flushed
    }

    /// Copy of this event marked as the start of a gesture.
    fn fire(&self) -> Self {
        self.clone().with_lifecycle(Lifecycle::Fired)
    }

    /// Copy of this event marked as the end of a gesture.
    fn flush(&self) -> Self {
        self.clone().with_lifecycle(Lifecycle::Flushed)
    }

    /// Independent deep copy.
    fn get(&self) -> Self {
        self.clone()
    }
}

/// Keyboard event: a virtual key press or a typed character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyEvent {
    meta: EventMeta,
    key: Option<char>,
}

impl KeyEvent {
    /// A virtual-key press with modifiers.
    #[must_use]
    pub fn pressed(modifiers: Modifiers, virtual_key: i32) -> Self {
        Self {
            meta: EventMeta::new(modifiers, virtual_key),
            key: None,
        }
    }

    /// A typed character with no modifiers and no virtual key.
    #[must_use]
    pub fn typed(key: char) -> Self {
        Self {
            meta: EventMeta::new(Modifiers::empty(), NO_ID),
            key: Some(key),
        }
    }

    /// A typed character produced while modifiers were held.
    #[must_use]
    pub fn typed_with(modifiers: Modifiers, key: char) -> Self {
        Self {
            meta: EventMeta::new(modifiers, NO_ID),
            key: Some(key),
        }
    }

    /// Restamp with an explicit timestamp.
    #[must_use]
    pub const fn at(mut self, timestamp: u64) -> Self {
        self.meta = self.meta.with_timestamp(timestamp);
        self
    }

    /// The typed character, if any.
    #[must_use]
    pub const fn key(&self) -> Option<char> {
        self.key
    }

    /// The virtual key code (`NO_ID` for typed characters).
    #[must_use]
    pub const fn virtual_key(&self) -> i32 {
        self.meta.id()
    }
}

impl InputEvent for KeyEvent {
    fn meta(&self) -> &EventMeta {
        &self.meta
    }

    fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.meta = self.meta.with_lifecycle(lifecycle);
        self
    }

    fn shortcut(&self) -> Shortcut {
        match self.key {
            Some(key) => Shortcut::character_with(self.meta.modifiers(), key),
            None => Shortcut::key(self.meta.modifiers(), self.meta.id()),
        }
    }

    fn is_null(&self) -> bool {
        self.meta.id() == NO_ID && self.key.is_none()
    }
}

/// Screen-positioned discrete event with a repetition count, shared by
/// clicks and taps.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct PositionedCount {
    meta: EventMeta,
    x: f32,
    y: f32,
    count: u8,
}

impl PositionedCount {
    fn new(x: f32, y: f32, modifiers: Modifiers, id: i32, count: i32) -> Self {
        Self {
            meta: EventMeta::new(modifiers, id),
            x,
            y,
            count: normalize_count(count),
        }
    }

    const fn x(&self) -> f32 {
        self.x
    }

    const fn y(&self) -> f32 {
        self.y
    }

    const fn count(&self) -> u8 {
        self.count
    }
}

/// Pointer click with a click count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickEvent(PositionedCount);

impl ClickEvent {
    /// Create a click; counts outside `1..=3` are clamped.
    #[must_use]
    pub fn new(x: f32, y: f32, modifiers: Modifiers, button: i32, count: i32) -> Self {
        Self(PositionedCount::new(x, y, modifiers, button, count))
    }

    /// Restamp with an explicit timestamp.
    #[must_use]
    pub const fn at(mut self, timestamp: u64) -> Self {
        self.0.meta = self.0.meta.with_timestamp(timestamp);
        self
    }

    /// X screen coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.0.x()
    }

    /// Y screen coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.0.y()
    }

    /// Click count.
    #[must_use]
    pub const fn count(&self) -> u8 {
        self.0.count()
    }
}

impl InputEvent for ClickEvent {
    fn meta(&self) -> &EventMeta {
        &self.0.meta
    }

    fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.0.meta = self.0.meta.with_lifecycle(lifecycle);
        self
    }

    fn shortcut(&self) -> Shortcut {
        Shortcut::click(self.0.meta.modifiers(), self.0.meta.id(), i32::from(self.0.count))
    }

    fn is_null(&self) -> bool {
        false
    }
}

/// Touch tap synthesized by the gesture recognizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TapEvent(PositionedCount);

impl TapEvent {
    /// Create a tap; counts outside `1..=3` are clamped.
    #[must_use]
    pub fn new(x: f32, y: f32, modifiers: Modifiers, id: i32, count: i32) -> Self {
        Self(PositionedCount::new(x, y, modifiers, id, count))
    }

    /// Restamp with an explicit timestamp.
    #[must_use]
    pub const fn at(mut self, timestamp: u64) -> Self {
        self.0.meta = self.0.meta.with_timestamp(timestamp);
        self
    }

    /// X screen coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.0.x()
    }

    /// Y screen coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.0.y()
    }

    /// Tap count.
    #[must_use]
    pub const fn count(&self) -> u8 {
        self.0.count()
    }
}

impl InputEvent for TapEvent {
    fn meta(&self) -> &EventMeta {
        &self.0.meta
    }

    fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.0.meta = self.0.meta.with_lifecycle(lifecycle);
        self
    }

    fn shortcut(&self) -> Shortcut {
        Shortcut::tap(self.0.meta.modifiers(), self.0.meta.id(), i32::from(self.0.count))
    }

    fn is_null(&self) -> bool {
        false
    }
}

/// Touch contact identifier for multi-touch tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TouchId(pub u32);

impl TouchId {
    /// Create a new touch ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Any event that can be offered to a grabber.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Event {
    /// Keyboard press or typed character
    Key(KeyEvent),
    /// Pointer click
    Click(ClickEvent),
    /// Touch tap
    Tap(TapEvent),
    /// Motion along 1, 2, 3 or 6 axes
    Motion(MotionEvent),
}

impl Event {
    /// The shortcut family this event belongs to.
    #[must_use]
    pub const fn kind(&self) -> ShortcutKind {
        match self {
            Self::Key(_) => ShortcutKind::Key,
            Self::Click(_) => ShortcutKind::Click,
            Self::Tap(_) => ShortcutKind::Tap,
            Self::Motion(_) => ShortcutKind::Motion,
        }
    }

    /// Check if this is a motion event.
    #[must_use]
    pub const fn is_motion(&self) -> bool {
        matches!(self, Self::Motion(_))
    }

    /// Check if this is a keyboard event.
    #[must_use]
    pub const fn is_keyboard(&self) -> bool {
        matches!(self, Self::Key(_))
    }

    /// The motion payload, if any.
    #[must_use]
    pub const fn as_motion(&self) -> Option<&MotionEvent> {
        match self {
            Self::Motion(motion) => Some(motion),
            _ => None,
        }
    }

    /// Screen position for clicks and taps.
    #[must_use]
    pub const fn position(&self) -> Option<(f32, f32)> {
        match self {
            Self::Click(click) => Some((click.x(), click.y())),
            Self::Tap(tap) => Some((tap.x(), tap.y())),
            _ => None,
        }
    }
}

impl InputEvent for Event {
    fn meta(&self) -> &EventMeta {
        match self {
            Self::Key(e) => e.meta(),
            Self::Click(e) => e.meta(),
            Self::Tap(e) => e.meta(),
            Self::Motion(e) => e.meta(),
        }
    }

    fn with_lifecycle(self, lifecycle: Lifecycle) -> Self {
        match self {
            Self::Key(e) => Self::Key(e.with_lifecycle(lifecycle)),
            Self::Click(e) => Self::Click(e.with_lifecycle(lifecycle)),
            Self::Tap(e) => Self::Tap(e.with_lifecycle(lifecycle)),
            Self::Motion(e) => Self::Motion(e.with_lifecycle(lifecycle)),
        }
    }

    fn shortcut(&self) -> Shortcut {
        match self {
            Self::Key(e) => e.shortcut(),
            Self::Click(e) => e.shortcut(),
            Self::Tap(e) => e.shortcut(),
            Self::Motion(e) => e.shortcut(),
        }
    }

    fn is_null(&self) -> bool {
        match self {
            Self::Key(e) => e.is_null(),
            Self::Click(e) => e.is_null(),
            Self::Tap(e) => e.is_null(),
            Self::Motion(e) => e.is_null(),
        }
    }
}

impl From<KeyEvent> for Event {
    fn from(event: KeyEvent) -> Self {
        Self::Key(event)
    }
}

impl From<ClickEvent> for Event {
    fn from(event: ClickEvent) -> Self {
        Self::Click(event)
    }
}

impl From<TapEvent> for Event {
    fn from(event: TapEvent) -> Self {
        Self::Tap(event)
    }
}

impl From<MotionEvent> for Event {
    fn from(event: MotionEvent) -> Self {
        Self::Motion(event)
    }
}
