//! Core input-event model and dispatch for Tactile.
//!
//! This crate turns raw device samples into a uniform event stream and routes
//! it to the objects that claim it:
//! - Events and match keys: [`Event`], [`Shortcut`], [`ShortcutRegistry`]
//! - Motion with 1, 2, 3 or 6 degrees of freedom: [`MotionEvent`] and the
//!   [`reduction`] functions
//! - Dispatch: the [`Grabber`] trait and the per-device [`Agent`]
//! - Device agents: [`PointerAgent`], [`KeyboardAgent`], [`TouchAgent`]
//! - Touch gestures: [`TouchProcessor`] in [`gesture`]
//!
//! The crate renders nothing and owns no event loop; callers feed samples in
//! and receive [`Grabber::perform_interaction`] calls out.

mod agent;
mod clock;
mod config;
mod error;
mod event;
pub mod gesture;
mod grabber;
mod keyboard;
mod motion;
mod pointer;
pub mod reduction;
mod shortcut;
mod touch;

pub use agent::{Agent, GrabberPriority};
pub use clock::now_ms;
pub use config::{AgentConfig, PickingMode, TactileConfig};
pub use error::{ConfigError, Result as ConfigResult};
pub use event::{
    ClickEvent, Event, EventMeta, InputEvent, KeyEvent, Lifecycle, Modifiers, TapEvent, TouchId,
    NO_ID,
};
pub use gesture::{Gesture, GestureConfig, TouchPoint, TouchProcessor};
pub use grabber::{Grabber, GrabberId, ShortcutGrabber};
pub use keyboard::KeyboardAgent;
pub use motion::{derive_relative, DerivedMotion, Dof, MotionEvent, MotionSnapshot, MAX_AXES};
pub use pointer::{
    PointerAgent, PointerSample, LEFT_BUTTON, MIDDLE_BUTTON, RIGHT_BUTTON, WHEEL_ID,
};
pub use reduction::{to_dof1, to_dof2, to_dof3, Axis, Triplet};
pub use shortcut::{normalize_count, Shortcut, ShortcutKind, ShortcutRegistry, MAX_COUNT};
pub use touch::TouchAgent;
