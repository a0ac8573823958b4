//! Pointer (mouse) agent.

use crate::agent::Agent;
use crate::clock;
use crate::config::{AgentConfig, PickingMode};
use crate::event::{ClickEvent, Event, InputEvent, Modifiers, NO_ID};
use crate::motion::{Dof, MotionEvent};

/// Left button id.
pub const LEFT_BUTTON: i32 = 1;
/// Middle button id.
pub const MIDDLE_BUTTON: i32 = 2;
/// Right button id.
pub const RIGHT_BUTTON: i32 = 3;
/// Id of wheel motion events.
pub const WHEEL_ID: i32 = 8;

/// One raw pointer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// X screen coordinate.
    pub x: f32,
    /// Y screen coordinate.
    pub y: f32,
    /// Held modifiers.
    pub modifiers: Modifiers,
    /// Button id, `NO_ID` when no button is involved.
    pub button: i32,
    /// Sample time in milliseconds.
    pub timestamp: u64,
}

impl PointerSample {
    /// Sample at a position, stamped with the process clock.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            modifiers: Modifiers::empty(),
            button: NO_ID,
            timestamp: clock::now_ms(),
        }
    }

    /// Set the held modifiers.
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Set the button.
    pub const fn with_button(mut self, button: i32) -> Self {
        self.button = button;
        self
    }

    /// Set the timestamp.
    pub const fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Turns pointer samples into events and dispatches them.
///
/// Every move, press, drag and release produces a relative two-axis motion
/// event against the previous sample.
#[derive(Debug)]
pub struct PointerAgent {
    agent: Agent,
    last: Option<MotionEvent>,
}

impl Default for PointerAgent {
    fn default() -> Self {
        Self::new(AgentConfig::default())
    }
}

impl PointerAgent {
    /// Create a pointer agent.
    pub fn new(config: AgentConfig) -> Self {
        Self {
            agent: Agent::with_config("pointer", config),
            last: None,
        }
    }

    /// The underlying agent.
    pub const fn agent(&self) -> &Agent {
        &self.agent
    }

    /// The underlying agent, for registering grabbers.
    pub fn agent_mut(&mut self) -> &mut Agent {
        &mut self.agent
    }

    /// Polling policy.
    pub const fn picking(&self) -> PickingMode {
        self.agent.config().picking
    }

    /// Change the polling policy.
    pub fn set_picking(&mut self, picking: PickingMode) {
        self.agent.config_mut().picking = picking;
    }

    /// Most recent motion event.
    pub const fn last_motion(&self) -> Option<&MotionEvent> {
        self.last.as_ref()
    }

    fn motion(&mut self, sample: &PointerSample, id: i32) -> MotionEvent {
        let event = MotionEvent::relative_at(
            Dof::Two,
            &[sample.x, sample.y],
            self.last.as_ref(),
            sample.modifiers,
            id,
            sample.timestamp,
        );
        self.last = Some(event.clone());
        event
    }

    /// Pointer moved with no button held.
    pub fn moved(&mut self, sample: &PointerSample) -> bool {
        let event: Event = self.motion(sample, NO_ID).into();
        if self.picking() == PickingMode::Move {
            self.agent.poll(&event);
        }
        self.agent.handle(&event)
    }

    /// Button pressed; delivers the start of a drag gesture.
    pub fn pressed(&mut self, sample: &PointerSample) -> bool {
        let event = self.motion(sample, sample.button).fire();
        self.agent.handle(&event.into())
    }

    /// Pointer moved with a button held.
    pub fn dragged(&mut self, sample: &PointerSample) -> bool {
        let event = self.motion(sample, sample.button);
        self.agent.handle(&event.into())
    }

    /// Button released; delivers the end of the gesture and clears tracking.
    pub fn released(&mut self, sample: &PointerSample) -> bool {
        let event = self.motion(sample, sample.button).flush();
        let delivered = self.agent.handle(&event.into());
        self.agent.reset_tracking();
        delivered
    }

    /// Button clicked `count` times.
    pub fn clicked(&mut self, sample: &PointerSample, count: i32) -> bool {
        let event: Event =
            ClickEvent::new(sample.x, sample.y, sample.modifiers, sample.button, count)
                .at(sample.timestamp)
                .into();
        if self.picking() == PickingMode::Click {
            self.agent.poll(&event);
        }
        self.agent.handle(&event)
    }

    /// Wheel rotated by `delta` notches.
    pub fn wheel(&mut self, delta: f32, modifiers: Modifiers, timestamp: u64) -> bool {
        let event = MotionEvent::absolute_at(Dof::One, &[delta], modifiers, WHEEL_ID, timestamp);
        self.agent.handle(&event.into())
    }
}
