//! Keyboard agent.
//!
//! Toolkits report a key press and, for printable keys, a typed character
//! right after it. When a tracked grabber consumed the press, the typed
//! character that follows is not delivered.

use crate::agent::Agent;
use crate::config::AgentConfig;
use crate::event::{Event, KeyEvent};
use tracing::debug;

/// Turns key samples into events and dispatches them.
#[derive(Debug)]
pub struct KeyboardAgent {
    agent: Agent,
    bypass: bool,
}

impl Default for KeyboardAgent {
    fn default() -> Self {
        Self::new(AgentConfig::default())
    }
}

impl KeyboardAgent {
    /// Create a keyboard agent.
    pub fn new(config: AgentConfig) -> Self {
        Self {
            agent: Agent::with_config("keyboard", config),
            bypass: false,
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

    /// Whether the next typed character will be skipped.
    pub const fn bypass_pending(&self) -> bool {
        self.bypass
    }

    /// Key pressed.
    pub fn pressed(&mut self, event: KeyEvent) -> bool {
        let event = Event::Key(event);
        let tracked = self.agent.poll(&event).is_some();
        let delivered = self.agent.handle(&event);
        self.bypass = tracked && delivered;
        delivered
    }

    /// Character typed.
    pub fn typed(&mut self, event: KeyEvent) -> bool {
        if self.bypass {
            self.bypass = false;
            debug!(key = ?event.key(), "typed character consumed by press");
            return false;
        }
        let event = Event::Key(event);
        self.agent.poll(&event);
        self.agent.handle(&event)
    }

    /// Key released.
    pub fn released(&mut self) {
        self.agent.reset_tracking();
        self.bypass = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{InputEvent, Modifiers};
    use crate::grabber::ShortcutGrabber;
    use crate::shortcut::Shortcut;
    use std::cell::RefCell;
    use std::rc::Rc;

    const VK_A: i32 = 65;

    fn setup(shortcuts: &[Shortcut]) -> (KeyboardAgent, Rc<RefCell<Vec<Event>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let mut keyboard = KeyboardAgent::default();
        keyboard.agent_mut().add_grabber(
            ShortcutGrabber::new("rec")
                .with_shortcuts(shortcuts.iter().copied())
                .with_action(move |e| sink.borrow_mut().push(e.clone())),
        );
        (keyboard, log)
    }

    #[test]
    fn test_consumed_press_bypasses_typed() {
        let (mut keyboard, log) = setup(&[
            Shortcut::key(Modifiers::empty(), VK_A),
            Shortcut::character('a'),
        ]);
        assert!(keyboard.pressed(KeyEvent::pressed(Modifiers::empty(), VK_A)));
        assert!(keyboard.bypass_pending());
        assert!(!keyboard.typed(KeyEvent::typed('a')));
        assert!(!keyboard.bypass_pending());
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_unclaimed_press_lets_typed_through() {
        let (mut keyboard, log) = setup(&[Shortcut::character('a')]);
        assert!(!keyboard.pressed(KeyEvent::pressed(Modifiers::empty(), VK_A)));
        assert!(!keyboard.bypass_pending());
        assert!(keyboard.typed(KeyEvent::typed('a')));
        assert_eq!(log.borrow()[0].shortcut(), Shortcut::character('a'));
    }

    #[test]
    fn test_release_clears_tracking_and_bypass() {
        let (mut keyboard, _) = setup(&[Shortcut::key(Modifiers::empty(), VK_A)]);
        keyboard.pressed(KeyEvent::pressed(Modifiers::empty(), VK_A));
        assert!(keyboard.agent().tracked_grabber().is_some());
        keyboard.released();
        assert!(keyboard.agent().tracked_grabber().is_none());
        assert!(!keyboard.bypass_pending());
    }
}
