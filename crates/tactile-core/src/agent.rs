//! Per-device dispatch: polling grabbers and routing events to the owner.
//!
//! An [`Agent`] keeps the grabbers of one device class. [`Agent::poll`] asks
//! them, in a fixed order, whether they claim an event and remembers the
//! first that does as the *tracked* grabber. [`Agent::handle`] then delivers
//! events to the tracked grabber, or to the default grabber when nothing is
//! tracked.

use crate::config::AgentConfig;
use crate::event::{Event, InputEvent};
use crate::grabber::{Grabber, GrabberId};
use crate::motion::MAX_AXES;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Polling priority among registered grabbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum GrabberPriority {
    /// Polled last.
    Low = 0,
    /// Default priority.
    #[default]
    Normal = 1,
    /// Polled first.
    High = 2,
}

struct GrabberEntry {
    id: GrabberId,
    priority: GrabberPriority,
    grabber: Box<dyn Grabber>,
}

/// Grabber registry and tracking state for one device class.
pub struct Agent {
    name: String,
    entries: Vec<GrabberEntry>,
    tracked: Option<GrabberId>,
    default_grabber: Option<GrabberId>,
    config: AgentConfig,
    next_id: u64,
}

impl Agent {
    /// Create an agent with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, AgentConfig::default())
    }

    /// Create an agent with explicit settings.
    pub fn with_config(name: impl Into<String>, config: AgentConfig) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            tracked: None,
            default_grabber: None,
            config,
            next_id: 1,
        }
    }

    /// Agent name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current settings.
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Mutable settings.
    pub fn config_mut(&mut self) -> &mut AgentConfig {
        &mut self.config
    }

    /// Replace the per-axis sensitivities.
    pub fn set_sensitivities(&mut self, sensitivities: [f32; MAX_AXES]) {
        self.config.sensitivities = sensitivities;
    }

    /// Register a grabber with normal priority.
    pub fn add_grabber(&mut self, grabber: impl Grabber + 'static) -> GrabberId {
        self.add_grabber_with_priority(grabber, GrabberPriority::Normal)
    }

    /// Register a grabber with a priority.
    ///
    /// Higher priorities are polled first; equal priorities keep registration
    /// order.
    pub fn add_grabber_with_priority(
        &mut self,
        grabber: impl Grabber + 'static,
        priority: GrabberPriority,
    ) -> GrabberId {
        let id = GrabberId(self.next_id);
        self.next_id += 1;
        let at = self
            .entries
            .iter()
            .position(|e| e.priority < priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            at,
            GrabberEntry {
                id,
                priority,
                grabber: Box::new(grabber),
            },
        );
        id
    }

    /// Unregister a grabber, clearing tracked/default references to it.
    pub fn remove_grabber(&mut self, id: GrabberId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.tracked == Some(id) {
            self.tracked = None;
        }
        if self.default_grabber == Some(id) {
            self.default_grabber = None;
        }
        self.entries.len() != before
    }

    /// Make a registered grabber the default receiver.
    pub fn set_default_grabber(&mut self, id: GrabberId) -> bool {
        if self.entry(id).is_none() {
            return false;
        }
        self.default_grabber = Some(id);
        true
    }

    /// Remove the default receiver.
    pub fn clear_default_grabber(&mut self) {
        self.default_grabber = None;
    }

    /// Allow `poll` to change the tracked grabber.
    pub fn enable_tracking(&mut self) {
        self.config.tracking = true;
    }

    /// Freeze the tracked grabber; `poll` returns it unchanged.
    pub fn disable_tracking(&mut self) {
        self.config.tracking = false;
    }

    /// Whether tracking is enabled.
    pub const fn is_tracking(&self) -> bool {
        self.config.tracking
    }

    /// The tracked grabber.
    pub const fn tracked_grabber(&self) -> Option<GrabberId> {
        self.tracked
    }

    /// The default grabber.
    pub const fn default_grabber(&self) -> Option<GrabberId> {
        self.default_grabber
    }

    /// The grabber `handle` would deliver to now.
    pub fn input_grabber(&self) -> Option<GrabberId> {
        self.tracked.or(self.default_grabber)
    }

    /// Access a registered grabber.
    pub fn grabber(&self, id: GrabberId) -> Option<&dyn Grabber> {
        self.entry(id).map(|e| e.grabber.as_ref())
    }

    /// Mutably access a registered grabber.
    pub fn grabber_mut(&mut self, id: GrabberId) -> Option<&mut (dyn Grabber + 'static)> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .map(|e| e.grabber.as_mut())
    }

    /// Number of registered grabbers.
    pub fn grabber_count(&self) -> usize {
        self.entries.len()
    }

    fn entry(&self, id: GrabberId) -> Option<&GrabberEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Choose the grabber that owns the interaction starting with `event`.
    ///
    /// With tracking disabled the tracked grabber is returned unchanged.
    /// Otherwise the default grabber is asked first, then the tracked one,
    /// then the rest by priority and registration order. Tracking is cleared
    /// when nobody claims the event.
    pub fn poll(&mut self, event: &Event) -> Option<GrabberId> {
        if !self.config.tracking {
            return self.tracked;
        }

        let mut order: Vec<GrabberId> = Vec::with_capacity(self.entries.len());
        order.extend(self.default_grabber);
        order.extend(self.tracked.filter(|t| Some(*t) != self.default_grabber));
        order.extend(
            self.entries
                .iter()
                .map(|e| e.id)
                .filter(|id| Some(*id) != self.default_grabber && Some(*id) != self.tracked),
        );

        let previous = self.tracked;
        self.tracked = order
            .into_iter()
            .find(|id| self.entry(*id).is_some_and(|e| e.grabber.track(event)));

        if self.tracked != previous {
            debug!(
                agent = %self.name,
                from = ?previous,
                to = ?self.tracked,
                shortcut = %event.shortcut(),
                "tracked grabber changed"
            );
        }
        self.tracked
    }

    /// Deliver an event to the tracked grabber, else the default grabber.
    ///
    /// Absolute motion that is null and not flushed is dropped; absolute
    /// motion is scaled by the sensitivities before delivery. Returns whether
    /// a grabber received the event.
    pub fn handle(&mut self, event: &Event) -> bool {
        let modulated;
        let event = match event {
            Event::Motion(motion) if motion.is_absolute() => {
                if motion.is_null() && !motion.flushed() {
                    trace!(agent = %self.name, "null motion dropped");
                    return false;
                }
                modulated = Event::Motion(motion.modulate(&self.config.sensitivities));
                &modulated
            }
            _ => event,
        };

        let Some(target) = self.input_grabber() else {
            trace!(agent = %self.name, shortcut = %event.shortcut(), "no receiver");
            return false;
        };
        let name = self.name.clone();
        match self.grabber_mut(target) {
            Some(grabber) => {
                trace!(agent = %name, grabber = %target, shortcut = %event.shortcut(), "deliver");
                grabber.perform_interaction(event);
                true
            }
            None => false,
        }
    }

    /// Forget the tracked grabber.
    pub fn reset_tracking(&mut self) {
        if let Some(previous) = self.tracked.take() {
            debug!(agent = %self.name, grabber = %previous, "tracking reset");
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("grabbers", &self.entries.iter().map(|e| e.id).collect::<Vec<_>>())
            .field("tracked", &self.tracked)
            .field("default_grabber", &self.default_grabber)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeyEvent, Modifiers, NO_ID};
    use crate::grabber::ShortcutGrabber;
    use crate::motion::{Dof, MotionEvent};
    use crate::shortcut::Shortcut;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(name: &str, shortcut: Shortcut) -> (ShortcutGrabber, Rc<RefCell<Vec<Event>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let g = ShortcutGrabber::new(name)
            .with_shortcut(shortcut)
            .with_action(move |e| sink.borrow_mut().push(e.clone()));
        (g, log)
    }

    fn key(c: char) -> Event {
        KeyEvent::typed(c).into()
    }

    #[test]
    fn test_poll_selects_first_accepting() {
        let mut agent = Agent::new("keyboard");
        let (a, _) = recorder("a", Shortcut::character('a'));
        let (b, _) = recorder("b", Shortcut::character('b'));
        let ia = agent.add_grabber(a);
        let ib = agent.add_grabber(b);
        assert_eq!(agent.poll(&key('b')), Some(ib));
        assert_eq!(agent.poll(&key('a')), Some(ia));
        assert_eq!(agent.poll(&key('z')), None);
        assert_eq!(agent.tracked_grabber(), None);
    }

    #[test]
    fn test_handle_delivers_to_tracked_until_reset() {
        let mut agent = Agent::new("keyboard");
        let (a, log) = recorder("a", Shortcut::character('a'));
        let ia = agent.add_grabber(a);
        assert_eq!(agent.poll(&key('a')), Some(ia));
        assert!(agent.handle(&key('a')));
        assert!(agent.handle(&key('q')));
        assert_eq!(log.borrow().len(), 2);
        agent.reset_tracking();
        assert!(!agent.handle(&key('a')));
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_default_grabber_receives_untracked() {
        let mut agent = Agent::new("pointer");
        let (d, log) = recorder("default", Shortcut::character('x'));
        let id = agent.add_grabber(d);
        assert!(agent.set_default_grabber(id));
        assert_eq!(agent.input_grabber(), Some(id));
        assert!(agent.handle(&key('q')));
        assert_eq!(log.borrow().len(), 1);
        assert!(!agent.set_default_grabber(GrabberId(99)));
    }

    #[test]
    fn test_default_grabber_polled_first() {
        let mut agent = Agent::new("keyboard");
        let (a, _) = recorder("a", Shortcut::character('a'));
        let (d, _) = recorder("d", Shortcut::character('a'));
        let _ia = agent.add_grabber(a);
        let id = agent.add_grabber(d);
        agent.set_default_grabber(id);
        assert_eq!(agent.poll(&key('a')), Some(id));
    }

    #[test]
    fn test_tracked_grabber_shadows_default_until_reset() {
        let mut agent = Agent::new("keyboard");
        let (d, default_log) = recorder("default", Shortcut::character('x'));
        let (g, grab_log) = recorder("g", Shortcut::character('a'));
        let id = agent.add_grabber(d);
        let ig = agent.add_grabber(g);
        agent.set_default_grabber(id);

        assert_eq!(agent.poll(&key('a')), Some(ig));
        assert!(agent.handle(&key('a')));
        assert!(agent.handle(&key('b')));
        assert!(agent.handle(&key('x')));
        assert_eq!(grab_log.borrow().len(), 3);
        assert!(default_log.borrow().is_empty());

        agent.reset_tracking();
        assert!(agent.handle(&key('a')));
        assert_eq!(grab_log.borrow().len(), 3);
        assert_eq!(default_log.borrow().len(), 1);
    }

    #[test]
    fn test_tracked_grabber_is_sticky() {
        let mut agent = Agent::new("keyboard");
        let (first, _) = recorder("first", Shortcut::character('a'));
        let second = ShortcutGrabber::new("second")
            .with_shortcuts([Shortcut::character('a'), Shortcut::character('b')]);
        let i1 = agent.add_grabber(first);
        let i2 = agent.add_grabber(second);
        assert_eq!(agent.poll(&key('a')), Some(i1));
        assert_eq!(agent.poll(&key('b')), Some(i2));
        // Both accept 'a'; the current owner keeps it
        assert_eq!(agent.poll(&key('a')), Some(i2));
        agent.reset_tracking();
        assert_eq!(agent.poll(&key('a')), Some(i1));
    }

    #[test]
    fn test_priority_order() {
        let mut agent = Agent::new("keyboard");
        let (low, _) = recorder("low", Shortcut::character('a'));
        let (high, _) = recorder("high", Shortcut::character('a'));
        let _il = agent.add_grabber_with_priority(low, GrabberPriority::Low);
        let ih = agent.add_grabber_with_priority(high, GrabberPriority::High);
        assert_eq!(agent.poll(&key('a')), Some(ih));
    }

    #[test]
    fn test_disabled_tracking_freezes_owner() {
        let mut agent = Agent::new("keyboard");
        let (a, _) = recorder("a", Shortcut::character('a'));
        let (b, _) = recorder("b", Shortcut::character('b'));
        let ia = agent.add_grabber(a);
        agent.add_grabber(b);
        agent.poll(&key('a'));
        agent.disable_tracking();
        assert!(!agent.is_tracking());
        assert_eq!(agent.poll(&key('b')), Some(ia));
        agent.enable_tracking();
        assert_ne!(agent.poll(&key('b')), Some(ia));
    }

    #[test]
    fn test_null_absolute_motion_dropped() {
        let mut agent = Agent::new("wheel");
        let (g, log) = recorder("g", Shortcut::motion(Modifiers::empty(), NO_ID));
        let id = agent.add_grabber(g);
        agent.set_default_grabber(id);
        let null = MotionEvent::absolute(Dof::Two, &[0.0, 0.0], Modifiers::empty(), NO_ID);
        assert!(!agent.handle(&null.clone().into()));
        assert!(agent.handle(&null.flush().into()));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_absolute_motion_modulated() {
        let mut agent = Agent::new("wheel");
        agent.set_sensitivities([2.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let (g, log) = recorder("g", Shortcut::motion(Modifiers::empty(), 8));
        let id = agent.add_grabber(g);
        agent.set_default_grabber(id);
        let e = MotionEvent::absolute(Dof::One, &[1.5], Modifiers::empty(), 8);
        assert!(agent.handle(&e.into()));
        let seen = log.borrow();
        assert_eq!(seen[0].as_motion().map(MotionEvent::dx), Some(3.0));
    }

    #[test]
    fn test_remove_grabber_clears_references() {
        let mut agent = Agent::new("keyboard");
        let (a, _) = recorder("a", Shortcut::character('a'));
        let id = agent.add_grabber(a);
        agent.set_default_grabber(id);
        agent.poll(&key('a'));
        assert!(agent.remove_grabber(id));
        assert_eq!(agent.tracked_grabber(), None);
        assert_eq!(agent.default_grabber(), None);
        assert_eq!(agent.grabber_count(), 0);
        assert!(!agent.remove_grabber(id));
    }

    #[test]
    fn test_grabber_accessors() {
        let mut agent = Agent::new("keyboard");
        let (a, _) = recorder("a", Shortcut::character('a'));
        let id = agent.add_grabber(a);
        assert!(agent.grabber(id).is_some_and(|g| g.track(&key('a'))));
        if let Some(g) = agent.grabber_mut(id) {
            g.perform_interaction(&key('a'));
        }
        assert!(agent.grabber(GrabberId(42)).is_none());
        assert_eq!(agent.name(), "keyboard");
    }
}
