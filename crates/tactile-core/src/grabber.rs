//! Receivers of input events.

use crate::event::{Event, InputEvent};
use crate::shortcut::Shortcut;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Handle of a grabber registered with an [`Agent`](crate::agent::Agent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GrabberId(pub u64);

impl fmt::Display for GrabberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grabber#{}", self.0)
    }
}

/// An object that can claim and consume input events.
///
/// `track` decides whether the grabber wants to own the interaction that
/// starts with `event`. `perform_interaction` consumes events once the
/// grabber is tracked (or is the agent's default grabber).
pub trait Grabber {
    /// Whether this grabber claims the event.
    fn track(&self, event: &Event) -> bool;

    /// Consume an event.
    fn perform_interaction(&mut self, event: &Event);
}

impl<G: Grabber + ?Sized> Grabber for Rc<RefCell<G>> {
    fn track(&self, event: &Event) -> bool {
        self.borrow().track(event)
    }

    fn perform_interaction(&mut self, event: &Event) {
        self.borrow_mut().perform_interaction(event);
    }
}

impl<G: Grabber + ?Sized> Grabber for Arc<Mutex<G>> {
    fn track(&self, event: &Event) -> bool {
        self.lock().track(event)
    }

    fn perform_interaction(&mut self, event: &Event) {
        self.lock().perform_interaction(event);
    }
}

type Action = Box<dyn FnMut(&Event)>;
type Filter = Box<dyn Fn(&Event) -> bool>;

/// Grabber that claims events whose shortcut is in a fixed set.
///
/// An optional filter narrows the match further (for example to a screen
/// region); an optional action runs on every delivered event.
pub struct ShortcutGrabber {
    name: String,
    shortcuts: Vec<Shortcut>,
    filter: Option<Filter>,
    action: Option<Action>,
    delivered: usize,
}

impl ShortcutGrabber {
    /// Create a grabber with no shortcuts.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shortcuts: Vec::new(),
            filter: None,
            action: None,
            delivered: 0,
        }
    }

    /// Add an accepted shortcut.
    pub fn with_shortcut(mut self, shortcut: Shortcut) -> Self {
        self.shortcuts.push(shortcut);
        self
    }

    /// Add several accepted shortcuts.
    pub fn with_shortcuts(mut self, shortcuts: impl IntoIterator<Item = Shortcut>) -> Self {
        self.shortcuts.extend(shortcuts);
        self
    }

    /// Require an extra predicate to hold before claiming an event.
    pub fn with_filter(mut self, filter: impl Fn(&Event) -> bool + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Run `action` on every delivered event.
    pub fn with_action(mut self, action: impl FnMut(&Event) + 'static) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    /// Grabber name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accepted shortcuts.
    pub fn shortcuts(&self) -> &[Shortcut] {
        &self.shortcuts
    }

    /// Number of events delivered so far.
    pub const fn delivered(&self) -> usize {
        self.delivered
    }

    /// Whether `shortcut` is in the accepted set.
    pub fn accepts(&self, shortcut: &Shortcut) -> bool {
        self.shortcuts.iter().any(|s| s.matches(shortcut))
    }
}

impl fmt::Debug for ShortcutGrabber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortcutGrabber")
            .field("name", &self.name)
            .field("shortcuts", &self.shortcuts)
            .field("has_filter", &self.filter.is_some())
            .field("delivered", &self.delivered)
            .finish()
    }
}

impl Grabber for ShortcutGrabber {
    fn track(&self, event: &Event) -> bool {
        self.accepts(&event.shortcut()) && self.filter.as_ref().map_or(true, |f| f(event))
    }

    fn perform_interaction(&mut self, event: &Event) {
        self.delivered += 1;
        if let Some(action) = self.action.as_mut() {
            action(event);
        }
    }
}
