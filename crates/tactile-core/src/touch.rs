//! Touch agent: feeds contacts to a [`TouchProcessor`] and dispatches the
//! gestures it recognizes.

use crate::agent::Agent;
use crate::config::AgentConfig;
use crate::event::TouchId;
use crate::gesture::{GestureConfig, TouchProcessor};
use std::sync::Arc;

/// Dispatches synthesized touch gestures.
///
/// The processor is shared through an `Arc` so a device thread can report
/// contacts while the frame thread calls [`TouchAgent::frame`].
#[derive(Debug)]
pub struct TouchAgent {
    agent: Agent,
    processor: Arc<TouchProcessor>,
}

impl Default for TouchAgent {
    fn default() -> Self {
        Self::new(AgentConfig::default(), GestureConfig::default())
    }
}

impl TouchAgent {
    /// Create a touch agent with its own processor.
    pub fn new(config: AgentConfig, gesture: GestureConfig) -> Self {
        Self::with_processor(config, Arc::new(TouchProcessor::new(gesture)))
    }

    /// Create a touch agent around an existing processor.
    pub fn with_processor(config: AgentConfig, processor: Arc<TouchProcessor>) -> Self {
        Self {
            agent: Agent::with_config("touch", config),
            processor,
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

    /// The shared recognizer.
    pub fn processor(&self) -> Arc<TouchProcessor> {
        Arc::clone(&self.processor)
    }

    /// Contact started.
    pub fn point_down(&self, x: f32, y: f32, id: TouchId) {
        self.processor.point_down(x, y, id);
    }

    /// Contact started at `at`.
    pub fn point_down_at(&self, x: f32, y: f32, id: TouchId, at: u64) {
        self.processor.point_down_at(x, y, id, at);
    }

    /// Contact moved.
    pub fn point_moved(&self, x: f32, y: f32, id: TouchId) {
        self.processor.point_moved(x, y, id);
    }

    /// Contact ended.
    pub fn point_up(&self, id: TouchId) {
        self.processor.point_up(id);
    }

    /// Contact ended at `at`.
    pub fn point_up_at(&self, id: TouchId, at: u64) {
        self.processor.point_up_at(id, at);
    }

    /// Classify and dispatch using the process clock.
    pub fn frame(&mut self) -> usize {
        self.frame_at(crate::clock::now_ms())
    }

    /// Classify, then poll and handle each gesture.
    ///
    /// The tracked grabber keeps a gesture it still accepts; one it declines
    /// moves to the next grabber that accepts it. Tracking is cleared once no
    /// contact remains. Returns the number of
    /// gestures delivered.
    pub fn frame_at(&mut self, now: u64) -> usize {
        self.processor.parse_at(now);
        let mut delivered = 0;
        for event in self.processor.drain_events() {
            self.agent.poll(&event);
            if self.agent.handle(&event) {
                delivered += 1;
            }
        }
        if self.processor.point_count() == 0 {
            self.agent.reset_tracking();
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, InputEvent, Modifiers};
    use crate::gesture::{DRAG_ONE_ID, DRAG_TWO_ID, PINCH_TWO_ID, TAP_ID};
    use crate::grabber::ShortcutGrabber;
    use crate::shortcut::Shortcut;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(shortcuts: &[Shortcut]) -> (ShortcutGrabber, Rc<RefCell<Vec<Event>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let g = ShortcutGrabber::new("rec")
            .with_shortcuts(shortcuts.iter().copied())
            .with_action(move |e| sink.borrow_mut().push(e.clone()));
        (g, log)
    }

    #[test]
    fn test_drag_tracked_until_lift() {
        let mut touch = TouchAgent::default();
        let (g, log) = recorder(&[Shortcut::motion(Modifiers::empty(), DRAG_TWO_ID)]);
        let id = touch.agent_mut().add_grabber(g);

        touch.point_down_at(100.0, 100.0, TouchId(1), 0);
        touch.point_down_at(120.0, 100.0, TouchId(2), 0);
        touch.point_moved(100.0, 110.0, TouchId(1));
        touch.point_moved(120.0, 110.0, TouchId(2));
        assert_eq!(touch.frame_at(10), 1);
        assert_eq!(touch.agent().tracked_grabber(), Some(id));

        touch.point_moved(100.0, 120.0, TouchId(1));
        touch.point_moved(120.0, 120.0, TouchId(2));
        assert_eq!(touch.frame_at(20), 1);

        touch.point_up_at(TouchId(1), 30);
        touch.point_up_at(TouchId(2), 30);
        touch.frame_at(40);
        assert_eq!(touch.agent().tracked_grabber(), None);

        let seen = log.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].as_motion().map(|m| m.dy()), Some(10.0));
    }

    #[test]
    fn test_pinch_after_drag_moves_to_pinch_grabber() {
        let mut touch = TouchAgent::default();
        let (drag, drag_log) = recorder(&[Shortcut::motion(Modifiers::empty(), DRAG_TWO_ID)]);
        let (pinch, pinch_log) = recorder(&[Shortcut::motion(Modifiers::empty(), PINCH_TWO_ID)]);
        let drag_id = touch.agent_mut().add_grabber(drag);
        let pinch_id = touch.agent_mut().add_grabber(pinch);

        touch.point_down_at(100.0, 100.0, TouchId(1), 0);
        touch.point_down_at(200.0, 100.0, TouchId(2), 0);
        touch.point_moved(100.0, 110.0, TouchId(1));
        touch.point_moved(200.0, 110.0, TouchId(2));
        assert_eq!(touch.frame_at(10), 1);
        assert_eq!(touch.agent().tracked_grabber(), Some(drag_id));

        touch.point_moved(90.0, 110.0, TouchId(1));
        touch.point_moved(210.0, 110.0, TouchId(2));
        assert_eq!(touch.frame_at(20), 1);
        assert_eq!(touch.agent().tracked_grabber(), Some(pinch_id));

        let drag_ids: Vec<i32> = drag_log.borrow().iter().map(|e| e.id()).collect();
        let pinch_ids: Vec<i32> = pinch_log.borrow().iter().map(|e| e.id()).collect();
        assert_eq!(drag_ids, vec![DRAG_TWO_ID]);
        assert_eq!(pinch_ids, vec![PINCH_TWO_ID]);
    }

    #[test]
    fn test_tap_dispatched_after_interval() {
        let mut touch = TouchAgent::default();
        let (g, log) = recorder(&[Shortcut::tap(Modifiers::empty(), TAP_ID, 1)]);
        touch.agent_mut().add_grabber(g);
        touch.point_down_at(5.0, 5.0, TouchId(1), 0);
        touch.point_up_at(TouchId(1), 30);
        assert_eq!(touch.frame_at(100), 0);
        assert_eq!(touch.frame_at(400), 1);
        assert_eq!(log.borrow()[0].id(), TAP_ID);
    }

    #[test]
    fn test_unclaimed_gesture_goes_to_default() {
        let mut touch = TouchAgent::default();
        let (g, log) = recorder(&[]);
        let id = touch.agent_mut().add_grabber(g);
        touch.agent_mut().set_default_grabber(id);
        touch.point_down_at(0.0, 0.0, TouchId(7), 0);
        touch.point_moved(4.0, 0.0, TouchId(7));
        assert_eq!(touch.frame_at(5), 1);
        assert_eq!(log.borrow()[0].id(), DRAG_ONE_ID);
    }

    #[test]
    fn test_shared_processor() {
        let touch = TouchAgent::default();
        let processor = touch.processor();
        processor.point_down_at(1.0, 1.0, TouchId(1), 0);
        assert_eq!(touch.processor().point_count(), 1);
    }
}
