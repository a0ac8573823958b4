//! Drive the three device agents from a trace and record every delivery.

use crate::trace::{parse_modifiers, parse_shortcut, Device, GrabberSpec, Sample, Trace};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use tactile_core::{
    ConfigError, Event, InputEvent, KeyEvent, KeyboardAgent, PointerAgent, PointerSample,
    ShortcutGrabber, TactileConfig, TouchAgent, TouchId,
};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while loading or replaying a trace.
#[derive(Debug, Error)]
pub(crate) enum ReplayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid trace: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid shortcut: {0}")]
    Shortcut(String),
}

/// One event received by one grabber.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Delivery {
    pub(crate) t: u64,
    pub(crate) device: &'static str,
    pub(crate) grabber: String,
    pub(crate) shortcut: String,
    pub(crate) event: Event,
}

impl Delivery {
    pub(crate) fn to_text(&self) -> String {
        let mut line = format!(
            "{:>6} {:<8} {:<12} {}",
            self.t, self.device, self.grabber, self.shortcut
        );
        if let Some(motion) = self.event.as_motion() {
            let values: Vec<String> = motion.delta().iter().map(|d| format!("{d:.2}")).collect();
            line.push_str(&format!(" d=[{}]", values.join(", ")));
        }
        if self.event.fired() {
            line.push_str(" fired");
        }
        if self.event.flushed() {
            line.push_str(" flushed");
        }
        line
    }
}

type Log = Rc<RefCell<Vec<Delivery>>>;

fn within(region: [f32; 4], event: &Event) -> bool {
    let position = event.position().or_else(|| {
        event
            .as_motion()
            .filter(|m| m.is_relative())
            .map(|m| (m.x(), m.y()))
    });
    position.map_or(true, |(x, y)| {
        x >= region[0] && y >= region[1] && x <= region[2] && y <= region[3]
    })
}

fn recording_grabber(spec: &GrabberSpec, log: &Log) -> Result<ShortcutGrabber, ReplayError> {
    let shortcuts = spec
        .accepts
        .iter()
        .map(|s| parse_shortcut(s))
        .collect::<Result<Vec<_>, _>>()?;
    let sink = Rc::clone(log);
    let device = spec.device.name();
    let name = spec.name.clone();
    let mut grabber = ShortcutGrabber::new(spec.name.clone())
        .with_shortcuts(shortcuts)
        .with_action(move |event| {
            sink.borrow_mut().push(Delivery {
                t: event.timestamp(),
                device,
                grabber: name.clone(),
                shortcut: event.shortcut().to_string(),
                event: event.clone(),
            });
        });
    if let Some(region) = spec.region {
        grabber = grabber.with_filter(move |event| within(region, event));
    }
    Ok(grabber)
}

/// The three device agents wired to recording grabbers.
pub(crate) struct Replayer {
    pointer: PointerAgent,
    keyboard: KeyboardAgent,
    touch: TouchAgent,
    log: Log,
}

impl Replayer {
    pub(crate) fn new(
        config: &TactileConfig,
        grabbers: &[GrabberSpec],
    ) -> Result<Self, ReplayError> {
        let mut replayer = Self {
            pointer: PointerAgent::new(config.pointer.clone()),
            keyboard: KeyboardAgent::new(config.keyboard.clone()),
            touch: TouchAgent::new(config.touch.clone(), config.gesture.clone()),
            log: Rc::new(RefCell::new(Vec::new())),
        };
        for spec in grabbers {
            let grabber = recording_grabber(spec, &replayer.log)?;
            let agent = match spec.device {
                Device::Pointer => replayer.pointer.agent_mut(),
                Device::Keyboard => replayer.keyboard.agent_mut(),
                Device::Touch => replayer.touch.agent_mut(),
            };
            let id = agent.add_grabber_with_priority(grabber, spec.priority);
            if spec.default {
                agent.set_default_grabber(id);
            }
            debug!(grabber = %spec.name, device = spec.device.name(), %id, "grabber registered");
        }
        Ok(replayer)
    }

    fn pointer_sample(
        x: f32,
        y: f32,
        button: i32,
        modifiers: &[String],
        t: u64,
    ) -> Result<PointerSample, ReplayError> {
        Ok(PointerSample::new(x, y)
            .with_button(button)
            .with_modifiers(parse_modifiers(modifiers)?)
            .at(t))
    }

    /// Feed one sample to its agent.
    pub(crate) fn feed(&mut self, sample: &Sample) -> Result<(), ReplayError> {
        match sample {
            Sample::PointerMove { t, x, y, modifiers } => {
                let s = Self::pointer_sample(*x, *y, tactile_core::NO_ID, modifiers, *t)?;
                self.pointer.moved(&s);
            }
            Sample::PointerPress { t, x, y, button, modifiers } => {
                let s = Self::pointer_sample(*x, *y, *button, modifiers, *t)?;
                self.pointer.pressed(&s);
            }
            Sample::PointerDrag { t, x, y, button, modifiers } => {
                let s = Self::pointer_sample(*x, *y, *button, modifiers, *t)?;
                self.pointer.dragged(&s);
            }
            Sample::PointerRelease { t, x, y, button, modifiers } => {
                let s = Self::pointer_sample(*x, *y, *button, modifiers, *t)?;
                self.pointer.released(&s);
            }
            Sample::PointerClick { t, x, y, button, count, modifiers } => {
                let s = Self::pointer_sample(*x, *y, *button, modifiers, *t)?;
                self.pointer.clicked(&s, *count);
            }
            Sample::Wheel { t, delta, modifiers } => {
                self.pointer.wheel(*delta, parse_modifiers(modifiers)?, *t);
            }
            Sample::KeyPress { t, code, modifiers } => {
                self.keyboard
                    .pressed(KeyEvent::pressed(parse_modifiers(modifiers)?, *code).at(*t));
            }
            Sample::KeyTyped { t, key, modifiers } => {
                self.keyboard
                    .typed(KeyEvent::typed_with(parse_modifiers(modifiers)?, *key).at(*t));
            }
            Sample::KeyRelease { .. } => self.keyboard.released(),
            Sample::TouchDown { t, id, x, y } => self.touch.point_down_at(*x, *y, TouchId(*id), *t),
            Sample::TouchMove { id, x, y, .. } => self.touch.point_moved(*x, *y, TouchId(*id)),
            Sample::TouchUp { t, id } => self.touch.point_up_at(TouchId(*id), *t),
            Sample::Frame { t } => {
                self.touch.frame_at(*t);
            }
        }
        Ok(())
    }

    /// Deliveries recorded so far.
    pub(crate) fn deliveries(&self) -> Vec<Delivery> {
        self.log.borrow().clone()
    }
}

/// Replay every sample of `trace` and return the deliveries in order.
pub(crate) fn replay(trace: &Trace, config: &TactileConfig) -> Result<Vec<Delivery>, ReplayError> {
    let mut replayer = Replayer::new(config, &trace.grabbers)?;
    for sample in &trace.samples {
        replayer.feed(sample)?;
    }
    let deliveries = replayer.deliveries();
    info!(
        samples = trace.samples.len(),
        deliveries = deliveries.len(),
        "replay finished"
    );
    Ok(deliveries)
}
