//! YAML trace format: grabber bindings plus a timeline of raw samples.
//!
//! ```yaml
//! grabbers:
//!   - name: canvas
//!     device: pointer
//!     accepts: ["motion:0", "click:1:2"]
//!     region: [0, 0, 400, 300]
//!   - name: shortcuts
//!     device: keyboard
//!     accepts: ["ctrl+char:z"]
//!     default: true
//! samples:
//!   - { kind: pointer_move, t: 0, x: 10, y: 10 }
//!   - { kind: key_typed, t: 5, key: "z", modifiers: [ctrl] }
//!   - { kind: frame, t: 16 }
//! ```

use crate::replay::ReplayError;
use serde::{Deserialize, Serialize};
use tactile_core::{GrabberPriority, Modifiers, Shortcut, NO_ID};

/// Device class an agent serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Device {
    Pointer,
    Keyboard,
    Touch,
}

impl Device {
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::Pointer => "pointer",
            Self::Keyboard => "keyboard",
            Self::Touch => "touch",
        }
    }
}

/// A recording grabber bound to one device.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct GrabberSpec {
    pub(crate) name: String,
    pub(crate) device: Device,
    #[serde(default)]
    pub(crate) accepts: Vec<String>,
    /// `[x0, y0, x1, y1]`; positioned events outside are declined.
    #[serde(default)]
    pub(crate) region: Option<[f32; 4]>,
    #[serde(default)]
    pub(crate) default: bool,
    #[serde(default)]
    pub(crate) priority: GrabberPriority,
}

fn default_button() -> i32 {
    tactile_core::LEFT_BUTTON
}

fn default_count() -> i32 {
    1
}

/// One raw device sample.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum Sample {
    PointerMove {
        t: u64,
        x: f32,
        y: f32,
        #[serde(default)]
        modifiers: Vec<String>,
    },
    PointerPress {
        t: u64,
        x: f32,
        y: f32,
        #[serde(default = "default_button")]
        button: i32,
        #[serde(default)]
        modifiers: Vec<String>,
    },
    PointerDrag {
        t: u64,
        x: f32,
        y: f32,
        #[serde(default = "default_button")]
        button: i32,
        #[serde(default)]
        modifiers: Vec<String>,
    },
    PointerRelease {
        t: u64,
        x: f32,
        y: f32,
        #[serde(default = "default_button")]
        button: i32,
        #[serde(default)]
        modifiers: Vec<String>,
    },
    PointerClick {
        t: u64,
        x: f32,
        y: f32,
        #[serde(default = "default_button")]
        button: i32,
        #[serde(default = "default_count")]
        count: i32,
        #[serde(default)]
        modifiers: Vec<String>,
    },
    Wheel {
        t: u64,
        delta: f32,
        #[serde(default)]
        modifiers: Vec<String>,
    },
    KeyPress {
        t: u64,
        code: i32,
        #[serde(default)]
        modifiers: Vec<String>,
    },
    KeyTyped {
        t: u64,
        key: char,
        #[serde(default)]
        modifiers: Vec<String>,
    },
    KeyRelease {
        t: u64,
    },
    TouchDown {
        t: u64,
        id: u32,
        x: f32,
        y: f32,
    },
    TouchMove {
        t: u64,
        id: u32,
        x: f32,
        y: f32,
    },
    TouchUp {
        t: u64,
        id: u32,
    },
    Frame {
        t: u64,
    },
}

/// A complete trace file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct Trace {
    #[serde(default)]
    pub(crate) grabbers: Vec<GrabberSpec>,
    #[serde(default)]
    pub(crate) samples: Vec<Sample>,
}

impl Trace {
    pub(crate) fn from_yaml(yaml: &str) -> Result<Self, ReplayError> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }
}

/// Parse modifier names (`shift`, `ctrl`, `meta`, `alt`, `altgr`).
pub(crate) fn parse_modifiers<S: AsRef<str>>(names: &[S]) -> Result<Modifiers, ReplayError> {
    names.iter().try_fold(Modifiers::empty(), |acc, name| {
        let flag = match name.as_ref().to_ascii_lowercase().as_str() {
            "shift" => Modifiers::SHIFT,
            "ctrl" | "control" => Modifiers::CTRL,
            "meta" | "cmd" => Modifiers::META,
            "alt" => Modifiers::ALT,
            "altgr" | "alt_graph" => Modifiers::ALT_GRAPH,
            other => return Err(ReplayError::Shortcut(format!("unknown modifier '{other}'"))),
        };
        Ok(acc | flag)
    })
}

fn parse_int(spec: &str, value: &str) -> Result<i32, ReplayError> {
    value
        .parse()
        .map_err(|_| ReplayError::Shortcut(format!("'{spec}': '{value}' is not a number")))
}

/// Parse a shortcut such as `motion:0`, `ctrl+key:65`, `char:a`,
/// `click:1:2` or `tap:100`.
pub(crate) fn parse_shortcut(spec: &str) -> Result<Shortcut, ReplayError> {
    let mut parts: Vec<&str> = spec.split('+').collect();
    let body = parts.pop().unwrap_or_default();
    let modifiers = parse_modifiers(&parts)?;

    let fields: Vec<&str> = body.split(':').collect();
    let shortcut = match fields.as_slice() {
        ["motion"] => Shortcut::motion(modifiers, NO_ID),
        ["motion", id] => Shortcut::motion(modifiers, parse_int(spec, id)?),
        ["key", code] => Shortcut::key(modifiers, parse_int(spec, code)?),
        ["char", c] => {
            let mut chars = c.chars();
            match (chars.next(), chars.next()) {
                (Some(key), None) => Shortcut::character_with(modifiers, key),
                _ => {
                    return Err(ReplayError::Shortcut(format!(
                        "'{spec}': expected a single character"
                    )))
                }
            }
        }
        ["click", button] => Shortcut::click(modifiers, parse_int(spec, button)?, 1),
        ["click", button, count] => {
            Shortcut::click(modifiers, parse_int(spec, button)?, parse_int(spec, count)?)
        }
        ["tap", id] => Shortcut::tap(modifiers, parse_int(spec, id)?, 1),
        ["tap", id, count] => {
            Shortcut::tap(modifiers, parse_int(spec, id)?, parse_int(spec, count)?)
        }
        _ => return Err(ReplayError::Shortcut(format!("unrecognized shortcut '{spec}'"))),
    };
    Ok(shortcut)
}
