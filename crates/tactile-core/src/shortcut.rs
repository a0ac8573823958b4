//! Shortcut match keys and the id description registry.
//!
//! This module provides:
//! - [`Shortcut`], the key an event is matched against when binding behavior
//! - [`ShortcutKind`], the closed set of shortcut families
//! - [`ShortcutRegistry`], human-readable descriptions keyed by `(kind, id)`

use crate::event::{Modifiers, NO_ID};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Largest click or tap count an event can carry.
pub const MAX_COUNT: u8 = 3;

/// Clamp a raw click/tap count into `1..=MAX_COUNT`.
///
/// Counts `<= 0` become 1; counts above the maximum become the maximum.
pub fn normalize_count(count: i32) -> u8 {
    if count <= 0 {
        1
    } else if count > i32::from(MAX_COUNT) {
        warn!(count, "click count above {MAX_COUNT} clamped");
        MAX_COUNT
    } else {
        count as u8
    }
}

/// Shortcut family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortcutKind {
    /// Motion along one or more axes.
    Motion,
    /// Keyboard press or typed character.
    Key,
    /// Pointer click.
    Click,
    /// Touch tap.
    Tap,
}

impl ShortcutKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 4] = [Self::Motion, Self::Key, Self::Click, Self::Tap];

    /// Lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Motion => "motion",
            Self::Key => "key",
            Self::Click => "click",
            Self::Tap => "tap",
        }
    }
}

/// Kind-specific extra field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
enum Discriminator {
    Motion,
    Key(Option<char>),
    Click(u8),
    Tap(u8),
}

/// A match key: modifier mask plus id, refined per kind.
///
/// Two shortcuts match only when they are of the same kind and every field
/// is equal. Fields cannot change after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Shortcut {
    modifiers: Modifiers,
    id: i32,
    discriminator: Discriminator,
}

impl Shortcut {
    /// Shortcut for a motion gesture.
    pub const fn motion(modifiers: Modifiers, id: i32) -> Self {
        Self {
            modifiers,
            id,
            discriminator: Discriminator::Motion,
        }
    }

    /// Shortcut for a virtual-key press.
    pub const fn key(modifiers: Modifiers, virtual_key: i32) -> Self {
        Self {
            modifiers,
            id: virtual_key,
            discriminator: Discriminator::Key(None),
        }
    }

    /// Shortcut for a typed character with no modifiers.
    pub const fn character(key: char) -> Self {
        Self::character_with(Modifiers::empty(), key)
    }

    /// Shortcut for a typed character with modifiers.
    pub const fn character_with(modifiers: Modifiers, key: char) -> Self {
        Self {
            modifiers,
            id: NO_ID,
            discriminator: Discriminator::Key(Some(key)),
        }
    }

    /// Shortcut for a pointer click; the count is normalized.
    pub fn click(modifiers: Modifiers, button: i32, count: i32) -> Self {
        Self {
            modifiers,
            id: button,
            discriminator: Discriminator::Click(normalize_count(count)),
        }
    }

    /// Shortcut for a touch tap; the count is normalized.
    pub fn tap(modifiers: Modifiers, id: i32, count: i32) -> Self {
        Self {
            modifiers,
            id,
            discriminator: Discriminator::Tap(normalize_count(count)),
        }
    }

    /// The shortcut family.
    pub const fn kind(&self) -> ShortcutKind {
        match self.discriminator {
            Discriminator::Motion => ShortcutKind::Motion,
            Discriminator::Key(_) => ShortcutKind::Key,
            Discriminator::Click(_) => ShortcutKind::Click,
            Discriminator::Tap(_) => ShortcutKind::Tap,
        }
    }

    /// Modifier mask.
    pub const fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Device id (button, virtual key or gesture id).
    pub const fn id(&self) -> i32 {
        self.id
    }

    /// Click or tap count.
    pub const fn count(&self) -> Option<u8> {
        match self.discriminator {
            Discriminator::Click(count) | Discriminator::Tap(count) => Some(count),
            _ => None,
        }
    }

    /// Typed character for character shortcuts.
    pub const fn key_char(&self) -> Option<char> {
        match self.discriminator {
            Discriminator::Key(key) => key,
            _ => None,
        }
    }

    /// Whether `other` is the same kind with identical fields.
    pub fn matches(&self, other: &Self) -> bool {
        self == other
    }

    /// Description registered for this shortcut's id in the global registry.
    pub fn description(&self) -> Option<String> {
        ShortcutRegistry::global().description(self.kind(), self.id)
    }

    /// Get a display string for the shortcut.
    pub fn display(&self) -> String {
        let body = match self.discriminator {
            Discriminator::Key(Some(key)) => format!("'{key}'"),
            Discriminator::Key(None) => format!("Key{}", self.id),
            Discriminator::Motion => format!("Motion{}", self.id),
            Discriminator::Click(count) => format!("Button{} x{count}", self.id),
            Discriminator::Tap(count) => format!("Tap{} x{count}", self.id),
        };
        if self.modifiers.is_empty() {
            body
        } else {
            format!("{}+{}", self.modifiers.display(), body)
        }
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

static GLOBAL: Lazy<ShortcutRegistry> = Lazy::new(ShortcutRegistry::new);

/// Descriptions of shortcut ids, keyed by `(kind, id)`.
///
/// Registration is idempotent by id: the first description registered for a
/// `(kind, id)` pair stays in force.
#[derive(Debug, Default)]
pub struct ShortcutRegistry {
    entries: RwLock<HashMap<(ShortcutKind, i32), String>>,
}

impl ShortcutRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Record a description for `id` and return `id` unchanged.
    pub fn register_id(&self, kind: ShortcutKind, id: i32, description: &str) -> i32 {
        let mut entries = self.entries.write();
        match entries.get(&(kind, id)) {
            Some(existing) if existing != description => {
                warn!(
                    kind = kind.name(),
                    id,
                    existing = existing.as_str(),
                    ignored = description,
                    "shortcut id already registered"
                );
            }
            Some(_) => {}
            None => {
                entries.insert((kind, id), description.to_string());
            }
        }
        id
    }

    /// Register a description under the next free id for `kind`.
    ///
    /// Ids are allocated above the largest id registered for the kind and
    /// never collide with `NO_ID`. Once `i32::MAX` is taken the lowest free
    /// positive id is used instead. Returns `NO_ID` when every positive id is
    /// taken.
    pub fn register(&self, kind: ShortcutKind, description: &str) -> i32 {
        let mut entries = self.entries.write();
        let max = entries
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, id)| *id)
            .max()
            .unwrap_or(NO_ID);
        let next = max.max(NO_ID).checked_add(1).or_else(|| {
            (NO_ID + 1..=i32::MAX).find(|id| !entries.contains_key(&(kind, *id)))
        });
        let Some(next) = next else {
            warn!(kind = kind.name(), ignored = description, "no free shortcut id");
            return NO_ID;
        };
        entries.insert((kind, next), description.to_string());
        next
    }

    /// Whether `id` has a description for `kind`.
    pub fn has_id(&self, kind: ShortcutKind, id: i32) -> bool {
        self.entries.read().contains_key(&(kind, id))
    }

    /// Description of `id` for `kind`.
    pub fn description(&self, kind: ShortcutKind, id: i32) -> Option<String> {
        self.entries.read().get(&(kind, id)).cloned()
    }

    /// All `(id, description)` pairs registered for `kind`, sorted by id.
    pub fn descriptions(&self, kind: ShortcutKind) -> Vec<(i32, String)> {
        let entries = self.entries.read();
        let mut list: Vec<(i32, String)> = entries
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|((_, id), description)| (*id, description.clone()))
            .collect();
        list.sort_by_key(|(id, _)| *id);
        list
    }

    /// Number of registered descriptions across all kinds.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
