//! Input abstraction layer.
//!
//! Normalizes browser pointer and keyboard events into a unified
//! `InputEvent` consumed by the tools and the shortcut map. Pointer
//! coordinates are canvas space.

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// ⌘ on macOS, Ctrl elsewhere.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Decode the bit set sent by the browser bridge:
    /// 1 = shift, 2 = ctrl, 4 = alt, 8 = meta.
    pub fn from_bits(bits: u8) -> Self {
        Self {
            shift: bits & 1 != 0,
            ctrl: bits & 2 != 0,
            alt: bits & 4 != 0,
            meta: bits & 8 != 0,
        }
    }
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32, modifiers: Modifiers },

    PointerMove { x: f32, y: f32, modifiers: Modifiers },

    PointerUp { x: f32, y: f32, modifiers: Modifiers },

    /// Keyboard event. `text_focused` is set while a text input (a
    /// properties-panel field) has focus.
    Key {
        key: String,
        modifiers: Modifiers,
        text_focused: bool,
    },
}

impl InputEvent {
    pub fn from_pointer_down(x: f32, y: f32, modifiers: Modifiers) -> Self {
        Self::PointerDown { x, y, modifiers }
    }

    pub fn from_pointer_move(x: f32, y: f32, modifiers: Modifiers) -> Self {
        Self::PointerMove { x, y, modifiers }
    }

    pub fn from_pointer_up(x: f32, y: f32, modifiers: Modifiers) -> Self {
        Self::PointerUp { x, y, modifiers }
    }

    pub fn key(key: &str, modifiers: Modifiers, text_focused: bool) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers,
            text_focused,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f32, f32)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. } => Some((*x, *y)),
            Self::Key { .. } => None,
        }
    }
}
