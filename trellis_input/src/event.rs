// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mouse, keyboard, and wheel event value types.
//!
//! Events are plain data. Synthetic variants (`FocusIn`, `FocusOut`, `Leave`,
//! `Cancel`) are derived from a real event via [`MouseEvent::change_action`],
//! which preserves position, button state, and modifiers so handlers can
//! reason about the gesture that produced them.

use alloc::string::String;
use kurbo::Point;

bitflags::bitflags! {
    /// Keyboard modifier state.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Either shift key.
        const SHIFT   = 0b0000_0001;
        /// Either control key.
        const CONTROL = 0b0000_0010;
        /// Either alt/option key.
        const ALT     = 0b0000_0100;
        /// Either meta/super/command key.
        const META    = 0b0000_1000;
    }
}

bitflags::bitflags! {
    /// Set of mouse buttons currently held down.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MouseButtons: u8 {
        /// Left (primary) button.
        const LEFT   = 0b0000_0001;
        /// Right (secondary) button.
        const RIGHT  = 0b0000_0010;
        /// Middle (wheel) button.
        const MIDDLE = 0b0000_0100;
        /// First extra button.
        const X1     = 0b0000_1000;
        /// Second extra button.
        const X2     = 0b0001_0000;
    }
}

/// The button an event refers to, if any.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// No specific button (move, leave, wheel).
    #[default]
    None,
    /// Left (primary) button.
    Left,
    /// Right (secondary) button.
    Right,
    /// Middle (wheel) button.
    Middle,
    /// First extra button.
    X1,
    /// Second extra button.
    X2,
}

impl MouseButton {
    /// The bitset flag for this button, empty for [`MouseButton::None`].
    pub fn as_flag(self) -> MouseButtons {
        match self {
            Self::None => MouseButtons::empty(),
            Self::Left => MouseButtons::LEFT,
            Self::Right => MouseButtons::RIGHT,
            Self::Middle => MouseButtons::MIDDLE,
            Self::X1 => MouseButtons::X1,
            Self::X2 => MouseButtons::X2,
        }
    }

    /// Small dense index used by per-button trackers.
    pub(crate) fn index(self) -> usize {
        match self {
            Self::None => 0,
            Self::Left => 1,
            Self::Right => 2,
            Self::Middle => 3,
            Self::X1 => 4,
            Self::X2 => 5,
        }
    }
}

/// What a [`MouseEvent`] describes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MouseAction {
    /// Pointer motion.
    Move,
    /// A button transitioned to pressed.
    ButtonDown,
    /// A button transitioned to released.
    ButtonUp,
    /// Wheel motion reported through the mouse path.
    Wheel,
    /// Pointer left the window (or a tracked element, when synthetic).
    Leave,
    /// Synthetic: pointer re-entered the captured element.
    FocusIn,
    /// Synthetic: pointer left the captured element while buttons were held.
    FocusOut,
    /// Synthetic: the capture gesture was aborted; no further events follow.
    Cancel,
}

/// A mouse event in window coordinates.
#[derive(Clone, Debug)]
pub struct MouseEvent {
    /// What happened.
    pub action: MouseAction,
    /// The button this event refers to, if any.
    pub button: MouseButton,
    /// Button state *after* this event was applied.
    pub buttons: MouseButtons,
    /// Keyboard modifiers at event time.
    pub modifiers: Modifiers,
    /// Pointer position in window coordinates.
    pub pos: Point,
    /// When set on a `ButtonDown`, a handler accepting the event does not
    /// acquire mouse capture.
    pub do_not_track: bool,
    /// Set by the dispatcher when this `ButtonDown` is the second press of a
    /// double click.
    pub double_click: bool,
}

impl MouseEvent {
    /// Create a new event.
    pub fn new(
        action: MouseAction,
        button: MouseButton,
        buttons: MouseButtons,
        modifiers: Modifiers,
        pos: Point,
    ) -> Self {
        Self {
            action,
            button,
            buttons,
            modifiers,
            pos,
            do_not_track: false,
            double_click: false,
        }
    }

    /// Derive a synthetic event from this one, keeping position, buttons,
    /// and modifiers.
    pub fn change_action(&self, action: MouseAction) -> Self {
        Self {
            action,
            ..self.clone()
        }
    }
}

/// What a [`KeyEvent`] describes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// A key transitioned to pressed.
    KeyDown,
    /// A key transitioned to released.
    KeyUp,
    /// Committed text input.
    Text,
}

/// Logical key identity.
///
/// Only the keys the dispatch core needs to distinguish are named; everything
/// else arrives as [`Key::Character`] or [`Key::Unidentified`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character key.
    Character(char),
    /// Enter / return.
    Enter,
    /// Escape.
    Escape,
    /// Tab.
    Tab,
    /// Space bar.
    Space,
    /// Backspace.
    Backspace,
    /// Forward delete.
    Delete,
    /// Insert.
    Insert,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Left arrow.
    ArrowLeft,
    /// Right arrow.
    ArrowRight,
    /// Up arrow.
    ArrowUp,
    /// Down arrow.
    ArrowDown,
    /// Function key (1-based).
    Function(u8),
    /// Left shift.
    ShiftLeft,
    /// Right shift.
    ShiftRight,
    /// Left control.
    ControlLeft,
    /// Right control.
    ControlRight,
    /// Left alt/option.
    AltLeft,
    /// Right alt/option.
    AltRight,
    /// Left meta/super/command.
    MetaLeft,
    /// Right meta/super/command.
    MetaRight,
    /// A key the backend could not map; carries the raw platform keycode.
    Unidentified(u32),
}

impl Key {
    /// Whether this is a bare modifier key (either side).
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            Self::ShiftLeft
                | Self::ShiftRight
                | Self::ControlLeft
                | Self::ControlRight
                | Self::AltLeft
                | Self::AltRight
                | Self::MetaLeft
                | Self::MetaRight
        )
    }
}

/// A keyboard event.
#[derive(Clone, Debug)]
pub struct KeyEvent {
    /// What happened.
    pub action: KeyAction,
    /// Logical key identity.
    pub key: Key,
    /// Modifier state at event time.
    pub modifiers: Modifiers,
    /// Committed text for [`KeyAction::Text`] events.
    pub text: Option<String>,
}

impl KeyEvent {
    /// Create a key press/release event.
    pub fn new(action: KeyAction, key: Key, modifiers: Modifiers) -> Self {
        Self {
            action,
            key,
            modifiers,
            text: None,
        }
    }

    /// Create a text-input event.
    pub fn text(text: String, modifiers: Modifiers) -> Self {
        Self {
            action: KeyAction::Text,
            key: Key::Unidentified(0),
            modifiers,
            text: Some(text),
        }
    }

    /// Strip control characters (below space, and DEL) from the text payload.
    ///
    /// Returns `false` when nothing dispatchable remains, in which case the
    /// event must be dropped.
    pub fn sanitize_text(&mut self) -> bool {
        let Some(text) = self.text.take() else {
            return false;
        };
        let filtered: String = text.chars().filter(|c| !is_control_char(*c)).collect();
        if filtered.is_empty() {
            return false;
        }
        self.text = Some(filtered);
        true
    }
}

fn is_control_char(c: char) -> bool {
    c < ' ' || c == '\u{7f}'
}

/// A wheel event in window coordinates.
#[derive(Clone, Copy, Debug)]
pub struct WheelEvent {
    /// Pointer position in window coordinates.
    pub pos: Point,
    /// Modifier state at event time.
    pub modifiers: Modifiers,
    /// Horizontal scroll delta, positive to the right.
    pub delta_x: f64,
    /// Vertical scroll delta, positive away from the user.
    pub delta_y: f64,
}

/// Pointer cursor shape requested by an element.
///
/// [`CursorKind::Auto`] defers to the next element in the bubble walk; the
/// first non-`Auto` cursor encountered wins for the whole dispatch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CursorKind {
    /// No preference; inherit from the rest of the walk (default).
    #[default]
    Auto,
    /// Standard arrow.
    Arrow,
    /// Pointing hand (links, buttons).
    Hand,
    /// Text caret.
    IBeam,
    /// Crosshair.
    Crosshair,
    /// Four-direction move.
    Move,
    /// Vertical resize.
    SizeNs,
    /// Horizontal resize.
    SizeWe,
    /// Action not allowed.
    NotAllowed,
    /// Hide the cursor.
    Hidden,
}
