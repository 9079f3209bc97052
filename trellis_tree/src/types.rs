// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the element tree: identifiers, flags, and element data.

use kurbo::Rect;
use trellis_input::CursorKind;

/// Identifier for an element in the tree (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ElementId(pub(crate) u32, pub(crate) u32);

impl ElementId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Element flags consulted during event routing.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ElementFlags: u8 {
        /// Element is visible; invisible subtrees are skipped by hit testing.
        const VISIBLE      = 0b0000_0001;
        /// Element accepts input; disabled subtrees are skipped in
        /// enabled-only hit tests and by the keyboard focus walk.
        const ENABLED      = 0b0000_0010;
        /// Element can receive keyboard focus.
        const FOCUSABLE    = 0b0000_0100;
        /// Element wants key events routed through it when it is not focused
        /// (modal-subtree and unfocused-window key delivery).
        const KEY_TRACKING = 0b0000_1000;
        /// Keyboard bubbling stops at this element even when unhandled.
        const FOCUS_GROUP  = 0b0001_0000;
    }
}

impl Default for ElementFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::ENABLED
    }
}

/// Data stored per element.
///
/// Bounds are window coordinates; hit testing does not apply transforms.
#[derive(Clone, Debug)]
pub struct Element {
    /// Bounds in window coordinates.
    pub bounds: Rect,
    /// Routing flags.
    pub flags: ElementFlags,
    /// Cursor requested while the pointer is over this element.
    pub cursor: CursorKind,
}

impl Default for Element {
    fn default() -> Self {
        Self {
            bounds: Rect::ZERO,
            flags: ElementFlags::default(),
            cursor: CursorKind::Auto,
        }
    }
}

impl Element {
    /// An element with the given bounds and default flags.
    pub fn with_bounds(bounds: Rect) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }
}
