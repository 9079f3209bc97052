// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The narrow surface a platform backend provides to the dispatch core.

use std::sync::Arc;

use trellis_input::CursorKind;

/// Native window state as reported by the backend.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WindowState {
    /// State unknown or not yet reported.
    #[default]
    Unspecified,
    /// Normal floating window.
    Normal,
    /// Maximized.
    Maximized,
    /// Minimized / iconified.
    Minimized,
    /// Fullscreen.
    Fullscreen,
    /// Alive but not rendering (e.g. app backgrounded).
    Paused,
    /// Hidden / withdrawn.
    Hidden,
    /// Close has been requested or completed.
    Closed,
}

impl WindowState {
    /// Whether a window in this state should receive invalidate requests.
    pub fn is_visible(self) -> bool {
        !matches!(
            self,
            Self::Minimized | Self::Paused | Self::Hidden | Self::Closed
        )
    }
}

bitflags::bitflags! {
    /// Window creation flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct WindowFlags: u8 {
        /// While shown, the parent window refuses all input.
        const MODAL     = 0b0000_0001;
        /// The window may be resized by the user.
        const RESIZABLE = 0b0000_0010;
    }
}

/// Operations the dispatch core needs from the platform window.
///
/// All methods are best-effort: a backend that cannot grab the pointer at the
/// OS level still gets correct in-window capture semantics from the core.
pub trait WindowBackend {
    /// Schedule a repaint.
    fn invalidate(&mut self);

    /// Enable or release the OS-level pointer grab.
    fn capture_mouse(&mut self, enabled: bool);

    /// Apply a pointer cursor shape.
    fn set_cursor(&mut self, cursor: CursorKind);

    /// A callback that posts a timer wake-up message onto the UI queue.
    ///
    /// Invoked from the clock thread; it must only enqueue and return. The
    /// UI loop reacts by calling [`crate::Window::handle_timer`].
    fn timer_waker(&self) -> Arc<dyn Fn() + Send + Sync>;

    /// Make the native window visible.
    fn show(&mut self);

    /// Request that the native window close.
    fn close(&mut self);

    /// Release native resources. Called exactly once, when the window is
    /// destroyed after removal from the platform registry.
    fn cleanup(&mut self);
}
