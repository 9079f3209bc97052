// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Shell: the window-level event dispatch core.
//!
//! ## Overview
//!
//! This crate turns raw platform input into an ordered stream of semantic UI
//! events delivered to the right element, while tracking focus, mouse
//! capture, popup/modal stacking, timers, and redraw scheduling:
//!
//! - [`Window`] owns an element tree ([`trellis_tree`]), the transient input
//!   state, per-element handlers, a timer queue, and the dirty-flag pipeline
//!   behind [`Window::update`].
//! - [`WindowBackend`] is the narrow surface a platform implementation
//!   provides: invalidate, pointer grab, cursor, wake delivery, show/close.
//! - [`Platform`] owns every window, assigns [`WindowId`]s, maintains the
//!   modal-child counters, broadcasts theme and scale changes, and destroys
//!   closed windows one event-loop iteration after removal.
//! - [`EventPoster`]/[`EventList`] let background threads hand work to the
//!   UI thread; posted items run only once the wake message is pumped.
//!
//! All dispatch is single-threaded: handlers run on the UI thread and may
//! freely destroy elements, including the one being dispatched to. The core
//! re-validates every generational id after each call into user code.

mod backend;
mod events;
mod keyboard;
mod mouse;
mod platform;
mod window;

pub use backend::{WindowBackend, WindowFlags, WindowState};
pub use events::{EventList, EventPoster, Posted};
pub use platform::{Platform, WindowId, WindowMap};
pub use window::{
    DrawHook, EventCtx, KeyHandler, LayoutHook, MouseHandler, PostedHandler, RebuildHook,
    ShortcutHandler, StyleHook, WheelHandler, Window,
};
