// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Input: value types for the window dispatch core.
//!
//! ## Overview
//!
//! This crate defines the in-process boundary between a platform backend and
//! the window dispatch core: plain-data mouse, keyboard, and wheel events,
//! the modifier and button bitsets that travel with them, and cursor kinds.
//!
//! It also provides [`press::PressTracker`], the per-button down/up
//! bookkeeping used for double-click recognition and drag detection. Backends
//! translate raw OS messages into these types; everything downstream
//! (routing, capture, focus) lives in `trellis_shell`.
//!
//! No wire format is involved; events are passed by value on the UI thread.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod event;
pub mod press;

pub use event::{
    CursorKind, Key, KeyAction, KeyEvent, Modifiers, MouseAction, MouseButton, MouseButtons,
    MouseEvent, WheelEvent,
};
pub use press::{ClickKind, Press, PressTracker};
