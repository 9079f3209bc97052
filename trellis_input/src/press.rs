// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-button press bookkeeping: double-click recognition and drag detection.
//!
//! The window dispatch core feeds every `ButtonDown`/`Move`/`ButtonUp` through
//! a [`PressTracker`] so that:
//!
//! - the second press of a double click can be flagged before dispatch
//!   (within both a spatial radius and a time interval of the previous click);
//! - movement beyond the drag threshold while a button is held marks the
//!   gesture as a drag, which suppresses the click report on release.
//!
//! Timestamps are milliseconds on whatever monotonic clock the caller uses;
//! the tracker only ever subtracts them.

use kurbo::Point;

use crate::event::MouseButton;

/// Default interval between clicks of a double click, in milliseconds.
pub const DOUBLE_CLICK_INTERVAL_MS: u64 = 400;
/// Default radius within which two presses count as the same click target.
pub const DOUBLE_CLICK_RADIUS: f64 = 4.0;
/// Default movement threshold beyond which a held button becomes a drag.
pub const DRAG_THRESHOLD: f64 = 5.0;

// MouseButton::index() is at most 5.
const BUTTON_SLOTS: usize = 6;

/// State of one active press.
#[derive(Clone, Copy, Debug)]
pub struct Press {
    /// Position at press time, window coordinates.
    pub down_pos: Point,
    /// Timestamp at press time.
    pub down_time: u64,
    /// 1 for a plain press, 2 for the second press of a double click.
    pub click_count: u32,
    /// Movement exceeded the drag threshold while held.
    pub drag_started: bool,
}

/// Kind of click reported on release.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClickKind {
    /// A plain click.
    Single,
    /// The release completing a double click.
    Double,
}

/// Per-button press state machine.
#[derive(Clone, Debug)]
pub struct PressTracker {
    presses: [Option<Press>; BUTTON_SLOTS],
    last_click: [Option<(u64, Point)>; BUTTON_SLOTS],
    /// Maximum interval between presses of a double click, in milliseconds.
    pub double_click_interval: u64,
    /// Maximum distance between presses of a double click.
    pub double_click_radius: f64,
    /// Movement threshold beyond which a held press becomes a drag.
    pub drag_threshold: f64,
}

impl Default for PressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PressTracker {
    /// Create a tracker with the default thresholds.
    pub fn new() -> Self {
        Self {
            presses: [None; BUTTON_SLOTS],
            last_click: [None; BUTTON_SLOTS],
            double_click_interval: DOUBLE_CLICK_INTERVAL_MS,
            double_click_radius: DOUBLE_CLICK_RADIUS,
            drag_threshold: DRAG_THRESHOLD,
        }
    }

    /// Record a button press.
    ///
    /// Returns the click count for this press: `2` when it lands within the
    /// double-click interval and radius of the previous click on the same
    /// button, `1` otherwise.
    pub fn on_down(&mut self, button: MouseButton, pos: Point, timestamp: u64) -> u32 {
        let slot = button.index();
        let click_count = match self.last_click[slot] {
            Some((t, p))
                if timestamp.saturating_sub(t) <= self.double_click_interval
                    && p.distance(pos) <= self.double_click_radius =>
            {
                2
            }
            _ => 1,
        };
        self.presses[slot] = Some(Press {
            down_pos: pos,
            down_time: timestamp,
            click_count,
            drag_started: false,
        });
        click_count
    }

    /// Record pointer motion against every held button.
    ///
    /// Returns `true` if any press newly crossed the drag threshold.
    pub fn on_move(&mut self, pos: Point) -> bool {
        let mut newly_dragging = false;
        for press in self.presses.iter_mut().flatten() {
            if !press.drag_started && press.down_pos.distance(pos) > self.drag_threshold {
                press.drag_started = true;
                newly_dragging = true;
            }
        }
        newly_dragging
    }

    /// Record a button release.
    ///
    /// Returns the click kind when the gesture completed as a click, or
    /// `None` when there was no matching press or the press became a drag.
    pub fn on_up(&mut self, button: MouseButton, pos: Point, timestamp: u64) -> Option<ClickKind> {
        let slot = button.index();
        let press = self.presses[slot].take()?;
        if press.drag_started {
            // Completed a drag, not a click; a following press starts fresh.
            self.last_click[slot] = None;
            return None;
        }
        if press.click_count >= 2 {
            // A triple press should not chain into another double click.
            self.last_click[slot] = None;
            Some(ClickKind::Double)
        } else {
            self.last_click[slot] = Some((timestamp, pos));
            Some(ClickKind::Single)
        }
    }

    /// Whether the button has an active press.
    pub fn is_down(&self, button: MouseButton) -> bool {
        self.presses[button.index()].is_some()
    }

    /// The active press for a button, if any.
    pub fn press(&self, button: MouseButton) -> Option<&Press> {
        self.presses[button.index()].as_ref()
    }

    /// Abort all active presses, e.g. when the capture gesture is cancelled.
    pub fn clear(&mut self) {
        self.presses = [None; BUTTON_SLOTS];
    }
}
