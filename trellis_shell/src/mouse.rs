// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mouse event routing: the capture state machine, the tracking set, popup
//! and modal-barrier routing, and cursor resolution.

use smallvec::SmallVec;
use trellis_input::{CursorKind, MouseAction, MouseEvent};
use trellis_timer::now_millis;
use trellis_tree::{ElementFlags, ElementId};

use crate::window::{Capture, Window};

impl Window {
    /// Route a mouse event.
    ///
    /// Returns whether some element consumed it. No-op returning `false`
    /// before the first draw has completed and while a modal child window is
    /// above this one.
    pub fn dispatch_mouse_event(&mut self, event: &mut MouseEvent) -> bool {
        if !self.first_draw_done || self.modal_above > 0 {
            return false;
        }

        match event.action {
            MouseAction::ButtonDown => {
                let count = self.presses.on_down(event.button, event.pos, now_millis());
                event.double_click = count >= 2;
            }
            MouseAction::ButtonUp => {
                let _ = self.presses.on_up(event.button, event.pos, now_millis());
            }
            MouseAction::Move => {
                let _ = self.presses.on_move(event.pos);
            }
            _ => {}
        }
        self.last_mouse_pos = event.pos;
        self.last_buttons = event.buttons;
        self.keyboard_modifiers = event.modifiers;

        // The captured element may have been destroyed since the last event.
        if let Some(cap) = self.capture
            && !self.tree.is_alive(cap.element)
        {
            tracing::debug!("captured element died; dropping capture");
            self.capture = None;
            self.backend.capture_mouse(false);
        }

        if self.capture.is_some() {
            return self.dispatch_captured(event);
        }

        if matches!(event.action, MouseAction::Move | MouseAction::Leave) {
            self.check_remove_tracking(event);
        }
        if event.action == MouseAction::Leave {
            // Window-level leave: tracking bookkeeping above is all there is.
            return true;
        }

        self.route_uncaptured(event)
    }

    /// Deliver a `Cancel` to the captured element, then clear capture
    /// unconditionally, whatever the handler did.
    pub(crate) fn dispatch_cancel(&mut self, event: &MouseEvent) {
        if let Some(cap) = self.capture {
            let mut cancel = event.change_action(MouseAction::Cancel);
            let _ = self.offer_mouse(cap.element, &mut cancel);
        }
        self.capture = None;
        self.backend.capture_mouse(false);
        self.presses.clear();
    }

    fn dispatch_captured(&mut self, event: &mut MouseEvent) -> bool {
        let Some(cap) = self.capture else {
            return false;
        };
        let inside = self.tree.contains(cap.element, event.pos);
        match event.action {
            MouseAction::Move if !inside => {
                if event.buttons != cap.buttons {
                    // A button transition was lost; the gesture is broken.
                    self.dispatch_cancel(event);
                    return true;
                }
                if !cap.pointer_left {
                    let mut focus_out = event.change_action(MouseAction::FocusOut);
                    let keep_moves = self.offer_mouse(cap.element, &mut focus_out);
                    if let Some(cap) = &mut self.capture {
                        cap.pointer_left = true;
                        cap.track_outside = keep_moves;
                    }
                    return true;
                }
                if cap.track_outside {
                    return self.forward_to_captured(event);
                }
                // Swallowed until the pointer re-enters.
                true
            }
            MouseAction::Move => {
                if cap.pointer_left {
                    if event.buttons != cap.buttons {
                        self.dispatch_cancel(event);
                        return true;
                    }
                    if let Some(cap) = &mut self.capture {
                        cap.pointer_left = false;
                        cap.track_outside = false;
                    }
                    let mut focus_in = event.change_action(MouseAction::FocusIn);
                    return self.forward_to_captured(&mut focus_in);
                }
                self.forward_to_captured(event)
            }
            MouseAction::Leave => {
                if cap.pointer_left {
                    self.dispatch_cancel(event);
                    return true;
                }
                if let Some(cap) = &mut self.capture {
                    cap.pointer_left = true;
                }
                let mut focus_out = event.change_action(MouseAction::FocusOut);
                let keep_moves = self.offer_mouse(cap.element, &mut focus_out);
                if let Some(cap) = &mut self.capture {
                    cap.track_outside = keep_moves;
                }
                true
            }
            MouseAction::ButtonDown | MouseAction::ButtonUp => {
                if !inside && event.buttons != cap.buttons {
                    self.dispatch_cancel(event);
                    return true;
                }
                self.forward_to_captured(event)
            }
            _ => self.forward_to_captured(event),
        }
    }

    /// Forward an event to the captured element; release capture once all
    /// buttons are up.
    fn forward_to_captured(&mut self, event: &mut MouseEvent) -> bool {
        let Some(cap) = self.capture else {
            return false;
        };
        let handled = self.offer_mouse(cap.element, event);
        if self.capture.is_some() && event.buttons.is_empty() {
            self.capture = None;
            self.backend.capture_mouse(false);
        }
        handled
    }

    /// Add an element to the move/leave tracking set (no duplicates).
    pub(crate) fn add_tracking(&mut self, id: ElementId) {
        if !self.tracking.contains(&id) {
            self.tracking.push(id);
        }
    }

    /// Deliver a synthetic `Leave` to every tracked element the pointer has
    /// departed (or all of them, on a window-level leave), removing each from
    /// the set exactly once. Runs for every tracked element regardless of the
    /// current hit-test target.
    fn check_remove_tracking(&mut self, event: &MouseEvent) {
        let mut i = 0;
        while i < self.tracking.len() {
            let id = self.tracking[i];
            if !self.tree.is_alive(id) {
                self.tracking.remove(i);
                continue;
            }
            let departed =
                event.action == MouseAction::Leave || !self.tree.contains(id, event.pos);
            if departed {
                // Remove before delivering; the handler may mutate the set.
                self.tracking.remove(i);
                let mut leave = event.change_action(MouseAction::Leave);
                let _ = self.offer_mouse(id, &mut leave);
                i = 0;
            } else {
                i += 1;
            }
        }
    }

    /// Routing when no element holds capture: popup stack (respecting the
    /// modal barrier), then the modal root or main content root.
    fn route_uncaptured(&mut self, event: &mut MouseEvent) -> bool {
        let mut cursor_applied = false;
        let modal_idx = self.topmost_modal_index();
        let modal_root = modal_idx.map(|m| self.popups[m].root);
        // Popups above the topmost modal are excluded entirely; the rest are
        // tried topmost first.
        let upper = modal_idx.map_or(self.popups.len(), |m| m + 1);
        let candidates: SmallVec<[ElementId; 4]> = self.popups[..upper]
            .iter()
            .rev()
            .map(|p| p.root)
            .collect();

        let mut handled = false;
        for root in candidates {
            if self.dispatch_mouse_to_subtree(root, event, &mut cursor_applied) {
                handled = true;
                break;
            }
        }
        if !handled {
            if let Some(root) = modal_root {
                // The modal popup gates the main root: offer the event to it
                // directly, even when the point is outside its bounds.
                handled = self.offer_mouse(root, event);
            } else {
                handled =
                    self.dispatch_mouse_to_subtree(self.root(), event, &mut cursor_applied);
            }
        }

        if event.action == MouseAction::Move && !cursor_applied {
            self.backend.set_cursor(CursorKind::Arrow);
        }
        handled
    }

    /// Hit-test one subtree and bubble from the leaf toward `root`.
    ///
    /// The walk terminates early (unhandled) if a handler destroyed the
    /// current chain element. On a handled `ButtonDown` capture is acquired
    /// (unless the event opted out or a handler already assigned capture) and
    /// focus moves to the element when it is focusable; a handled `Move` adds
    /// the element to the tracking set. The first non-`Auto` cursor seen on a
    /// `Move` walk is applied, at most once per dispatch.
    fn dispatch_mouse_to_subtree(
        &mut self,
        root: ElementId,
        event: &mut MouseEvent,
        cursor_applied: &mut bool,
    ) -> bool {
        let Some(hit) = self.tree.hit_test(root, event.pos, true) else {
            return false;
        };
        let mut cur = Some(hit);
        while let Some(id) = cur {
            if !self.tree.is_alive(id) {
                return false;
            }
            if event.action == MouseAction::Move
                && !*cursor_applied
                && let Some(el) = self.tree.get(id)
                && el.cursor != CursorKind::Auto
            {
                let cursor = el.cursor;
                self.backend.set_cursor(cursor);
                *cursor_applied = true;
            }
            if self.offer_mouse(id, event) {
                match event.action {
                    MouseAction::ButtonDown => {
                        if !event.do_not_track
                            && self.capture.is_none()
                            && self.tree.is_alive(id)
                        {
                            self.capture = Some(Capture {
                                element: id,
                                buttons: event.buttons,
                                pointer_left: false,
                                track_outside: false,
                            });
                            self.backend.capture_mouse(true);
                        }
                        if self
                            .tree
                            .get(id)
                            .is_some_and(|e| e.flags.contains(ElementFlags::FOCUSABLE))
                        {
                            let _ = self.set_focus(id);
                        }
                    }
                    MouseAction::Move => {
                        if self.tree.is_alive(id) {
                            self.add_tracking(id);
                        }
                    }
                    _ => {}
                }
                return true;
            }
            if !self.tree.is_alive(id) {
                return false;
            }
            cur = if id == root {
                None
            } else {
                self.tree.parent_of(id)
            };
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use crate::window::EventCtx;
    use kurbo::{Point, Rect};
    use std::cell::RefCell;
    use std::rc::Rc;
    use trellis_input::{MouseButton, MouseButtons};
    use trellis_tree::Element;

    fn down(pos: Point) -> MouseEvent {
        mouse_event(
            MouseAction::ButtonDown,
            MouseButton::Left,
            MouseButtons::LEFT,
            pos,
        )
    }

    fn up(pos: Point) -> MouseEvent {
        mouse_event(
            MouseAction::ButtonUp,
            MouseButton::Left,
            MouseButtons::empty(),
            pos,
        )
    }

    fn mv(pos: Point, buttons: MouseButtons) -> MouseEvent {
        mouse_event(MouseAction::Move, MouseButton::None, buttons, pos)
    }

    fn button_window() -> (crate::window::Window, CallLog, ElementId, ActionsLog) {
        let (mut w, calls) = ready_window();
        let root = w.root();
        let button = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(0.0, 0.0, 100.0, 30.0)),
        );
        let log = actions_log();
        log_mouse(&mut w, button, log.clone(), true);
        calls.borrow_mut().clear();
        (w, calls, button, log)
    }

    #[test]
    fn no_dispatch_before_first_draw() {
        let (mut w, _calls) = test_window();
        let root = w.root();
        let log = actions_log();
        log_mouse(&mut w, root, log.clone(), true);
        assert!(!w.dispatch_mouse_event(&mut down(Point::new(10.0, 10.0))));
        assert!(log.borrow().is_empty());
        w.handle_redraw();
        assert!(w.dispatch_mouse_event(&mut down(Point::new(10.0, 10.0))));
    }

    #[test]
    fn no_dispatch_with_modal_window_above() {
        let (mut w, _calls, button, log) = button_window();
        w.modal_above = 1;
        assert!(!w.dispatch_mouse_event(&mut down(Point::new(50.0, 15.0))));
        assert!(log.borrow().is_empty());
        w.modal_above = 0;
        assert!(w.dispatch_mouse_event(&mut down(Point::new(50.0, 15.0))));
        assert_eq!(w.capture_target(), Some(button));
    }

    #[test]
    fn accepted_button_down_acquires_capture() {
        let (mut w, calls, button, _log) = button_window();
        assert!(w.dispatch_mouse_event(&mut down(Point::new(50.0, 15.0))));
        assert_eq!(w.capture_target(), Some(button));
        assert!(calls.borrow().contains(&BackendCall::CaptureMouse(true)));
    }

    #[test]
    fn do_not_track_skips_capture() {
        let (mut w, _calls, _button, _log) = button_window();
        let mut ev = down(Point::new(50.0, 15.0));
        ev.do_not_track = true;
        assert!(w.dispatch_mouse_event(&mut ev));
        assert_eq!(w.capture_target(), None);
    }

    #[test]
    fn unhandled_button_down_does_not_capture() {
        let (mut w, _calls) = ready_window();
        let root = w.root();
        let el = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(0.0, 0.0, 100.0, 30.0)),
        );
        let log = actions_log();
        log_mouse(&mut w, el, log.clone(), false);
        assert!(!w.dispatch_mouse_event(&mut down(Point::new(50.0, 15.0))));
        assert_eq!(w.capture_target(), None);
    }

    #[test]
    fn capture_focus_out_then_mismatch_cancel() {
        // Button covers (0,0)-(100,30). Down inside, move far outside with
        // the button still held, then release outside.
        let (mut w, calls, button, log) = button_window();
        assert!(w.dispatch_mouse_event(&mut down(Point::new(50.0, 15.0))));
        assert_eq!(w.capture_target(), Some(button));

        assert!(w.dispatch_mouse_event(&mut mv(Point::new(500.0, 500.0), MouseButtons::LEFT)));
        assert_eq!(log.borrow().last(), Some(&(button, MouseAction::FocusOut)));
        assert_eq!(w.capture_target(), Some(button));

        assert!(w.dispatch_mouse_event(&mut up(Point::new(500.0, 500.0))));
        assert_eq!(log.borrow().last(), Some(&(button, MouseAction::Cancel)));
        assert_eq!(w.capture_target(), None);
        assert!(calls.borrow().contains(&BackendCall::CaptureMouse(false)));
    }

    #[test]
    fn cancel_is_delivered_exactly_once() {
        let (mut w, _calls, button, log) = button_window();
        assert!(w.dispatch_mouse_event(&mut down(Point::new(50.0, 15.0))));
        assert!(w.dispatch_mouse_event(&mut mv(Point::new(500.0, 500.0), MouseButtons::LEFT)));
        assert!(w.dispatch_mouse_event(&mut up(Point::new(500.0, 500.0))));
        let cancels = log
            .borrow()
            .iter()
            .filter(|(_, a)| *a == MouseAction::Cancel)
            .count();
        assert_eq!(cancels, 1);
        // Subsequent events route normally; no further cancels appear.
        assert!(!w.dispatch_mouse_event(&mut mv(Point::new(500.0, 500.0), MouseButtons::empty())));
        let cancels = log
            .borrow()
            .iter()
            .filter(|(_, a)| *a == MouseAction::Cancel)
            .count();
        assert_eq!(cancels, 1);
    }

    #[test]
    fn capture_clears_even_if_cancel_handler_recaptures() {
        let (mut w, _calls) = ready_window();
        let root = w.root();
        let button = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(0.0, 0.0, 100.0, 30.0)),
        );
        w.set_mouse_handler(
            button,
            Box::new(move |ctx: &mut EventCtx<'_>, ev: &mut MouseEvent| {
                if ev.action == MouseAction::Cancel {
                    ctx.set_capture(button);
                }
                true
            }),
        );
        assert!(w.dispatch_mouse_event(&mut down(Point::new(50.0, 15.0))));
        assert!(w.dispatch_mouse_event(&mut mv(Point::new(500.0, 500.0), MouseButtons::LEFT)));
        assert!(w.dispatch_mouse_event(&mut up(Point::new(500.0, 500.0))));
        // Cancel always clears capture, whatever the handler requested.
        assert_eq!(w.capture_target(), None);
    }

    #[test]
    fn swallowed_moves_outside_until_reentry_sends_focus_in() {
        let (mut w, _calls, button, log) = button_window();
        assert!(w.dispatch_mouse_event(&mut down(Point::new(50.0, 15.0))));
        assert!(w.dispatch_mouse_event(&mut mv(Point::new(500.0, 500.0), MouseButtons::LEFT)));
        let len_after_focus_out = log.borrow().len();
        // Handler returned true for FocusOut, so outside moves keep flowing.
        assert!(w.dispatch_mouse_event(&mut mv(Point::new(501.0, 500.0), MouseButtons::LEFT)));
        assert_eq!(log.borrow().len(), len_after_focus_out + 1);
        assert_eq!(log.borrow().last(), Some(&(button, MouseAction::Move)));
        // Re-entry synthesizes FocusIn.
        assert!(w.dispatch_mouse_event(&mut mv(Point::new(50.0, 15.0), MouseButtons::LEFT)));
        assert_eq!(log.borrow().last(), Some(&(button, MouseAction::FocusIn)));
        assert_eq!(w.capture_target(), Some(button));
    }

    #[test]
    fn focus_out_refused_swallows_outside_moves() {
        let (mut w, _calls) = ready_window();
        let root = w.root();
        let button = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(0.0, 0.0, 100.0, 30.0)),
        );
        let log = actions_log();
        let l2 = log.clone();
        w.set_mouse_handler(
            button,
            Box::new(move |_ctx, ev| {
                l2.borrow_mut().push((button, ev.action));
                // Refuse FocusOut: no movement tracking while outside.
                ev.action != MouseAction::FocusOut
            }),
        );
        assert!(w.dispatch_mouse_event(&mut down(Point::new(50.0, 15.0))));
        assert!(w.dispatch_mouse_event(&mut mv(Point::new(500.0, 500.0), MouseButtons::LEFT)));
        let len = log.borrow().len();
        assert!(w.dispatch_mouse_event(&mut mv(Point::new(501.0, 500.0), MouseButtons::LEFT)));
        // Swallowed: handled, but nothing reached the element.
        assert_eq!(log.borrow().len(), len);
        assert_eq!(w.capture_target(), Some(button));
    }

    #[test]
    fn release_inside_forwards_and_releases_capture() {
        let (mut w, _calls, button, log) = button_window();
        assert!(w.dispatch_mouse_event(&mut down(Point::new(50.0, 15.0))));
        assert!(w.dispatch_mouse_event(&mut up(Point::new(50.0, 15.0))));
        assert_eq!(log.borrow().last(), Some(&(button, MouseAction::ButtonUp)));
        assert_eq!(w.capture_target(), None);
    }

    #[test]
    fn leave_while_pointer_out_cancels() {
        let (mut w, _calls, button, log) = button_window();
        assert!(w.dispatch_mouse_event(&mut down(Point::new(50.0, 15.0))));
        assert!(w.dispatch_mouse_event(&mut mv(Point::new(500.0, 500.0), MouseButtons::LEFT)));
        let mut leave = mouse_event(
            MouseAction::Leave,
            MouseButton::None,
            MouseButtons::LEFT,
            Point::new(500.0, 500.0),
        );
        assert!(w.dispatch_mouse_event(&mut leave));
        assert_eq!(log.borrow().last(), Some(&(button, MouseAction::Cancel)));
        assert_eq!(w.capture_target(), None);
    }

    #[test]
    fn captured_element_death_drops_capture_silently() {
        let (mut w, _calls, button, _log) = button_window();
        assert!(w.dispatch_mouse_event(&mut down(Point::new(50.0, 15.0))));
        w.tree_mut().remove(button);
        // Next event routes normally; no stale delivery, no panic.
        assert!(!w.dispatch_mouse_event(&mut mv(Point::new(50.0, 15.0), MouseButtons::LEFT)));
        assert_eq!(w.capture_target(), None);
    }

    #[test]
    fn capture_is_exclusive() {
        let (mut w, _calls) = ready_window();
        let root = w.root();
        let a = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(0.0, 0.0, 50.0, 50.0)),
        );
        let b = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(100.0, 0.0, 150.0, 50.0)),
        );
        let log = actions_log();
        log_mouse(&mut w, a, log.clone(), true);
        log_mouse(&mut w, b, log.clone(), true);
        assert!(w.dispatch_mouse_event(&mut down(Point::new(25.0, 25.0))));
        assert_eq!(w.capture_target(), Some(a));
        // A second press inside the captured element routes to it, never to
        // b, and capture does not move.
        let mut second = mouse_event(
            MouseAction::ButtonDown,
            MouseButton::Right,
            MouseButtons::LEFT | MouseButtons::RIGHT,
            Point::new(25.0, 25.0),
        );
        assert!(w.dispatch_mouse_event(&mut second));
        assert_eq!(w.capture_target(), Some(a));
        assert!(!log.borrow().iter().any(|(id, _)| *id == b));
    }

    #[test]
    fn move_tracking_converges_with_synthetic_leave() {
        let (mut w, _calls) = ready_window();
        let root = w.root();
        let el = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(0.0, 0.0, 50.0, 50.0)),
        );
        let log = actions_log();
        log_mouse(&mut w, el, log.clone(), true);
        assert!(w.dispatch_mouse_event(&mut mv(Point::new(25.0, 25.0), MouseButtons::empty())));
        assert!(w.tracking.contains(&el));
        // Pointer departs: exactly one synthetic Leave, then removal.
        let _ = w.dispatch_mouse_event(&mut mv(Point::new(300.0, 300.0), MouseButtons::empty()));
        let leaves = log
            .borrow()
            .iter()
            .filter(|(_, a)| *a == MouseAction::Leave)
            .count();
        assert_eq!(leaves, 1);
        assert!(!w.tracking.contains(&el));
        // Further moves outside deliver nothing more to it.
        let _ = w.dispatch_mouse_event(&mut mv(Point::new(301.0, 300.0), MouseButtons::empty()));
        let leaves = log
            .borrow()
            .iter()
            .filter(|(_, a)| *a == MouseAction::Leave)
            .count();
        assert_eq!(leaves, 1);
    }

    #[test]
    fn window_leave_flushes_every_tracked_element() {
        let (mut w, _calls) = ready_window();
        let root = w.root();
        let a = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(0.0, 0.0, 400.0, 400.0)),
        );
        let b = w.tree_mut().insert(
            Some(a),
            Element::with_bounds(Rect::new(0.0, 0.0, 50.0, 50.0)),
        );
        let log = actions_log();
        log_mouse(&mut w, a, log.clone(), true);
        log_mouse(&mut w, b, log.clone(), false);
        // Move lands on b, bubbles to a; a accepts and is tracked.
        assert!(w.dispatch_mouse_event(&mut mv(Point::new(25.0, 25.0), MouseButtons::empty())));
        assert!(w.tracking.contains(&a));
        let mut leave = mouse_event(
            MouseAction::Leave,
            MouseButton::None,
            MouseButtons::empty(),
            Point::new(25.0, 25.0),
        );
        assert!(w.dispatch_mouse_event(&mut leave));
        assert!(w.tracking.is_empty());
        assert_eq!(log.borrow().last(), Some(&(a, MouseAction::Leave)));
    }

    #[test]
    fn tracking_re_add_is_idempotent() {
        let (mut w, _calls) = ready_window();
        let root = w.root();
        let el = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(0.0, 0.0, 50.0, 50.0)),
        );
        log_mouse(&mut w, el, actions_log(), true);
        let _ = w.dispatch_mouse_event(&mut mv(Point::new(25.0, 25.0), MouseButtons::empty()));
        let _ = w.dispatch_mouse_event(&mut mv(Point::new(26.0, 25.0), MouseButtons::empty()));
        assert_eq!(w.tracking.iter().filter(|id| **id == el).count(), 1);
    }

    #[test]
    fn bubbling_stops_at_first_handler() {
        let (mut w, _calls) = ready_window();
        let root = w.root();
        let outer = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(0.0, 0.0, 200.0, 200.0)),
        );
        let inner = w.tree_mut().insert(
            Some(outer),
            Element::with_bounds(Rect::new(10.0, 10.0, 100.0, 100.0)),
        );
        let log = actions_log();
        log_mouse(&mut w, inner, log.clone(), false);
        log_mouse(&mut w, outer, log.clone(), true);
        log_mouse(&mut w, root, log.clone(), true);
        assert!(w.dispatch_mouse_event(&mut down(Point::new(50.0, 50.0))));
        let ids: Vec<ElementId> = log.borrow().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![inner, outer]);
        assert_eq!(w.capture_target(), Some(outer));
    }

    #[test]
    fn override_handler_runs_before_default() {
        let (mut w, _calls) = ready_window();
        let root = w.root();
        let el = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(0.0, 0.0, 50.0, 50.0)),
        );
        let order = Rc::new(RefCell::new(Vec::new()));
        let (o1, o2) = (order.clone(), order.clone());
        w.set_mouse_handler(
            el,
            Box::new(move |_, _| {
                o1.borrow_mut().push("default");
                true
            }),
        );
        w.set_mouse_override(
            el,
            Box::new(move |_, _| {
                o2.borrow_mut().push("override");
                true
            }),
        );
        assert!(w.dispatch_mouse_event(&mut down(Point::new(25.0, 25.0))));
        assert_eq!(*order.borrow(), vec!["override"]);
    }

    #[test]
    fn stale_chain_terminates_the_walk() {
        let (mut w, _calls) = ready_window();
        let root = w.root();
        let outer = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(0.0, 0.0, 200.0, 200.0)),
        );
        let inner = w.tree_mut().insert(
            Some(outer),
            Element::with_bounds(Rect::new(10.0, 10.0, 100.0, 100.0)),
        );
        let log = actions_log();
        log_mouse(&mut w, outer, log.clone(), true);
        // The leaf handler destroys its own ancestor (and itself with it).
        w.set_mouse_handler(
            inner,
            Box::new(move |ctx: &mut EventCtx<'_>, _ev: &mut MouseEvent| {
                ctx.tree.remove(outer);
                false
            }),
        );
        assert!(!w.dispatch_mouse_event(&mut down(Point::new(50.0, 50.0))));
        assert!(log.borrow().is_empty());
        assert_eq!(w.capture_target(), None);
    }

    #[test]
    fn click_to_focus_on_focusable_element() {
        let (mut w, _calls) = ready_window();
        let root = w.root();
        let mut data = Element::with_bounds(Rect::new(0.0, 0.0, 50.0, 50.0));
        data.flags |= ElementFlags::FOCUSABLE;
        let el = w.tree_mut().insert(Some(root), data);
        log_mouse(&mut w, el, actions_log(), true);
        assert!(w.dispatch_mouse_event(&mut down(Point::new(25.0, 25.0))));
        assert_eq!(w.focused(), Some(el));
    }

    #[test]
    fn double_click_flag_set_on_second_press() {
        let (mut w, _calls) = ready_window();
        let root = w.root();
        let el = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(0.0, 0.0, 50.0, 50.0)),
        );
        let doubles = Rc::new(RefCell::new(Vec::new()));
        let d2 = doubles.clone();
        w.set_mouse_handler(
            el,
            Box::new(move |_ctx, ev| {
                if ev.action == MouseAction::ButtonDown {
                    d2.borrow_mut().push(ev.double_click);
                }
                true
            }),
        );
        let p = Point::new(25.0, 25.0);
        assert!(w.dispatch_mouse_event(&mut down(p)));
        assert!(w.dispatch_mouse_event(&mut up(p)));
        assert!(w.dispatch_mouse_event(&mut down(p)));
        assert_eq!(*doubles.borrow(), vec![false, true]);
    }

    #[test]
    fn cursor_resolves_from_first_non_auto_element() {
        let (mut w, calls) = ready_window();
        let root = w.root();
        let outer = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(0.0, 0.0, 200.0, 200.0)),
        );
        if let Some(e) = w.tree_mut().get_mut(outer) {
            e.cursor = CursorKind::Hand;
        }
        let inner = w.tree_mut().insert(
            Some(outer),
            Element::with_bounds(Rect::new(10.0, 10.0, 100.0, 100.0)),
        );
        log_mouse(&mut w, inner, actions_log(), false);
        log_mouse(&mut w, outer, actions_log(), true);
        calls.borrow_mut().clear();
        let _ = w.dispatch_mouse_event(&mut mv(Point::new(50.0, 50.0), MouseButtons::empty()));
        let cursors: Vec<_> = calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, BackendCall::SetCursor(_)))
            .cloned()
            .collect();
        assert_eq!(cursors, vec![BackendCall::SetCursor(CursorKind::Hand)]);
    }

    #[test]
    fn move_without_cursor_preference_falls_back_to_arrow() {
        let (mut w, calls) = ready_window();
        let root = w.root();
        log_mouse(&mut w, root, actions_log(), true);
        calls.borrow_mut().clear();
        let _ = w.dispatch_mouse_event(&mut mv(Point::new(50.0, 50.0), MouseButtons::empty()));
        assert!(
            calls
                .borrow()
                .contains(&BackendCall::SetCursor(CursorKind::Arrow))
        );
    }

    #[test]
    fn popup_below_modal_barrier_is_still_tried() {
        // P1 (non-modal) below P2 (modal): an event inside P1 but outside P2
        // is consumed by P1; unconsumed events fall through to P2's root.
        let (mut w, _calls) = ready_window();
        let p1 = w.tree_mut().insert(
            None,
            Element::with_bounds(Rect::new(0.0, 0.0, 100.0, 100.0)),
        );
        let p2 = w.tree_mut().insert(
            None,
            Element::with_bounds(Rect::new(200.0, 200.0, 300.0, 300.0)),
        );
        assert!(w.show_popup(p1, false));
        assert!(w.show_popup(p2, true));
        let log = actions_log();
        log_mouse(&mut w, p1, log.clone(), true);
        log_mouse(&mut w, p2, log.clone(), true);
        assert!(w.dispatch_mouse_event(&mut down(Point::new(50.0, 50.0))));
        assert_eq!(log.borrow().last(), Some(&(p1, MouseAction::ButtonDown)));
    }

    #[test]
    fn unconsumed_event_falls_through_to_the_modal_root() {
        let (mut w, _calls) = ready_window();
        let p1 = w.tree_mut().insert(
            None,
            Element::with_bounds(Rect::new(0.0, 0.0, 100.0, 100.0)),
        );
        let p2 = w.tree_mut().insert(
            None,
            Element::with_bounds(Rect::new(200.0, 200.0, 300.0, 300.0)),
        );
        assert!(w.show_popup(p1, false));
        assert!(w.show_popup(p2, true));
        let log = actions_log();
        log_mouse(&mut w, p1, log.clone(), false);
        log_mouse(&mut w, p2, log.clone(), true);
        let root = w.root();
        log_mouse(&mut w, root, log.clone(), true);
        // The point is inside p1 (which refuses) and outside p2, yet the
        // modal root receives it instead of the main root.
        assert!(w.dispatch_mouse_event(&mut down(Point::new(50.0, 50.0))));
        assert_eq!(log.borrow().last(), Some(&(p2, MouseAction::ButtonDown)));
        assert!(!log.borrow().iter().any(|(id, _)| *id == w.root()));
    }

    #[test]
    fn popup_above_modal_is_excluded() {
        let (mut w, _calls) = ready_window();
        let modal = w.tree_mut().insert(
            None,
            Element::with_bounds(Rect::new(200.0, 200.0, 300.0, 300.0)),
        );
        let above = w.tree_mut().insert(
            None,
            Element::with_bounds(Rect::new(0.0, 0.0, 100.0, 100.0)),
        );
        assert!(w.show_popup(modal, true));
        assert!(w.show_popup(above, false));
        let log = actions_log();
        log_mouse(&mut w, modal, log.clone(), true);
        log_mouse(&mut w, above, log.clone(), true);
        // Inside the popup stacked above the modal: it is skipped entirely
        // and the event lands on the modal root.
        assert!(w.dispatch_mouse_event(&mut down(Point::new(50.0, 50.0))));
        assert_eq!(log.borrow().last(), Some(&(modal, MouseAction::ButtonDown)));
    }

    #[test]
    fn topmost_popup_wins_without_a_modal() {
        let (mut w, _calls) = ready_window();
        let lower = w.tree_mut().insert(
            None,
            Element::with_bounds(Rect::new(0.0, 0.0, 100.0, 100.0)),
        );
        let upper = w.tree_mut().insert(
            None,
            Element::with_bounds(Rect::new(0.0, 0.0, 100.0, 100.0)),
        );
        assert!(w.show_popup(lower, false));
        assert!(w.show_popup(upper, false));
        let log = actions_log();
        log_mouse(&mut w, lower, log.clone(), true);
        log_mouse(&mut w, upper, log.clone(), true);
        assert!(w.dispatch_mouse_event(&mut down(Point::new(50.0, 50.0))));
        assert_eq!(log.borrow().last(), Some(&(upper, MouseAction::ButtonDown)));
    }

    #[test]
    fn handler_capture_reassignment_is_honored() {
        let (mut w, _calls) = ready_window();
        let root = w.root();
        let proxy = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(0.0, 0.0, 50.0, 50.0)),
        );
        let target = w.tree_mut().insert(
            Some(root),
            Element::with_bounds(Rect::new(100.0, 0.0, 150.0, 50.0)),
        );
        w.set_mouse_handler(
            proxy,
            Box::new(move |ctx: &mut EventCtx<'_>, _ev: &mut MouseEvent| {
                ctx.set_capture(target);
                true
            }),
        );
        assert!(w.dispatch_mouse_event(&mut down(Point::new(25.0, 25.0))));
        assert_eq!(w.capture_target(), Some(target));
    }
}
