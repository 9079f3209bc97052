// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyboard and wheel routing: modifier bookkeeping, shortcut matching, the
//! focus bubble walk, and the modal keyboard gate.

use smallvec::SmallVec;
use trellis_input::{KeyAction, KeyEvent, WheelEvent};
use trellis_tree::{ElementFlags, ElementId};

use crate::window::Window;

impl Window {
    /// Route a keyboard event.
    ///
    /// Returns whether some element (or shortcut) consumed it. No-op
    /// returning `false` before the first draw and while a modal child window
    /// is above this one.
    pub fn dispatch_key_event(&mut self, event: &mut KeyEvent) -> bool {
        if !self.first_draw_done || self.modal_above > 0 {
            return false;
        }

        // Bare modifier transitions refresh the cached bitset and any
        // modifier-dependent visuals, independent of further routing.
        if event.key.is_modifier() && event.modifiers != self.keyboard_modifiers {
            self.keyboard_modifiers = event.modifiers;
            self.request_redraw();
            self.update(false);
        } else {
            self.keyboard_modifiers = event.modifiers;
        }

        if event.action == KeyAction::Text && !event.sanitize_text() {
            return false;
        }

        // A modal popup claims the keyboard unless focus already sits inside
        // its subtree.
        if let Some(m) = self.topmost_modal_index() {
            let modal_root = self.popups[m].root;
            let focus_inside = self
                .focused()
                .is_some_and(|f| self.tree.is_descendant_of(f, modal_root));
            if !focus_inside {
                if self.dispatch_key_to_tree(modal_root, event) {
                    return true;
                }
                return self.dispatch_key_to_tree(self.root(), event);
            }
        }

        if event.action == KeyAction::KeyDown && self.run_shortcut(event.key, event.modifiers) {
            return true;
        }

        // Bubble from the focused element (redefined upward past any
        // disabled ancestor) toward the root, stopping at a focus-group
        // boundary even when unhandled.
        let start = self.effective_focus_start();
        let mut cur = Some(start);
        while let Some(id) = cur {
            if !self.tree.is_alive(id) {
                return false;
            }
            let boundary = self
                .tree
                .get(id)
                .is_some_and(|e| e.flags.contains(ElementFlags::FOCUS_GROUP));
            if self.offer_key(id, event) {
                return true;
            }
            if boundary || !self.tree.is_alive(id) {
                return false;
            }
            cur = self.tree.parent_of(id);
        }
        false
    }

    /// Where the focus bubble walk begins: the focused element, redefined to
    /// the parent of the topmost disabled node on its ancestor chain. A
    /// disabled ancestor mutes everything beneath it.
    fn effective_focus_start(&self) -> ElementId {
        let Some(focused) = self.focused() else {
            return self.root();
        };
        let mut start = focused;
        let mut cur = Some(focused);
        while let Some(id) = cur {
            let Some(el) = self.tree.get(id) else {
                return self.root();
            };
            let parent = self.tree.parent_of(id);
            if !el.flags.contains(ElementFlags::ENABLED) {
                let Some(p) = parent else {
                    return self.root();
                };
                start = p;
            }
            cur = parent;
        }
        start
    }

    /// Depth-first key delivery to a subtree, topmost children first,
    /// offering at elements that opted into key tracking.
    fn dispatch_key_to_tree(&mut self, id: ElementId, event: &mut KeyEvent) -> bool {
        let Some(el) = self.tree.get(id) else {
            return false;
        };
        if !el.flags.contains(ElementFlags::VISIBLE) {
            return false;
        }
        let wants = el
            .flags
            .contains(ElementFlags::KEY_TRACKING | ElementFlags::ENABLED);
        let children: SmallVec<[ElementId; 8]> =
            self.tree.children_of(id).iter().rev().copied().collect();
        for child in children {
            if self.dispatch_key_to_tree(child, event) {
                return true;
            }
        }
        if wants && self.tree.is_alive(id) {
            return self.offer_key(id, event);
        }
        false
    }

    /// Route a wheel event: modal subtree if one exists, else popups topmost
    /// first, else the main root. Wheel has no capture.
    pub fn dispatch_wheel_event(&mut self, event: &WheelEvent) -> bool {
        if !self.first_draw_done || self.modal_above > 0 {
            return false;
        }
        if let Some(m) = self.topmost_modal_index() {
            let modal_root = self.popups[m].root;
            return self.wheel_to_subtree(modal_root, event);
        }
        let roots: SmallVec<[ElementId; 4]> =
            self.popups.iter().rev().map(|p| p.root).collect();
        for root in roots {
            if self.wheel_to_subtree(root, event) {
                return true;
            }
        }
        self.wheel_to_subtree(self.root(), event)
    }

    fn wheel_to_subtree(&mut self, root: ElementId, event: &WheelEvent) -> bool {
        let Some(hit) = self.tree.hit_test(root, event.pos, true) else {
            return false;
        };
        let mut cur = Some(hit);
        while let Some(id) = cur {
            if !self.tree.is_alive(id) {
                return false;
            }
            if self.offer_wheel(id, event) {
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
