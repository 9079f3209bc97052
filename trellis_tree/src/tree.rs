// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core arena implementation: structure, queries, hit testing.

use alloc::vec::Vec;
use kurbo::Point;

use crate::types::{Element, ElementFlags, ElementId};

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    data: Element,
}

/// Element arena with generational ids.
///
/// Slots are reused after removal; the per-slot generation counter is bumped
/// on reuse so stale [`ElementId`]s never validate again. All query methods
/// treat a stale id as "element absent" rather than panicking, which is what
/// lets the dispatch core call into user handlers and simply re-check ids
/// afterwards.
///
/// Children are kept in insertion order, which is also z-order: the last
/// child is topmost and is visited first by [`ElementTree::hit_test`].
#[derive(Default)]
pub struct ElementTree {
    slots: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl core::fmt::Debug for ElementTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.slots.len();
        let alive = self.slots.iter().filter(|n| n.is_some()).count();
        f.debug_struct("ElementTree")
            .field("slots_total", &total)
            .field("slots_alive", &alive)
            .field("free_list", &self.free_list.len())
            .finish()
    }
}

impl ElementTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new element as the topmost child of `parent`, or as a root
    /// when `parent` is `None`.
    ///
    /// A stale `parent` id is a programmer error; in release builds the
    /// element is inserted as a root.
    pub fn insert(&mut self, parent: Option<ElementId>, data: Element) -> ElementId {
        let parent = match parent {
            Some(p) => {
                debug_assert!(self.is_alive(p), "insert under a stale parent id");
                self.is_alive(p).then_some(p)
            }
            None => None,
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(Node {
                generation,
                parent,
                children: Vec::new(),
                data,
            });
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.slots.push(Some(Node {
                generation,
                parent,
                children: Vec::new(),
                data,
            }));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId uses 32-bit indices by design."
            )]
            ((self.slots.len() - 1) as u32, generation)
        };
        let id = ElementId::new(idx, generation);
        if let Some(p) = parent {
            self.node_mut(p).children.push(id);
        }
        id
    }

    /// Remove an element and its whole subtree.
    ///
    /// Every id inside the subtree becomes stale immediately.
    pub fn remove(&mut self, id: ElementId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent
            && self.is_alive(parent)
        {
            self.node_mut(parent).children.retain(|c| *c != id);
        }
        self.remove_subtree(id);
    }

    fn remove_subtree(&mut self, id: ElementId) {
        let children = core::mem::take(&mut self.node_mut(id).children);
        for child in children {
            if self.is_alive(child) {
                self.remove_subtree(child);
            }
        }
        self.slots[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Whether `id` still refers to a live element.
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.slots
            .get(id.idx())
            .and_then(|slot| slot.as_ref())
            .is_some_and(|n| n.generation == id.1)
    }

    /// Borrow element data; `None` for stale ids.
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.node_opt(id).map(|n| &n.data)
    }

    /// Mutably borrow element data; `None` for stale ids.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.node_opt_mut(id).map(|n| &mut n.data)
    }

    /// Parent of a live element, if it has one.
    pub fn parent_of(&self, id: ElementId) -> Option<ElementId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Children of a live element in z-order (last is topmost).
    pub fn children_of(&self, id: ElementId) -> &[ElementId] {
        self.node_opt(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Update an element's bounds.
    pub fn set_bounds(&mut self, id: ElementId, bounds: kurbo::Rect) {
        if let Some(n) = self.node_opt_mut(id) {
            n.data.bounds = bounds;
        }
    }

    /// Update an element's flags.
    pub fn set_flags(&mut self, id: ElementId, flags: ElementFlags) {
        if let Some(n) = self.node_opt_mut(id) {
            n.data.flags = flags;
        }
    }

    /// Whether a live element's bounds contain the point.
    pub fn contains(&self, id: ElementId, point: Point) -> bool {
        self.get(id).is_some_and(|e| e.bounds.contains(point))
    }

    /// Whether `id` is `ancestor` or one of its descendants.
    pub fn is_descendant_of(&self, id: ElementId, ancestor: ElementId) -> bool {
        if !self.is_alive(id) || !self.is_alive(ancestor) {
            return false;
        }
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.parent_of(c);
        }
        false
    }

    /// The element itself when enabled, otherwise its nearest enabled
    /// ancestor; `None` when the whole chain is disabled or stale.
    pub fn nearest_enabled_ancestor(&self, id: ElementId) -> Option<ElementId> {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if !self.is_alive(c) {
                return None;
            }
            if self.get(c)?.flags.contains(ElementFlags::ENABLED) {
                return Some(c);
            }
            cur = self.parent_of(c);
        }
        None
    }

    /// Hit test a point against the subtree rooted at `root`.
    ///
    /// Children are visited back-to-front (last-added is topmost). Subtrees
    /// that are invisible, disabled (when `enabled_only` is set), or whose
    /// bounds do not contain the point are skipped entirely. The result is
    /// the deepest matching element, or the root itself when no child
    /// matched but the root contains the point.
    pub fn hit_test(
        &self,
        root: ElementId,
        point: Point,
        enabled_only: bool,
    ) -> Option<ElementId> {
        let node = self.node_opt(root)?;
        let flags = node.data.flags;
        if !flags.contains(ElementFlags::VISIBLE) {
            return None;
        }
        if enabled_only && !flags.contains(ElementFlags::ENABLED) {
            return None;
        }
        if !node.data.bounds.contains(point) {
            return None;
        }
        for child in node.children.iter().rev() {
            if let Some(hit) = self.hit_test(*child, point, enabled_only) {
                return Some(hit);
            }
        }
        Some(root)
    }

    fn node(&self, id: ElementId) -> &Node {
        self.slots[id.idx()].as_ref().expect("dangling ElementId")
    }

    fn node_mut(&mut self, id: ElementId) -> &mut Node {
        self.slots[id.idx()].as_mut().expect("dangling ElementId")
    }

    fn node_opt(&self, id: ElementId) -> Option<&Node> {
        self.slots
            .get(id.idx())
            .and_then(|slot| slot.as_ref())
            .filter(|n| n.generation == id.1)
    }

    fn node_opt_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.idx())
            .and_then(|slot| slot.as_mut())
            .filter(|n| n.generation == id.1)
    }
}
