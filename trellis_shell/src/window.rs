// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The window: dispatch state, handler registry, timers, and the update loop.
//!
//! A [`Window`] owns an [`ElementTree`], the transient input state (focus,
//! mouse capture, the tracking set), a timer queue with a lazily started
//! clock thread, and the dirty-flag pipeline consumed by [`Window::update`].
//! Mouse and keyboard routing live in sibling modules; everything they share
//! (handler offering, capture bookkeeping, context requests) is here.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use hashbrown::HashMap;
use kurbo::{Point, Rect, Size};
use smallvec::SmallVec;
use trellis_input::{
    Key, KeyEvent, Modifiers, MouseButtons, MouseEvent, PressTracker, WheelEvent,
};
use trellis_timer::{TimerHandler, TimerId, TimerQueue, TimerThread, now_millis};
use trellis_tree::{ElementFlags, ElementId, ElementTree};

use crate::backend::{WindowBackend, WindowFlags, WindowState};
use crate::events::{EventList, EventPoster, Posted};
use crate::platform::WindowId;

/// Interval of the animation-frame timer, in milliseconds.
const FRAME_INTERVAL_MS: u64 = 16;

/// Per-element mouse handler. Return `true` to consume the event.
pub type MouseHandler = Box<dyn FnMut(&mut EventCtx<'_>, &mut MouseEvent) -> bool>;
/// Per-element key handler. Return `true` to consume the event.
pub type KeyHandler = Box<dyn FnMut(&mut EventCtx<'_>, &mut KeyEvent) -> bool>;
/// Per-element wheel handler. Return `true` to consume the event.
pub type WheelHandler = Box<dyn FnMut(&mut EventCtx<'_>, &WheelEvent) -> bool>;
/// Global shortcut action, matched on key-down before focus routing.
pub type ShortcutHandler = Box<dyn FnMut(&mut EventCtx<'_>)>;
/// Handler for [`Posted::Custom`] events drained on the UI thread.
pub type PostedHandler = Box<dyn FnMut(&mut EventCtx<'_>, u64, Box<dyn Any + Send>)>;

/// Host hook rebuilding the element tree.
pub type RebuildHook = Box<dyn FnMut(&mut ElementTree)>;
/// Host hook recomputing styles for one root.
pub type StyleHook = Box<dyn FnMut(&mut ElementTree, ElementId)>;
/// Host hook laying out one root against the window size.
pub type LayoutHook = Box<dyn FnMut(&mut ElementTree, ElementId, Size)>;
/// Host hook painting the tree.
pub type DrawHook = Box<dyn FnMut(&mut ElementTree)>;

/// Context passed to every handler call.
///
/// Gives handlers mutable tree access (they may destroy any element,
/// including the one being dispatched to) and lets them request capture,
/// focus, and popup changes. Requests are applied by the window after the
/// handler returns; ids that died in the meantime are dropped silently.
pub struct EventCtx<'a> {
    /// The window's element tree.
    pub tree: &'a mut ElementTree,
    requests: CtxRequests,
}

impl core::fmt::Debug for EventCtx<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventCtx")
            .field("tree", &self.tree)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub(crate) struct CtxRequests {
    pub(crate) capture: Option<Option<ElementId>>,
    pub(crate) focus: Option<Option<ElementId>>,
    pub(crate) close_popups: SmallVec<[ElementId; 2]>,
    pub(crate) redraw: bool,
}

impl<'a> EventCtx<'a> {
    pub(crate) fn new(tree: &'a mut ElementTree) -> Self {
        Self {
            tree,
            requests: CtxRequests::default(),
        }
    }

    /// Route all further mouse events to `id` until capture ends.
    pub fn set_capture(&mut self, id: ElementId) {
        self.requests.capture = Some(Some(id));
    }

    /// End mouse capture without a cancel.
    pub fn release_capture(&mut self) {
        self.requests.capture = Some(None);
    }

    /// Move keyboard focus to `id` (validated against its flags).
    pub fn request_focus(&mut self, id: ElementId) {
        self.requests.focus = Some(Some(id));
    }

    /// Drop keyboard focus.
    pub fn clear_focus(&mut self) {
        self.requests.focus = Some(None);
    }

    /// Close the popup rooted at `root` once the handler returns.
    pub fn close_popup(&mut self, root: ElementId) {
        self.requests.close_popups.push(root);
    }

    /// Mark the window as needing a repaint.
    pub fn request_redraw(&mut self) {
        self.requests.redraw = true;
    }

    pub(crate) fn take_requests(&mut self) -> CtxRequests {
        core::mem::take(&mut self.requests)
    }
}

/// Handlers registered for one element.
#[derive(Default)]
pub(crate) struct HandlerSet {
    pub(crate) mouse: Option<MouseHandler>,
    pub(crate) mouse_override: Option<MouseHandler>,
    pub(crate) key: Option<KeyHandler>,
    pub(crate) key_override: Option<KeyHandler>,
    pub(crate) wheel: Option<WheelHandler>,
    pub(crate) wheel_override: Option<WheelHandler>,
}

impl HandlerSet {
    fn is_empty(&self) -> bool {
        self.mouse.is_none()
            && self.mouse_override.is_none()
            && self.key.is_none()
            && self.key_override.is_none()
            && self.wheel.is_none()
            && self.wheel_override.is_none()
    }
}

/// Active mouse capture.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Capture {
    pub(crate) element: ElementId,
    /// Buttons held when capture began; a mismatch later means an event was
    /// lost and the gesture must be cancelled.
    pub(crate) buttons: MouseButtons,
    /// Pointer is currently outside the captured element's bounds.
    pub(crate) pointer_left: bool,
    /// The element asked to keep receiving raw moves while outside.
    pub(crate) track_outside: bool,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct PopupEntry {
    pub(crate) root: ElementId,
    pub(crate) modal: bool,
}

/// A toolkit window: element tree plus all window-level dispatch state.
pub struct Window {
    pub(crate) id: WindowId,
    pub(crate) parent: Option<WindowId>,
    pub(crate) flags: WindowFlags,
    pub(crate) backend: Box<dyn WindowBackend>,

    pub(crate) tree: ElementTree,
    root: ElementId,
    pub(crate) popups: Vec<PopupEntry>,

    handlers: HashMap<ElementId, HandlerSet>,
    shortcuts: HashMap<(Key, Modifiers), ShortcutHandler>,
    posted_handler: Option<PostedHandler>,

    pub(crate) focused: Option<ElementId>,
    pub(crate) capture: Option<Capture>,
    pub(crate) tracking: SmallVec<[ElementId; 4]>,
    pub(crate) keyboard_modifiers: Modifiers,
    pub(crate) presses: PressTracker,
    pub(crate) last_mouse_pos: Point,
    pub(crate) last_buttons: MouseButtons,

    size: Size,
    min_size: Size,
    max_size: Size,
    pub(crate) state: WindowState,
    active: bool,
    /// Number of visible modal child windows; any positive value refuses all
    /// input for this window.
    pub(crate) modal_above: u32,
    pub(crate) first_draw_done: bool,

    need_rebuild: bool,
    need_style: bool,
    need_layout: bool,
    need_draw: bool,
    rebuild_hook: Option<RebuildHook>,
    style_hook: Option<StyleHook>,
    layout_hook: Option<LayoutHook>,
    draw_hook: Option<DrawHook>,

    timers: TimerQueue,
    timer_thread: Option<TimerThread>,
    armed_deadline: Option<u64>,
    anim_callbacks: Vec<Box<dyn FnOnce(u64)>>,

    events: Arc<EventList>,
}

impl core::fmt::Debug for Window {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("state", &self.state)
            .field("focused", &self.focused)
            .field("capture", &self.capture)
            .field("popups", &self.popups.len())
            .finish_non_exhaustive()
    }
}

impl Window {
    pub(crate) fn new(
        id: WindowId,
        parent: Option<WindowId>,
        flags: WindowFlags,
        backend: Box<dyn WindowBackend>,
        size: Size,
    ) -> Self {
        let mut tree = ElementTree::new();
        let root = tree.insert(None, trellis_tree::Element::with_bounds(size.to_rect()));
        Self {
            id,
            parent,
            flags,
            backend,
            tree,
            root,
            popups: Vec::new(),
            handlers: HashMap::new(),
            shortcuts: HashMap::new(),
            posted_handler: None,
            focused: None,
            capture: None,
            tracking: SmallVec::new(),
            keyboard_modifiers: Modifiers::empty(),
            presses: PressTracker::new(),
            last_mouse_pos: Point::ZERO,
            last_buttons: MouseButtons::empty(),
            size,
            min_size: Size::ZERO,
            max_size: Size::new(f64::INFINITY, f64::INFINITY),
            state: WindowState::Unspecified,
            active: false,
            modal_above: 0,
            first_draw_done: false,
            need_rebuild: false,
            need_style: true,
            need_layout: true,
            need_draw: true,
            rebuild_hook: None,
            style_hook: None,
            layout_hook: None,
            draw_hook: None,
            timers: TimerQueue::new(),
            timer_thread: None,
            armed_deadline: None,
            anim_callbacks: Vec::new(),
            events: Arc::new(EventList::new()),
        }
    }

    /// This window's id in the platform registry.
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// The content root element.
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Read access to the element tree.
    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    /// Mutable access to the element tree.
    pub fn tree_mut(&mut self) -> &mut ElementTree {
        &mut self.tree
    }

    /// Current window size.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Native window state as last reported by the backend.
    pub fn state(&self) -> WindowState {
        self.state
    }

    /// Whether this window is the active (foreground) one.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Constrain the window size from below.
    pub fn set_min_size(&mut self, size: Size) {
        self.min_size = size;
    }

    /// Constrain the window size from above.
    pub fn set_max_size(&mut self, size: Size) {
        self.max_size = size;
    }

    // --- handler registry ---

    /// Install an element's mouse handler.
    pub fn set_mouse_handler(&mut self, id: ElementId, handler: MouseHandler) {
        self.handlers.entry(id).or_default().mouse = Some(handler);
    }

    /// Install a mouse override handler, tried before the element's own.
    pub fn set_mouse_override(&mut self, id: ElementId, handler: MouseHandler) {
        self.handlers.entry(id).or_default().mouse_override = Some(handler);
    }

    /// Install an element's key handler.
    pub fn set_key_handler(&mut self, id: ElementId, handler: KeyHandler) {
        self.handlers.entry(id).or_default().key = Some(handler);
    }

    /// Install a key override handler, tried before the element's own.
    pub fn set_key_override(&mut self, id: ElementId, handler: KeyHandler) {
        self.handlers.entry(id).or_default().key_override = Some(handler);
    }

    /// Install an element's wheel handler.
    pub fn set_wheel_handler(&mut self, id: ElementId, handler: WheelHandler) {
        self.handlers.entry(id).or_default().wheel = Some(handler);
    }

    /// Install a wheel override handler, tried before the element's own.
    pub fn set_wheel_override(&mut self, id: ElementId, handler: WheelHandler) {
        self.handlers.entry(id).or_default().wheel_override = Some(handler);
    }

    /// Remove every handler registered for `id`.
    pub fn clear_handlers(&mut self, id: ElementId) {
        self.handlers.remove(&id);
    }

    /// Register a global shortcut fired on key-down before focus routing.
    pub fn set_shortcut(&mut self, key: Key, modifiers: Modifiers, handler: ShortcutHandler) {
        self.shortcuts.insert((key, modifiers), handler);
    }

    /// Remove a global shortcut.
    pub fn clear_shortcut(&mut self, key: Key, modifiers: Modifiers) {
        self.shortcuts.remove(&(key, modifiers));
    }

    /// Install the handler for [`Posted::Custom`] events.
    pub fn set_posted_handler(&mut self, handler: PostedHandler) {
        self.posted_handler = Some(handler);
    }

    // --- update pipeline ---

    /// Install the tree-rebuild hook.
    pub fn set_rebuild_hook(&mut self, hook: RebuildHook) {
        self.rebuild_hook = Some(hook);
    }

    /// Install the style hook, run per root.
    pub fn set_style_hook(&mut self, hook: StyleHook) {
        self.style_hook = Some(hook);
    }

    /// Install the layout hook, run per root with the window size.
    pub fn set_layout_hook(&mut self, hook: LayoutHook) {
        self.layout_hook = Some(hook);
    }

    /// Install the draw hook.
    pub fn set_draw_hook(&mut self, hook: DrawHook) {
        self.draw_hook = Some(hook);
    }

    /// Request a tree rebuild on the next [`Window::update`].
    pub fn request_rebuild(&mut self) {
        self.need_rebuild = true;
    }

    /// Request a style recalculation on the next [`Window::update`].
    pub fn request_style_recalculation(&mut self) {
        self.need_style = true;
    }

    /// Request a layout pass on the next [`Window::update`].
    pub fn request_layout(&mut self) {
        self.need_layout = true;
    }

    /// Request a repaint on the next [`Window::update`].
    pub fn request_redraw(&mut self) {
        self.need_draw = true;
    }

    /// Collapse all pending mutations into at most one layout pass and one
    /// invalidate.
    ///
    /// Order is load-bearing: rebuild feeds style, style feeds layout, and
    /// the layout outcome decides whether a repaint is requested at all.
    /// Invalidation is skipped while the window is in a non-visible state.
    pub fn update(&mut self, force_redraw: bool) {
        if self.need_rebuild {
            self.need_rebuild = false;
            if let Some(hook) = self.rebuild_hook.as_mut() {
                hook(&mut self.tree);
            }
            let tree = &self.tree;
            self.handlers.retain(|id, _| tree.is_alive(*id));
            self.need_style = true;
        }
        if self.need_style {
            self.need_style = false;
            if let Some(hook) = self.style_hook.as_mut() {
                hook(&mut self.tree, self.root);
                for popup in &self.popups {
                    hook(&mut self.tree, popup.root);
                }
            }
            self.need_layout = true;
        }
        let mut did_layout = false;
        if self.need_layout {
            self.need_layout = false;
            if let Some(hook) = self.layout_hook.as_mut() {
                hook(&mut self.tree, self.root, self.size);
                for popup in &self.popups {
                    hook(&mut self.tree, popup.root, self.size);
                }
            }
            did_layout = true;
        }
        if self.state.is_visible() && (force_redraw || did_layout || self.need_draw) {
            self.need_draw = false;
            self.backend.invalidate();
        }
    }

    /// Backend callback: the platform is painting the window now.
    ///
    /// The draw hook is the only boundary that isolates panics: a panicking
    /// hook is logged and the frame completes. Input handlers are not
    /// isolated; a panic there propagates to the message loop.
    pub fn handle_redraw(&mut self) {
        self.update(false);
        if let Some(hook) = self.draw_hook.as_mut() {
            let tree = &mut self.tree;
            if catch_unwind(AssertUnwindSafe(|| hook(tree))).is_err() {
                tracing::error!(window = ?self.id, "draw hook panicked; frame completed without it");
            }
        }
        self.first_draw_done = true;
    }

    /// Backend callback: the native window was resized.
    pub fn handle_resize(&mut self, size: Size) {
        let clamped = Size::new(
            size.width.clamp(self.min_size.width, self.max_size.width),
            size.height.clamp(self.min_size.height, self.max_size.height),
        );
        if clamped == self.size {
            return;
        }
        self.size = clamped;
        self.tree.set_bounds(self.root, clamped.to_rect());
        self.need_layout = true;
        self.update(true);
    }

    /// Backend callback: window state (and possibly geometry) changed.
    pub fn handle_window_state_change(&mut self, state: WindowState, rect: Option<Rect>) {
        let became_visible = !self.state.is_visible() && state.is_visible();
        self.state = state;
        if let Some(rect) = rect {
            self.handle_resize(rect.size());
        }
        if became_visible {
            self.update(true);
        }
    }

    /// Backend callback: the window was activated or deactivated.
    ///
    /// Deactivation aborts any capture gesture, matching OS capture loss.
    pub fn handle_window_activity_change(&mut self, active: bool) {
        self.active = active;
        if !active && self.capture.is_some() {
            let event = MouseEvent::new(
                trellis_input::MouseAction::Cancel,
                trellis_input::MouseButton::None,
                self.last_buttons,
                self.keyboard_modifiers,
                self.last_mouse_pos,
            );
            self.dispatch_cancel(&event);
        }
    }

    // --- timers ---

    /// Schedule a repeating timer. The handler runs on the UI thread inside
    /// [`Window::handle_timer`]; returning `false` cancels it.
    pub fn set_timer(&mut self, interval_ms: u64, handler: TimerHandler) -> TimerId {
        let id = self.timers.add(now_millis(), interval_ms, handler);
        self.rearm_timer();
        id
    }

    /// Cancel a timer. Lazily purged; no thread wake needed.
    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    /// Backend callback: the timer wake message was pumped on the UI thread.
    pub fn handle_timer(&mut self) {
        self.armed_deadline = None;
        let now = now_millis();
        let fired = self.timers.notify(now);
        if self.anim_callbacks.is_empty() {
            if fired {
                self.update(false);
            }
        } else {
            let frames: Vec<_> = self.anim_callbacks.drain(..).collect();
            for callback in frames {
                callback(now);
            }
            self.update(true);
        }
        self.rearm_timer();
    }

    /// Run `callback` shortly before the next frame, then force a redraw.
    pub fn request_animation_frame(&mut self, callback: impl FnOnce(u64) + 'static) {
        self.anim_callbacks.push(Box::new(callback));
        // One-shot frame timer; the drain in handle_timer does the real work.
        let _ = self
            .timers
            .add(now_millis(), FRAME_INTERVAL_MS, Box::new(|_| false));
        self.rearm_timer();
    }

    /// (Re)arm the clock thread for the earliest queue deadline. Skipped when
    /// an earlier deadline is already armed, to avoid needless timer resets.
    fn rearm_timer(&mut self) {
        let Some(next) = self.timers.next_deadline() else {
            return;
        };
        if self.armed_deadline.is_some_and(|armed| armed <= next) {
            return;
        }
        self.armed_deadline = Some(next);
        let thread = self
            .timer_thread
            .get_or_insert_with(|| TimerThread::new(self.backend.timer_waker()));
        thread.notify_on(next);
    }

    // --- cross-thread posting ---

    /// A handle for posting events to this window from any thread.
    ///
    /// Posting reuses the backend waker; the UI loop drains the list with
    /// [`Window::handle_posted_events`] once the wake message is pumped.
    pub fn poster(&self) -> EventPoster {
        EventPoster::new(Arc::clone(&self.events), self.backend.timer_waker())
    }

    /// Drain and execute every posted event, then update.
    pub fn handle_posted_events(&mut self) {
        while let Some(event) = self.events.get() {
            self.execute_posted(event);
        }
        self.update(false);
    }

    /// Execute the oldest posted custom event with the given id, if present.
    pub fn handle_posted_event(&mut self, id: u64) -> bool {
        let Some(event) = self.events.take(id) else {
            return false;
        };
        self.execute_posted(event);
        self.update(false);
        true
    }

    fn execute_posted(&mut self, event: Posted) {
        match event {
            Posted::Run(f) => {
                let mut ctx = EventCtx::new(&mut self.tree);
                f(&mut ctx);
                let requests = ctx.take_requests();
                self.apply_requests(requests);
            }
            Posted::Custom { id, payload } => {
                if let Some(handler) = self.posted_handler.as_mut() {
                    let mut ctx = EventCtx::new(&mut self.tree);
                    handler(&mut ctx, id, payload);
                    let requests = ctx.take_requests();
                    self.apply_requests(requests);
                } else {
                    tracing::debug!(id, "posted event dropped: no handler installed");
                }
            }
        }
    }

    // --- popups ---

    /// Push a popup root onto the overlay stack (topmost). A modal popup
    /// gates keyboard and unconsumed mouse input to its subtree.
    pub fn show_popup(&mut self, root: ElementId, modal: bool) -> bool {
        if !self.tree.is_alive(root) || self.popups.iter().any(|p| p.root == root) {
            return false;
        }
        self.popups.push(PopupEntry { root, modal });
        self.need_style = true;
        self.need_layout = true;
        self.update(false);
        true
    }

    /// Remove a popup from the stack and destroy its subtree.
    pub fn close_popup(&mut self, root: ElementId) -> bool {
        let Some(pos) = self.popups.iter().position(|p| p.root == root) else {
            return false;
        };
        self.popups.remove(pos);
        self.tree.remove(root);
        self.need_draw = true;
        self.update(false);
        true
    }

    /// Index of the topmost modal popup in the stack, if any.
    pub(crate) fn topmost_modal_index(&self) -> Option<usize> {
        self.popups.iter().rposition(|p| p.modal)
    }

    /// Whether a modal popup is currently shown.
    pub fn has_modal_popup(&self) -> bool {
        self.topmost_modal_index().is_some()
    }

    // --- focus ---

    /// Move keyboard focus to `id`. Fails unless the element is alive,
    /// visible, enabled, and focusable.
    pub fn set_focus(&mut self, id: ElementId) -> bool {
        let focusable = self.tree.get(id).is_some_and(|e| {
            e.flags.contains(
                ElementFlags::VISIBLE | ElementFlags::ENABLED | ElementFlags::FOCUSABLE,
            )
        });
        if !focusable {
            return false;
        }
        if self.focused != Some(id) {
            self.focused = Some(id);
            self.need_draw = true;
        }
        true
    }

    /// Drop keyboard focus.
    pub fn clear_focus(&mut self) {
        if self.focused.take().is_some() {
            self.need_draw = true;
        }
    }

    /// The focused element, if it is still alive.
    pub fn focused(&self) -> Option<ElementId> {
        self.focused.filter(|id| self.tree.is_alive(*id))
    }

    /// The element holding mouse capture, if any.
    pub fn capture_target(&self) -> Option<ElementId> {
        self.capture.map(|c| c.element)
    }

    // --- handler offering ---

    pub(crate) fn apply_requests(&mut self, requests: CtxRequests) {
        if let Some(capture) = requests.capture {
            match capture {
                Some(id) if self.tree.is_alive(id) => {
                    self.capture = Some(Capture {
                        element: id,
                        buttons: self.last_buttons,
                        pointer_left: false,
                        track_outside: false,
                    });
                    self.backend.capture_mouse(true);
                }
                Some(id) => {
                    tracing::debug!(?id, "capture request for a dead element ignored");
                }
                None => {
                    if self.capture.take().is_some() {
                        self.backend.capture_mouse(false);
                    }
                }
            }
        }
        if let Some(focus) = requests.focus {
            match focus {
                Some(id) => {
                    let _ = self.set_focus(id);
                }
                None => self.clear_focus(),
            }
        }
        for root in requests.close_popups {
            let _ = self.close_popup(root);
        }
        if requests.redraw {
            self.need_draw = true;
        }
    }

    /// Offer a mouse event to one element: override handler first, then the
    /// element's own. The handler set is taken out of the registry for the
    /// duration of the call; if the handler destroys its own element the set
    /// is discarded instead of restored.
    pub(crate) fn offer_mouse(&mut self, id: ElementId, event: &mut MouseEvent) -> bool {
        if !self.tree.is_alive(id) {
            return false;
        }
        let Some(mut set) = self.handlers.remove(&id) else {
            return false;
        };
        let mut ctx = EventCtx::new(&mut self.tree);
        let mut handled = false;
        if let Some(h) = set.mouse_override.as_mut() {
            handled = h(&mut ctx, event);
        }
        if !handled && let Some(h) = set.mouse.as_mut() {
            handled = h(&mut ctx, event);
        }
        let requests = ctx.take_requests();
        if self.tree.is_alive(id) && !set.is_empty() {
            self.handlers.insert(id, set);
        }
        self.apply_requests(requests);
        handled
    }

    /// Offer a key event to one element (override first, then default).
    pub(crate) fn offer_key(&mut self, id: ElementId, event: &mut KeyEvent) -> bool {
        if !self.tree.is_alive(id) {
            return false;
        }
        let Some(mut set) = self.handlers.remove(&id) else {
            return false;
        };
        let mut ctx = EventCtx::new(&mut self.tree);
        let mut handled = false;
        if let Some(h) = set.key_override.as_mut() {
            handled = h(&mut ctx, event);
        }
        if !handled && let Some(h) = set.key.as_mut() {
            handled = h(&mut ctx, event);
        }
        let requests = ctx.take_requests();
        if self.tree.is_alive(id) && !set.is_empty() {
            self.handlers.insert(id, set);
        }
        self.apply_requests(requests);
        handled
    }

    /// Offer a wheel event to one element (override first, then default).
    pub(crate) fn offer_wheel(&mut self, id: ElementId, event: &WheelEvent) -> bool {
        if !self.tree.is_alive(id) {
            return false;
        }
        let Some(mut set) = self.handlers.remove(&id) else {
            return false;
        };
        let mut ctx = EventCtx::new(&mut self.tree);
        let mut handled = false;
        if let Some(h) = set.wheel_override.as_mut() {
            handled = h(&mut ctx, event);
        }
        if !handled && let Some(h) = set.wheel.as_mut() {
            handled = h(&mut ctx, event);
        }
        let requests = ctx.take_requests();
        if self.tree.is_alive(id) && !set.is_empty() {
            self.handlers.insert(id, set);
        }
        self.apply_requests(requests);
        handled
    }

    /// Run the shortcut registered for this chord, if any.
    pub(crate) fn run_shortcut(&mut self, key: Key, modifiers: Modifiers) -> bool {
        let Some(mut handler) = self.shortcuts.remove(&(key, modifiers)) else {
            return false;
        };
        let mut ctx = EventCtx::new(&mut self.tree);
        handler(&mut ctx);
        let requests = ctx.take_requests();
        self.shortcuts.insert((key, modifiers), handler);
        self.apply_requests(requests);
        true
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        // Join the clock thread before native resources go away.
        self.timer_thread = None;
        self.backend.cleanup();
    }
}
