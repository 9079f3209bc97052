// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cross-thread event posting.
//!
//! Background threads hand work to a window through an [`EventPoster`]: the
//! payload goes into a mutex-guarded list and the backend waker nudges the UI
//! loop, which drains the list via [`crate::Window::handle_posted_events`].
//! Nothing in here touches UI state; execution always happens on the UI
//! thread.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::window::EventCtx;

/// A unit of work posted from another thread.
pub enum Posted {
    /// An application-defined payload, matched by id.
    Custom {
        /// Application-chosen identifier, used by [`EventList::take`].
        id: u64,
        /// Opaque payload, downcast by the receiving handler.
        payload: Box<dyn Any + Send>,
    },
    /// A closure executed against the window's dispatch context.
    Run(Box<dyn FnOnce(&mut EventCtx<'_>) + Send>),
}

impl core::fmt::Debug for Posted {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Custom { id, .. } => f
                .debug_struct("Posted::Custom")
                .field("id", id)
                .finish_non_exhaustive(),
            Self::Run(_) => f.debug_struct("Posted::Run").finish_non_exhaustive(),
        }
    }
}

/// Mutex-guarded queue of posted events, shared between the window and any
/// number of posters.
#[derive(Debug, Default)]
pub struct EventList {
    queue: Mutex<VecDeque<Posted>>,
}

impl EventList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn put(&self, event: Posted) {
        self.queue.lock().expect("event list poisoned").push_back(event);
    }

    /// Pop the oldest event, if any.
    pub fn get(&self) -> Option<Posted> {
        self.queue.lock().expect("event list poisoned").pop_front()
    }

    /// Remove and return the oldest [`Posted::Custom`] with the given id.
    pub fn take(&self, id: u64) -> Option<Posted> {
        let mut queue = self.queue.lock().expect("event list poisoned");
        let pos = queue
            .iter()
            .position(|e| matches!(e, Posted::Custom { id: eid, .. } if *eid == id))?;
        queue.remove(pos)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.queue.lock().expect("event list poisoned").len()
    }

    /// Whether no event is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cheaply cloneable handle for posting events to a window from any thread.
#[derive(Clone)]
pub struct EventPoster {
    list: Arc<EventList>,
    waker: Arc<dyn Fn() + Send + Sync>,
}

impl core::fmt::Debug for EventPoster {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventPoster")
            .field("pending", &self.list.len())
            .finish_non_exhaustive()
    }
}

impl EventPoster {
    pub(crate) fn new(list: Arc<EventList>, waker: Arc<dyn Fn() + Send + Sync>) -> Self {
        Self { list, waker }
    }

    /// Enqueue an event and wake the UI loop.
    pub fn post(&self, event: Posted) {
        self.list.put(event);
        (self.waker)();
    }

    /// Enqueue a closure to run on the UI thread and wake the UI loop.
    pub fn run<F>(&self, f: F)
    where
        F: FnOnce(&mut EventCtx<'_>) + Send + 'static,
    {
        self.post(Posted::Run(Box::new(f)));
    }
}
