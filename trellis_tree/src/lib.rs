// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Tree: the element-tree surface consumed by the window dispatch core.
//!
//! ## Overview
//!
//! A generational slot arena of UI elements with parent links, z-ordered
//! child lists, visibility/enabled/focus flags, window-space bounds, and
//! recursive back-to-front hit testing.
//!
//! The dispatch core never holds owning references into the tree. Every
//! handle is an [`ElementId`] carrying a slot index and a generation counter:
//! if the element is destroyed (possibly by an event handler running in the
//! middle of a dispatch walk), the id silently stops validating and all
//! queries on it return empty. This is the non-GC rendition of the weak
//! references the dispatch state machine is specified against.
//!
//! Layout, styling, and painting are collaborators of the dispatch core and
//! live outside this crate; the tree stores only what routing needs.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod tree;
pub mod types;

pub use tree::ElementTree;
pub use types::{Element, ElementFlags, ElementId};
