// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-side cursor over an entity's version history.
//!
//! The cursor reconciles two independent triggers: the user picking an entry
//! from the history list, and the server pushing a fresh version list after
//! a mutation. It is a pure state machine so it can be unit-tested without
//! any rendering harness.
pub mod cursor;

pub use cursor::{CursorEvent, RenderSource, ViewCursor};
