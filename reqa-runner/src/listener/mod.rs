// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Receive lifecycle events from a test engine and fan them out.
//!
//! The main type here is [`RunListener`]. Every event first updates the listener's
//! [`Session`](crate::session::Session), then is forwarded to each registered [`RunObserver`] in
//! registration order. Presenters are observers too, through
//! [`PresenterObserver`](crate::presenter::PresenterObserver).

mod imp;
mod observer;

pub use imp::*;
pub use observer::*;
