// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for reqa.
//!
//! The main structure in this module is [`ReqaConfig`].

mod imp;
mod presenters;

pub use imp::*;
pub use presenters::PresenterKind;
