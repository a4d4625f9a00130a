// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Requirement traceability for Rust test runs.
//!
//! `cargo reqa` inspects the session history written by
//! [`reqa-runner`](reqa_runner), re-presents saved sessions, and lists the requirements
//! declared in a workspace's `.config/reqa.toml`.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputWriter;
