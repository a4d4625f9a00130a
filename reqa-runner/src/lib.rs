// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for `cargo reqa`: requirement traceability on top of a test runner.
//!
//! Tests declare the requirements they verify. During a run, lifecycle events from the test engine
//! flow through a [`RunListener`](listener::RunListener) into a [`Session`](session::Session).
//! Once the run finishes, the session aggregates test outcomes into per-requirement verification
//! status and hands the result to each registered [`Presenter`](presenter::Presenter).
//!
//! The main entry point is [`RequirementTester`](tester::RequirementTester).

pub mod config;
pub mod declare;
pub mod discovery;
pub mod errors;
pub mod helpers;
pub mod listener;
pub mod presenter;
pub mod session;
#[cfg(test)]
pub(crate) mod test_helpers;
pub mod tester;
pub mod time;
