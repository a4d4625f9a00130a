// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The state of a single test run.
//!
//! A [`Session`] accumulates one [`TestRecord`] per test as lifecycle events arrive. Once the run
//! is over, [`Session::verify`] derives one [`RequirementRecord`] per declared requirement.
//! [`SessionSummary`] is the serializable form used for history files.

mod imp;
mod requirement;
mod summary;
mod test_record;

pub use imp::*;
pub use requirement::*;
pub use summary::*;
pub use test_record::*;
