// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::PresentError,
    session::{FailureDetail, Session, TestName},
};
use std::time::Duration;

/// Statistics about a completed run, as reported by the test engine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RunResult {
    /// The number of tests that ran.
    pub run_count: usize,

    /// The number of tests that failed.
    pub failure_count: usize,

    /// The number of tests that were ignored.
    pub ignore_count: usize,

    /// The time the run took.
    pub elapsed: Duration,
}

impl RunResult {
    /// Returns true if no test failed.
    pub fn was_successful(&self) -> bool {
        self.failure_count == 0
    }
}

/// An observer of the lifecycle events of a run.
///
/// Every method has a default implementation that does nothing, so implementors only need to
/// override the events they care about. Observers only ever see the session through a shared
/// reference.
pub trait RunObserver {
    /// A name for this observer, used in logs when it fails.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called once, after the session start time has been set.
    fn run_started(&mut self, _session: &Session) {}

    /// Called when a test starts.
    fn before_test(&mut self, _test: &TestName) {}

    /// Called when a test fails, before the test finishes.
    fn failed_test(&mut self, _test: &TestName, _detail: &FailureDetail) {}

    /// Called when a test finishes, whether it passed or failed.
    fn after_test(&mut self, _test: &TestName) {}

    /// Called when a test is ignored.
    fn ignored_test(&mut self, _test: &TestName) {}

    /// Called once at the end of the run, after requirement records have been computed.
    ///
    /// A returned error is logged, and doesn't stop other observers from running.
    fn run_finished(&mut self, _session: &Session, _result: &RunResult) -> Result<(), PresentError> {
        Ok(())
    }
}
