// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{RunObserver, RunResult};
use crate::{
    declare::RequirementSource,
    errors::{DispatchError, DisplayErrorChain},
    helpers::plural,
    presenter::{Presenter, PresenterObserver},
    session::{FailureDetail, Session, TestName},
    time::{Clock, truncate_to_millis},
};
use debug_ignore::DebugIgnore;
use std::fmt;
use tracing::{debug, error, warn};

/// The state of a run, as seen by a [`RunListener`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunState {
    /// The run hasn't started yet.
    Idle,

    /// The run is in progress.
    Running,

    /// The run is over, and requirement records have been computed.
    Finished,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Running => write!(f, "running"),
            RunState::Finished => write!(f, "finished"),
        }
    }
}

/// Receives lifecycle events for one run and dispatches them.
///
/// Each event is first applied to the session (the aggregation stage), then forwarded to every
/// observer in the order they were added. When the run finishes, [`Session::verify`] is called
/// exactly once before any observer's [`RunObserver::run_finished`] runs.
///
/// Events must arrive in the order `run started`, any number of test events, `run finished`.
/// Anything else is rejected with [`DispatchError::InvalidTransition`].
#[derive(Debug)]
pub struct RunListener<'a> {
    session: Session,
    source: DebugIgnore<&'a dyn RequirementSource>,
    clock: DebugIgnore<&'a dyn Clock>,
    observers: DebugIgnore<Vec<Box<dyn RunObserver + 'a>>>,
    state: RunState,
    failed_observers: Vec<String>,
}

impl<'a> RunListener<'a> {
    /// Creates a new listener with a fresh session and no observers.
    pub fn new(source: &'a dyn RequirementSource, clock: &'a dyn Clock) -> Self {
        Self::with_observers(source, clock, Vec::new())
    }

    /// Creates a new listener with a fresh session and the given observers.
    pub fn with_observers(
        source: &'a dyn RequirementSource,
        clock: &'a dyn Clock,
        observers: Vec<Box<dyn RunObserver + 'a>>,
    ) -> Self {
        Self {
            session: Session::new(),
            source: DebugIgnore(source),
            clock: DebugIgnore(clock),
            observers: DebugIgnore(observers),
            state: RunState::Idle,
            failed_observers: Vec::new(),
        }
    }

    /// Adds an observer. Observers are notified in the order they're added.
    pub fn add_observer(&mut self, observer: impl RunObserver + 'a) -> &mut Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Adds an already-boxed observer.
    pub fn add_boxed_observer(&mut self, observer: Box<dyn RunObserver + 'a>) -> &mut Self {
        self.observers.push(observer);
        self
    }

    /// Adds a presenter, which is run when the run finishes.
    pub fn add_presenter<P>(&mut self, presenter: P) -> &mut Self
    where
        P: Presenter + 'a,
    {
        self.add_observer(PresenterObserver::new(presenter))
    }

    /// Returns the current state of the run.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Returns the session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the names of observers whose [`RunObserver::run_finished`] returned an error.
    pub fn failed_observers(&self) -> &[String] {
        &self.failed_observers
    }

    /// Consumes the listener, returning the session.
    pub fn into_session(self) -> Session {
        self.session
    }

    pub(crate) fn into_parts(self) -> (Session, Vec<Box<dyn RunObserver + 'a>>) {
        (self.session, self.observers.0)
    }

    fn now(&self) -> chrono::DateTime<chrono::FixedOffset> {
        truncate_to_millis(self.clock.now())
    }

    /// Called when the run starts.
    pub fn on_run_started(&mut self) -> Result<(), DispatchError> {
        self.transition("run started", RunState::Idle, RunState::Running)?;
        if self.observers.is_empty() {
            warn!("no run observers registered, results will not be presented");
        }

        self.session.set_start(self.now());
        for observer in self.observers.iter_mut() {
            observer.run_started(&self.session);
        }
        Ok(())
    }

    /// Called when a test starts.
    pub fn on_test_started(&mut self, test: TestName) -> Result<(), DispatchError> {
        self.expect_running("test started")?;
        self.session.test_started(test.clone(), self.now());
        for observer in self.observers.iter_mut() {
            observer.before_test(&test);
        }
        Ok(())
    }

    /// Called when a test finishes, whether or not it failed.
    pub fn on_test_finished(&mut self, test: TestName) -> Result<(), DispatchError> {
        self.expect_running("test finished")?;
        self.session.test_finished(test.clone(), self.now())?;
        for observer in self.observers.iter_mut() {
            observer.after_test(&test);
        }
        Ok(())
    }

    /// Called when a test fails. The engine reports the test as finished separately.
    pub fn on_test_failed(
        &mut self,
        test: TestName,
        detail: FailureDetail,
    ) -> Result<(), DispatchError> {
        self.expect_running("test failed")?;
        self.session.record_failure(test.clone(), detail.clone());
        for observer in self.observers.iter_mut() {
            observer.failed_test(&test, &detail);
        }
        Ok(())
    }

    /// Called when a test is ignored.
    pub fn on_test_ignored(&mut self, test: TestName) -> Result<(), DispatchError> {
        self.expect_running("test ignored")?;
        self.session.record_skip(test.clone());
        for observer in self.observers.iter_mut() {
            observer.ignored_test(&test);
        }
        Ok(())
    }

    /// Called when the run finishes.
    ///
    /// Computes requirement records, then notifies observers. Observer failures are logged and
    /// recorded in [`Self::failed_observers`], but do not fail the run.
    pub fn on_run_finished(&mut self, result: &RunResult) -> Result<(), DispatchError> {
        self.transition("run finished", RunState::Running, RunState::Finished)?;

        self.session.set_end(self.now());
        self.session.verify(*self.source);
        debug!(
            "run finished: {} {} run, {} failed, {} ignored; {} of {} {} verified",
            result.run_count,
            plural::tests_str(result.run_count),
            result.failure_count,
            result.ignore_count,
            self.session.verified_count(),
            self.session.requirement_count(),
            plural::requirements_str(self.session.requirement_count()),
        );

        for observer in self.observers.iter_mut() {
            if let Err(err) = observer.run_finished(&self.session, result) {
                error!(
                    "observer `{}` failed: {}",
                    observer.name(),
                    DisplayErrorChain::new(err),
                );
                self.failed_observers.push(observer.name().to_owned());
            }
        }
        Ok(())
    }

    fn expect_running(&self, event: &'static str) -> Result<(), DispatchError> {
        if self.state == RunState::Running {
            Ok(())
        } else {
            Err(DispatchError::InvalidTransition {
                event,
                state: self.state,
            })
        }
    }

    fn transition(
        &mut self,
        event: &'static str,
        from: RunState,
        to: RunState,
    ) -> Result<(), DispatchError> {
        if self.state != from {
            return Err(DispatchError::InvalidTransition {
                event,
                state: self.state,
            });
        }
        self.state = to;
        Ok(())
    }
}
