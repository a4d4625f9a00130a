// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run tests and verify the requirements they declare.
//!
//! [`RequirementTester`] ties discovery, the test engine and the listener together: it discovers
//! the owners in scope, creates a fresh [`RunListener`] for each run, hands both to a
//! [`TestEngine`], and returns the finished [`Session`].

use crate::{
    config::ReqaConfig,
    declare::RequirementSource,
    discovery::{DiscoveryScope, TestDiscovery},
    errors::RunError,
    helpers::plural,
    listener::{RunListener, RunObserver, RunState},
    presenter::{Presenter, PresenterObserver},
    session::Session,
    time::{Clock, SystemClock},
};
use debug_ignore::DebugIgnore;
use indexmap::IndexSet;
use itertools::Itertools;
use smol_str::SmolStr;
use tracing::{debug, warn};

/// Executes tests and reports lifecycle events to a [`RunListener`].
///
/// Engine-specific failures are reported as [`EngineError`](crate::errors::EngineError).
///
/// Implementations must deliver `on_run_started`, then the events for each test, then
/// `on_run_finished`, all on the calling thread. Both engine errors and the listener's
/// [`DispatchError`](crate::errors::DispatchError) convert into [`RunError`] with `?`.
pub trait TestEngine {
    /// Runs the tests belonging to `owners`, in order.
    fn run(
        &mut self,
        owners: &IndexSet<SmolStr>,
        listener: &mut RunListener<'_>,
    ) -> Result<(), RunError>;
}

/// Runs tests in a scope and verifies the requirements they declare.
#[derive(Debug)]
pub struct RequirementTester<'a> {
    discovery: DebugIgnore<&'a dyn TestDiscovery>,
    source: DebugIgnore<&'a dyn RequirementSource>,
    clock: DebugIgnore<&'a dyn Clock>,
    scope: DiscoveryScope,
    observers: DebugIgnore<Vec<Box<dyn RunObserver + 'a>>>,
}

impl<'a> RequirementTester<'a> {
    /// Creates a new tester that runs every discovered owner, using the system clock and no
    /// observers.
    pub fn new(discovery: &'a dyn TestDiscovery, source: &'a dyn RequirementSource) -> Self {
        Self {
            discovery: DebugIgnore(discovery),
            source: DebugIgnore(source),
            clock: DebugIgnore(&SystemClock),
            scope: DiscoveryScope::All,
            observers: DebugIgnore(Vec::new()),
        }
    }

    /// Restricts the tests that are run to a scope.
    pub fn with_scope(mut self, scope: DiscoveryScope) -> Self {
        self.scope = scope;
        self
    }

    /// Uses a different clock to timestamp events.
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = DebugIgnore(clock);
        self
    }

    /// Adds an observer. Observers are notified in the order they're added.
    pub fn add_observer(&mut self, observer: impl RunObserver + 'a) -> &mut Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Returns the number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Removes and returns the observer at `index`, counting in the order observers were added.
    ///
    /// Returns `None` if there's no observer at that index.
    pub fn remove_observer(&mut self, index: usize) -> Option<Box<dyn RunObserver + 'a>> {
        (index < self.observers.len()).then(|| self.observers.remove(index))
    }

    /// Adds a presenter, which is run at the end of each run.
    pub fn add_presenter<P>(&mut self, presenter: P) -> &mut Self
    where
        P: Presenter + 'a,
    {
        self.add_observer(PresenterObserver::new(presenter))
    }

    /// Adds every presenter enabled in the config.
    pub fn add_configured_presenters(&mut self, config: &ReqaConfig) -> &mut Self {
        self.observers.extend(config.presenter_observers());
        self
    }

    /// Returns the scope tests are discovered in.
    pub fn scope(&self) -> &DiscoveryScope {
        &self.scope
    }

    /// Discovers the owners in scope.
    pub fn discover(&self) -> IndexSet<SmolStr> {
        self.discovery.discover(&self.scope)
    }

    /// Runs the tests in scope with `engine`, and returns the verified session.
    ///
    /// Each call starts a fresh session. Observers are kept across runs.
    pub fn run(&mut self, engine: &mut dyn TestEngine) -> Result<Session, RunError> {
        let owners = self.discover();
        if owners.is_empty() {
            warn!("no tests found in {}", self.scope);
        }
        self.run_owners(engine, &owners)
    }

    /// Runs the tests belonging to `owners` with `engine`, without consulting discovery, and
    /// returns the verified session.
    pub fn run_owners(
        &mut self,
        engine: &mut dyn TestEngine,
        owners: &IndexSet<SmolStr>,
    ) -> Result<Session, RunError> {
        debug!(
            "running {} {}: {}",
            owners.len(),
            plural::owners_str(owners.len()),
            owners.iter().join(", "),
        );

        let observers = std::mem::take(&mut *self.observers);
        let mut listener = RunListener::with_observers(*self.source, *self.clock, observers);
        let result = engine.run(owners, &mut listener);
        let state = listener.state();
        let (session, observers) = listener.into_parts();
        *self.observers = observers;

        result?;
        match state {
            RunState::Finished => Ok(session),
            RunState::Idle | RunState::Running => Err(RunError::Incomplete { state }),
        }
    }
}
