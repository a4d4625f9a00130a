// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    declare::{Declaration, RequirementRegistry},
    errors::{EngineError, PresentError, RunError},
    listener::{RunListener, RunObserver, RunResult},
    session::{FailureDetail, Session, TestName},
    tester::TestEngine,
    time::Clock,
};
use chrono::{DateTime, FixedOffset, TimeZone};
use indexmap::IndexSet;
use smol_str::SmolStr;
use std::{cell::Cell, cell::RefCell, rc::Rc, time::Duration};

pub(crate) fn test_name(qualified: &str) -> TestName {
    TestName::parse(qualified)
}

/// A UTC timestamp `millis` milliseconds after the Unix epoch.
pub(crate) fn at_millis(millis: i64) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .expect("UTC is a valid offset")
        .timestamp_millis_opt(millis)
        .single()
        .expect("timestamp is in range")
}

/// A verified session with a passing test, a failing test and a skipped test.
///
/// * `math::tests::adds` verifies `MATH-ADD` (gist "adds two numbers"), runs 10..25ms and passes.
/// * `math::tests::subtracts` verifies `MATH-SUB`, runs 30..70ms and fails.
/// * `math::tests::helper` declares nothing and is skipped.
///
/// The session starts at 0ms and ends at 80ms.
pub(crate) fn sample_session() -> Session {
    let mut registry = RequirementRegistry::new();
    registry
        .declare(
            test_name("math::tests::adds"),
            Declaration::new(["MATH-ADD"]).with_gist("adds two numbers"),
        )
        .declare(
            test_name("math::tests::subtracts"),
            Declaration::new(["MATH-SUB"]),
        )
        .register_test(test_name("math::tests::helper"));

    let mut session = Session::new();
    session.set_start(at_millis(0));
    session.test_started(test_name("math::tests::adds"), at_millis(10));
    session
        .test_finished(test_name("math::tests::adds"), at_millis(25))
        .expect("adds was started");
    session.test_started(test_name("math::tests::subtracts"), at_millis(30));
    session.record_failure(
        test_name("math::tests::subtracts"),
        FailureDetail::new("assertion failed: 10 - 5 == 4"),
    );
    session
        .test_finished(test_name("math::tests::subtracts"), at_millis(70))
        .expect("subtracts was started");
    session.record_skip(test_name("math::tests::helper"));
    session.set_end(at_millis(80));
    session.verify(&registry);
    session
}

/// A clock that starts at the epoch and moves forward by a fixed step every time it's read.
#[derive(Debug)]
pub(crate) struct ManualClock {
    next: Cell<i64>,
    step: i64,
}

impl ManualClock {
    pub(crate) fn new(step_millis: i64) -> Self {
        Self {
            next: Cell::new(0),
            step: step_millis,
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = self.next.get();
        self.next.set(now + self.step);
        at_millis(now)
    }
}

/// A shared log of observer events.
#[derive(Clone, Debug, Default)]
pub(crate) struct EventLog {
    events: Rc<RefCell<Vec<String>>>,
}

impl EventLog {
    fn push(&self, event: String) {
        self.events.borrow_mut().push(event);
    }

    /// Returns and clears the events logged so far.
    pub(crate) fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

/// An observer that logs every event it sees.
#[derive(Debug)]
pub(crate) struct RecordingObserver {
    name: &'static str,
    log: EventLog,
}

impl RecordingObserver {
    pub(crate) fn new(name: &'static str, log: &EventLog) -> Self {
        Self {
            name,
            log: log.clone(),
        }
    }
}

impl RunObserver for RecordingObserver {
    fn name(&self) -> &str {
        self.name
    }

    fn run_started(&mut self, session: &Session) {
        self.log.push(format!(
            "{}: run started ({} tests)",
            self.name,
            session.test_count()
        ));
    }

    fn before_test(&mut self, test: &TestName) {
        self.log.push(format!("{}: before {test}", self.name));
    }

    fn failed_test(&mut self, test: &TestName, detail: &FailureDetail) {
        self.log
            .push(format!("{}: failed {test}: {}", self.name, detail.message()));
    }

    fn after_test(&mut self, test: &TestName) {
        self.log.push(format!("{}: after {test}", self.name));
    }

    fn ignored_test(&mut self, test: &TestName) {
        self.log.push(format!("{}: ignored {test}", self.name));
    }

    fn run_finished(&mut self, session: &Session, _result: &RunResult) -> Result<(), PresentError> {
        self.log.push(format!(
            "{}: run finished ({} requirements)",
            self.name,
            session.requirement_count()
        ));
        Ok(())
    }
}

/// An observer whose run-finished handler always fails.
#[derive(Debug)]
pub(crate) struct FailingObserver;

impl RunObserver for FailingObserver {
    fn name(&self) -> &str {
        "failing"
    }

    fn run_finished(&mut self, _session: &Session, _result: &RunResult) -> Result<(), PresentError> {
        Err(PresentError::Fs {
            file: "unwritable/report.html".into(),
            error: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        })
    }
}

/// One step of a [`ScriptedEngine`] script.
#[derive(Clone, Debug)]
pub(crate) enum EngineEvent {
    RunStarted,
    Started(&'static str),
    Failed(&'static str, &'static str),
    Finished(&'static str),
    Ignored(&'static str),
    RunFinished,
    /// Makes the engine return an error.
    Fail(&'static str),
}

#[derive(Clone, Debug)]
enum Script {
    Fixed(Vec<EngineEvent>),
    PassingAll(Vec<TestName>),
}

/// A test engine that replays lifecycle events instead of running tests.
#[derive(Clone, Debug)]
pub(crate) struct ScriptedEngine {
    script: Script,
    seen_owners: Vec<String>,
}

impl ScriptedEngine {
    /// Replays `events` regardless of the owners passed in.
    pub(crate) fn new(events: Vec<EngineEvent>) -> Self {
        Self {
            script: Script::Fixed(events),
            seen_owners: Vec::new(),
        }
    }

    /// Runs every registered test belonging to the requested owners, and passes them all.
    pub(crate) fn passing_all(registry: &RequirementRegistry) -> Self {
        Self {
            script: Script::PassingAll(registry.tests().map(|(test, _)| test.clone()).collect()),
            seen_owners: Vec::new(),
        }
    }

    /// The owners passed in to the last run.
    pub(crate) fn seen_owners(&self) -> &[String] {
        &self.seen_owners
    }
}

impl TestEngine for ScriptedEngine {
    fn run(
        &mut self,
        owners: &IndexSet<SmolStr>,
        listener: &mut RunListener<'_>,
    ) -> Result<(), RunError> {
        self.seen_owners = owners.iter().map(ToString::to_string).collect();

        match &self.script {
            Script::Fixed(events) => {
                for event in events {
                    match *event {
                        EngineEvent::RunStarted => listener.on_run_started()?,
                        EngineEvent::Started(name) => listener.on_test_started(test_name(name))?,
                        EngineEvent::Failed(name, message) => listener
                            .on_test_failed(test_name(name), FailureDetail::new(message))?,
                        EngineEvent::Finished(name) => {
                            listener.on_test_finished(test_name(name))?
                        }
                        EngineEvent::Ignored(name) => listener.on_test_ignored(test_name(name))?,
                        EngineEvent::RunFinished => {
                            listener.on_run_finished(&RunResult::default())?
                        }
                        EngineEvent::Fail(message) => return Err(EngineError::new(message).into()),
                    }
                }
            }
            Script::PassingAll(tests) => {
                listener.on_run_started()?;
                let mut result = RunResult::default();
                for test in tests.iter().filter(|test| owners.contains(test.owner())) {
                    listener.on_test_started(test.clone())?;
                    listener.on_test_finished(test.clone())?;
                    result.run_count += 1;
                }
                result.elapsed = Duration::from_millis(result.run_count as u64);
                listener.on_run_finished(&result)?;
            }
        }
        Ok(())
    }
}
