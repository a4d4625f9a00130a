// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, FixedOffset, TimeZone};
use color_eyre::eyre::{Result, eyre};
use indexmap::IndexSet;
use reqa_runner::{
    declare::{Declaration, RequirementRegistry},
    errors::RunError,
    listener::{RunListener, RunResult},
    session::{FailureDetail, TestName},
    tester::TestEngine,
    time::Clock,
};
use smol_str::SmolStr;
use std::{cell::Cell, time::Duration};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum FixtureStatus {
    Pass,
    Fail(&'static str),
    Ignored,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TestFixture {
    pub(crate) name: &'static str,
    pub(crate) status: FixtureStatus,
    pub(crate) verifies: &'static [&'static str],
    pub(crate) gist: Option<&'static str>,
}

impl TestFixture {
    pub(crate) fn test_name(&self) -> TestName {
        TestName::parse(self.name)
    }
}

pub(crate) static CALCULATOR_TESTS: &[TestFixture] = &[
    TestFixture {
        name: "calc::tests::addition",
        status: FixtureStatus::Pass,
        verifies: &["CALC-ADD"],
        gist: Some("Adding two and two gives four."),
    },
    TestFixture {
        name: "calc::tests::addition_overflow",
        status: FixtureStatus::Pass,
        verifies: &["CALC-ADD", "CALC-OVERFLOW"],
        gist: None,
    },
    TestFixture {
        name: "calc::tests::subtraction",
        status: FixtureStatus::Fail("assertion `left == right` failed\n  left: 6\n right: 5"),
        verifies: &["CALC-SUB"],
        gist: Some("Subtracting five from ten gives five."),
    },
    TestFixture {
        name: "calc::parser::tests::parses_literals",
        status: FixtureStatus::Pass,
        verifies: &["CALC-PARSE"],
        gist: None,
    },
    TestFixture {
        name: "calc::parser::tests::slow_fuzz",
        status: FixtureStatus::Ignored,
        verifies: &[],
        gist: None,
    },
];

/// Builds a registry out of the fixtures' declarations.
pub(crate) fn fixture_registry(fixtures: &[TestFixture]) -> RequirementRegistry {
    let mut registry = RequirementRegistry::new();
    for fixture in fixtures {
        if fixture.verifies.is_empty() {
            registry.register_test(fixture.test_name());
            continue;
        }
        let mut declaration = Declaration::new(fixture.verifies.iter().copied());
        if let Some(gist) = fixture.gist {
            declaration = declaration.with_gist(gist);
        }
        registry.declare(fixture.test_name(), declaration);
    }
    registry
}

/// A test engine that "runs" fixtures according to their status.
#[derive(Debug)]
pub(crate) struct FixtureEngine {
    fixtures: &'static [TestFixture],
    runs: usize,
}

impl FixtureEngine {
    pub(crate) fn new(fixtures: &'static [TestFixture]) -> Self {
        Self { fixtures, runs: 0 }
    }

    pub(crate) fn runs(&self) -> usize {
        self.runs
    }
}

impl TestEngine for FixtureEngine {
    fn run(
        &mut self,
        owners: &IndexSet<SmolStr>,
        listener: &mut RunListener<'_>,
    ) -> Result<(), RunError> {
        self.runs += 1;
        listener.on_run_started()?;

        let mut result = RunResult::default();
        for owner in owners {
            for fixture in self
                .fixtures
                .iter()
                .filter(|fixture| fixture.test_name().owner() == owner.as_str())
            {
                match fixture.status {
                    FixtureStatus::Pass => {
                        listener.on_test_started(fixture.test_name())?;
                        listener.on_test_finished(fixture.test_name())?;
                    }
                    FixtureStatus::Fail(message) => {
                        listener.on_test_started(fixture.test_name())?;
                        listener.on_test_failed(fixture.test_name(), FailureDetail::new(message))?;
                        listener.on_test_finished(fixture.test_name())?;
                        result.failure_count += 1;
                    }
                    FixtureStatus::Ignored => {
                        listener.on_test_ignored(fixture.test_name())?;
                        result.ignore_count += 1;
                        continue;
                    }
                }
                result.run_count += 1;
            }
        }

        result.elapsed = Duration::from_millis(10 * result.run_count as u64);
        listener.on_run_finished(&result)?;
        Ok(())
    }
}

/// A clock that advances by 10ms on every read, starting at 2024-03-01T09:00:00Z.
#[derive(Debug, Default)]
pub(crate) struct SteppingClock {
    reads: Cell<i64>,
}

impl SteppingClock {
    pub(crate) const START_MILLIS: i64 = 1_709_283_600_000;
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let reads = self.reads.get();
        self.reads.set(reads + 1);
        let utc = FixedOffset::east_opt(0).expect("UTC is a valid offset");
        utc.timestamp_millis_opt(Self::START_MILLIS + 10 * reads)
            .single()
            .expect("timestamp is in range")
    }
}

pub(crate) fn read_to_string(path: &camino::Utf8Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|error| eyre!("error reading {path}: {error}"))
}
