// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    declare::{DeclaredRequirement, RequirementSource, flatten_declarations},
    errors::{IntrospectionError, TestRecordError},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;
use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// The qualified name of a test: the module path that owns it, plus the test function name.
///
/// Displayed and serialized as `owner::name`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestName {
    owner: SmolStr,
    name: SmolStr,
}

impl TestName {
    /// Creates a new `TestName` from an owner module path and a test function name.
    ///
    /// If `name` contains `::`, everything before the last `::` is appended to the owner, so that
    /// the result displays and parses back the same way.
    pub fn new(owner: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        let owner = owner.into();
        let name = name.into();
        match name.rsplit_once("::") {
            Some((prefix, name)) => {
                let owner = if owner.is_empty() {
                    SmolStr::new(prefix)
                } else {
                    SmolStr::from(format!("{owner}::{prefix}"))
                };
                Self {
                    owner,
                    name: SmolStr::new(name),
                }
            }
            None => Self { owner, name },
        }
    }

    /// Parses a qualified name of the form `owner::name`.
    ///
    /// The owner is everything before the last `::`. A name without `::` has an empty owner.
    pub fn parse(qualified: &str) -> Self {
        match qualified.rsplit_once("::") {
            Some((owner, name)) => Self::new(owner, name),
            None => Self::new("", qualified),
        }
    }

    /// Returns the module path that owns this test.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the test function name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.owner.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}::{}", self.owner, self.name)
        }
    }
}

impl From<&str> for TestName {
    fn from(qualified: &str) -> Self {
        Self::parse(qualified)
    }
}

impl Serialize for TestName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TestName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let qualified = String::deserialize(deserializer)?;
        Ok(Self::parse(&qualified))
    }
}

/// Information about why a test failed, as reported by the test engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureDetail {
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace: Option<String>,
}

impl FailureDetail {
    /// Creates a new `FailureDetail` with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: None,
        }
    }

    /// Attaches a trace (for example a panic backtrace) to this failure.
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    /// Returns the failure message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the trace, if any.
    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }
}

/// Whether a test has succeeded so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TestOutcome {
    /// No failure has been recorded.
    #[default]
    Success,

    /// A failure was recorded.
    Failure(FailureDetail),
}

impl TestOutcome {
    /// Returns true if no failure has been recorded.
    pub fn is_success(&self) -> bool {
        matches!(self, TestOutcome::Success)
    }

    /// Returns the failure detail, if this outcome is a failure.
    pub fn failure(&self) -> Option<&FailureDetail> {
        match self {
            TestOutcome::Success => None,
            TestOutcome::Failure(detail) => Some(detail),
        }
    }

    /// Combines the current outcome with an update for the same test.
    ///
    /// Failure is sticky: an incoming failure always wins (replacing any earlier failure detail),
    /// and an incoming success never turns a failure back into a success.
    pub fn merge(self, incoming: TestOutcome) -> TestOutcome {
        match incoming {
            TestOutcome::Failure(detail) => TestOutcome::Failure(detail),
            TestOutcome::Success => self,
        }
    }
}

/// The run-time record of one test: its identity, timing, outcome, and gist.
///
/// Equality and hashing only consider the [`TestName`].
#[derive(Clone, Debug)]
pub struct TestRecord {
    pub(super) name: TestName,
    pub(super) gist: Option<String>,
    pub(super) started_at: Option<DateTime<FixedOffset>>,
    pub(super) finished_at: Option<DateTime<FixedOffset>>,
    pub(super) duration_millis: Option<i64>,
    pub(super) outcome: TestOutcome,
    pub(super) skipped: Option<bool>,
}

impl TestRecord {
    /// Creates a new, successful record with no timing information.
    pub fn new(name: TestName) -> Self {
        Self {
            name,
            gist: None,
            started_at: None,
            finished_at: None,
            duration_millis: None,
            outcome: TestOutcome::Success,
            skipped: None,
        }
    }

    /// Creates a new record for a test that failed.
    pub fn failed(name: TestName, detail: FailureDetail) -> Self {
        let mut record = Self::new(name);
        record.record_failure(detail);
        record
    }

    /// Returns the name of the test.
    pub fn name(&self) -> &TestName {
        &self.name
    }

    /// Returns the gist of what this test verifies, if one was declared.
    pub fn gist(&self) -> Option<&str> {
        self.gist.as_deref()
    }

    /// Returns the time the test started.
    pub fn started_at(&self) -> Option<DateTime<FixedOffset>> {
        self.started_at
    }

    /// Returns the time the test finished.
    pub fn finished_at(&self) -> Option<DateTime<FixedOffset>> {
        self.finished_at
    }

    /// Returns the time between start and finish in milliseconds, once the test has finished.
    pub fn duration_millis(&self) -> Option<i64> {
        self.duration_millis
    }

    /// Returns the outcome of the test so far.
    pub fn outcome(&self) -> &TestOutcome {
        &self.outcome
    }

    /// Returns true if no failure has been recorded for this test.
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Returns the failure detail, if the test failed.
    pub fn failure(&self) -> Option<&FailureDetail> {
        self.outcome.failure()
    }

    /// Returns whether the test was reported as skipped.
    ///
    /// `None` means the engine never said either way. Skipping has no effect on verification.
    pub fn is_skipped(&self) -> Option<bool> {
        self.skipped
    }

    /// Records the time the test started.
    pub fn record_start(&mut self, at: DateTime<FixedOffset>) {
        self.started_at = Some(at);
    }

    /// Records the time the test finished, and computes its duration.
    ///
    /// Returns an error, leaving the record unchanged, if the test never started.
    pub fn record_finish(&mut self, at: DateTime<FixedOffset>) -> Result<(), TestRecordError> {
        let started_at = self.started_at.ok_or_else(|| TestRecordError::NotStarted {
            test: self.name.clone(),
        })?;
        self.finished_at = Some(at);
        self.duration_millis = Some((at - started_at).num_milliseconds());
        Ok(())
    }

    /// Marks the test as failed, replacing any earlier failure detail.
    pub fn record_failure(&mut self, detail: FailureDetail) {
        self.outcome = TestOutcome::Failure(detail);
    }

    /// Marks the test as skipped.
    pub fn record_skip(&mut self) {
        self.skipped = Some(true);
    }

    /// Sets the gist of what the test verifies. Blank gists are stored as absent.
    pub fn set_gist(&mut self, gist: Option<&str>) {
        self.gist = gist
            .filter(|gist| !gist.trim().is_empty())
            .map(str::to_owned);
    }

    /// Merges an update for the same test into this record, returning the result.
    ///
    /// Only a failure transition is absorbed from `incoming`; see [`TestOutcome::merge`].
    pub fn merge(mut self, incoming: TestRecord) -> TestRecord {
        self.absorb(incoming);
        self
    }

    /// In-place form of [`Self::merge`].
    pub(super) fn absorb(&mut self, incoming: TestRecord) {
        debug_assert_eq!(self.name, incoming.name, "merged records must share a name");
        let current = std::mem::take(&mut self.outcome);
        self.outcome = current.merge(incoming.outcome);
    }

    /// Returns the requirements this test declares, as (identifier, gist) pairs in declaration
    /// order.
    pub fn declared_requirements(
        &self,
        source: &dyn RequirementSource,
    ) -> Result<Vec<DeclaredRequirement>, IntrospectionError> {
        let declarations = source.declarations(&self.name)?;
        Ok(flatten_declarations(&declarations))
    }
}

impl PartialEq for TestRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TestRecord {}

impl Hash for TestRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
