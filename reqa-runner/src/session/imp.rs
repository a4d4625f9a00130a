// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{FailureDetail, RequirementId, RequirementRecord, RequirementView, TestName, TestRecord};
use crate::{
    declare::RequirementSource,
    errors::{DisplayErrorChain, TestRecordError},
    helpers::plural,
};
use chrono::{DateTime, FixedOffset};
use indexmap::{IndexMap, map::Entry};
use tracing::{debug, warn};

/// The state of one test run: its test records, and the requirement records derived from them.
///
/// A session is created fresh for every run. It is mutated while the run is in progress, then
/// finalized by a single call to [`Self::verify`] and handed to presenters read-only.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub(super) start: Option<DateTime<FixedOffset>>,
    pub(super) end: Option<DateTime<FixedOffset>>,
    pub(super) tests: IndexMap<TestName, TestRecord>,
    pub(super) requirements: IndexMap<RequirementId, RequirementRecord>,
}

impl Session {
    /// Creates a new, empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the time the session started.
    pub fn start(&self) -> Option<DateTime<FixedOffset>> {
        self.start
    }

    /// Returns the time the session ended.
    pub fn end(&self) -> Option<DateTime<FixedOffset>> {
        self.end
    }

    /// Sets the time the session started.
    pub fn set_start(&mut self, at: DateTime<FixedOffset>) {
        self.start = Some(at);
    }

    /// Sets the time the session ended.
    pub fn set_end(&mut self, at: DateTime<FixedOffset>) {
        self.end = Some(at);
    }

    /// Returns the test records in the order they were first seen.
    pub fn tests(&self) -> impl ExactSizeIterator<Item = &TestRecord> + '_ {
        self.tests.values()
    }

    /// Looks up a test record by name.
    pub fn test(&self, name: &TestName) -> Option<&TestRecord> {
        self.tests.get(name)
    }

    /// Returns the number of test records.
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    /// Returns the requirement records computed by the last [`Self::verify`] call, in the order
    /// they were first encountered.
    pub fn requirements(&self) -> impl ExactSizeIterator<Item = RequirementView<'_>> + '_ {
        self.requirements
            .values()
            .map(move |record| RequirementView::new(record, self))
    }

    /// Looks up a requirement record by identifier.
    pub fn requirement(&self, id: &str) -> Option<RequirementView<'_>> {
        self.requirements
            .get(id)
            .map(|record| RequirementView::new(record, self))
    }

    /// Returns the number of requirement records.
    pub fn requirement_count(&self) -> usize {
        self.requirements.len()
    }

    /// Returns the number of requirement records that are verified.
    pub fn verified_count(&self) -> usize {
        self.requirements
            .values()
            .filter(|record| record.is_verified())
            .count()
    }

    /// Inserts `update` if no record with its name exists, otherwise merges it into the existing
    /// record. Returns the stored record.
    pub fn add_or_update(&mut self, update: TestRecord) -> &mut TestRecord {
        match self.tests.entry(update.name().clone()) {
            Entry::Vacant(entry) => entry.insert(update),
            Entry::Occupied(entry) => {
                let record = entry.into_mut();
                record.absorb(update);
                record
            }
        }
    }

    /// Records that a test started.
    ///
    /// Also initializes the session start time, if it isn't set yet.
    pub fn test_started(&mut self, name: TestName, at: DateTime<FixedOffset>) {
        self.start.get_or_insert(at);
        self.add_or_update(TestRecord::new(name)).record_start(at);
    }

    /// Records that a test finished, and moves the session end time forward.
    pub fn test_finished(
        &mut self,
        name: TestName,
        at: DateTime<FixedOffset>,
    ) -> Result<(), TestRecordError> {
        self.add_or_update(TestRecord::new(name)).record_finish(at)?;
        self.end = Some(at);
        Ok(())
    }

    /// Records that a test failed.
    pub fn record_failure(&mut self, name: TestName, detail: FailureDetail) {
        self.add_or_update(TestRecord::failed(name, detail));
    }

    /// Records that a test was skipped. Skipped tests still count towards verification.
    pub fn record_skip(&mut self, name: TestName) {
        self.add_or_update(TestRecord::new(name)).record_skip();
    }

    /// Recomputes the requirement records from the current set of test records.
    ///
    /// Tests are visited in insertion order. Each requirement a test declares is located (or
    /// created), the test is attached to it, and the test's gist is set to the gist of that
    /// declaration. A test that declares several requirements keeps the gist of the last one.
    ///
    /// The previous requirement records are replaced, so calling this repeatedly without new test
    /// events yields the same result.
    pub fn verify(&mut self, source: &dyn RequirementSource) {
        let mut requirements: IndexMap<RequirementId, RequirementRecord> = IndexMap::new();

        for test in self.tests.values_mut() {
            let declared = match test.declared_requirements(source) {
                Ok(declared) => declared,
                Err(error) => {
                    warn!(
                        "treating `{}` as declaring no requirements: {}",
                        test.name(),
                        DisplayErrorChain::new(error),
                    );
                    continue;
                }
            };

            for declared in declared {
                let requirement = requirements
                    .entry(declared.id.clone())
                    .or_insert_with(|| RequirementRecord::new(declared.id));
                test.set_gist(declared.gist.as_deref());
                if !requirement.contains_test(test.name()) {
                    requirement.add_test(test);
                }
            }
        }

        self.requirements = requirements;
        debug!(
            "verified {} {} across {} {}",
            self.requirements.len(),
            plural::requirements_str(self.requirements.len()),
            self.tests.len(),
            plural::tests_str(self.tests.len()),
        );
    }
}
