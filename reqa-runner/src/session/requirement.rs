// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{Session, TestName, TestRecord};
use crate::errors::RequirementDurationError;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{
    borrow::Borrow,
    fmt,
    hash::{Hash, Hasher},
};

/// An opaque identifier for a requirement, for example `MATH-1`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementId(SmolStr);

impl RequirementId {
    /// Creates a new `RequirementId`.
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RequirementId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequirementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RequirementId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// Aggregate verification status for one requirement.
///
/// A requirement is verified if and only if every test that declared it succeeded. A requirement
/// with no tests is vacuously verified.
///
/// Tests are stored by name; the [`Session`] owns the [`TestRecord`]s. Use [`RequirementView`] to
/// read a requirement's tests along with their records.
#[derive(Clone, Debug)]
pub struct RequirementRecord {
    id: RequirementId,
    verified: bool,
    tests: Vec<TestName>,
}

impl RequirementRecord {
    /// Creates a new requirement record with no tests.
    pub fn new(id: RequirementId) -> Self {
        Self {
            id,
            verified: true,
            tests: Vec::new(),
        }
    }

    pub(super) fn with_verified(id: RequirementId, verified: bool) -> Self {
        Self {
            id,
            verified,
            tests: Vec::new(),
        }
    }

    /// Returns the requirement identifier.
    pub fn id(&self) -> &RequirementId {
        &self.id
    }

    /// Returns true if every test added so far succeeded.
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    /// Returns the names of the tests that verify this requirement, in the order they were added.
    pub fn test_names(&self) -> &[TestName] {
        &self.tests
    }

    /// Returns true if a test with this name has already been added.
    pub fn contains_test(&self, name: &TestName) -> bool {
        self.tests.contains(name)
    }

    /// Adds a test to this requirement, folding its outcome into the verification status.
    ///
    /// Adding the same test twice is the caller's responsibility to avoid; see
    /// [`Self::contains_test`].
    pub fn add_test(&mut self, test: &TestRecord) {
        self.tests.push(test.name().clone());
        self.verified &= test.is_success();
    }

    pub(super) fn push_name(&mut self, name: TestName) {
        self.tests.push(name);
    }
}

impl PartialEq for RequirementRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RequirementRecord {}

impl Hash for RequirementRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A [`RequirementRecord`] together with the session that owns its tests.
#[derive(Clone, Copy, Debug)]
pub struct RequirementView<'a> {
    record: &'a RequirementRecord,
    session: &'a Session,
}

impl<'a> RequirementView<'a> {
    pub(super) fn new(record: &'a RequirementRecord, session: &'a Session) -> Self {
        Self { record, session }
    }

    /// Returns the requirement identifier.
    pub fn id(&self) -> &'a RequirementId {
        &self.record.id
    }

    /// Returns true if every test of this requirement succeeded.
    pub fn is_verified(&self) -> bool {
        self.record.verified
    }

    /// Returns the underlying record.
    pub fn record(&self) -> &'a RequirementRecord {
        self.record
    }

    /// Returns the test records of this requirement, in the order they were added.
    pub fn tests(&self) -> impl Iterator<Item = &'a TestRecord> + 'a {
        let session = self.session;
        self.record
            .tests
            .iter()
            .filter_map(move |name| session.test(name))
    }

    /// Returns the sum of the durations of this requirement's tests.
    ///
    /// Returns 0 if the requirement has no tests, and an error if any test has no recorded
    /// duration.
    pub fn duration_millis(&self) -> Result<i64, RequirementDurationError> {
        self.tests().try_fold(0i64, |total, test| {
            let duration = test.duration_millis().ok_or_else(|| {
                RequirementDurationError::new(self.record.id.clone(), test.name().clone())
            })?;
            Ok(total + duration)
        })
    }
}
