// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Requirement declarations, and the sources they are read from.
//!
//! A test declares the requirements it verifies through one or more [`Declaration`]s. Each
//! declaration names one or more requirements and optionally carries a gist: a short description
//! of what the test checks.
//!
//! How declarations are attached to tests is up to the caller. Anything implementing
//! [`RequirementSource`] can be used, including closures. [`RequirementRegistry`] is an explicit
//! in-memory registry that can be populated by hand or from the `[[declare]]` tables of the reqa
//! config.

use crate::{
    errors::IntrospectionError,
    session::{RequirementId, TestName},
};
use indexmap::IndexMap;

/// One requirement declaration on a test: the requirements it verifies, and an optional gist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    verifies: Vec<RequirementId>,
    gist: Option<String>,
}

impl Declaration {
    /// Creates a new declaration for the given requirement identifiers.
    pub fn new<I>(verifies: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RequirementId>,
    {
        Self {
            verifies: verifies.into_iter().map(Into::into).collect(),
            gist: None,
        }
    }

    /// Sets the gist of this declaration.
    pub fn with_gist(mut self, gist: impl Into<String>) -> Self {
        self.gist = Some(gist.into());
        self
    }

    /// Returns the requirements this declaration names.
    pub fn verifies(&self) -> &[RequirementId] {
        &self.verifies
    }

    /// Returns the gist of this declaration.
    pub fn gist(&self) -> Option<&str> {
        self.gist.as_deref()
    }
}

/// A single requirement declared by a test, with the gist of the declaration it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclaredRequirement {
    /// The requirement identifier.
    pub id: RequirementId,

    /// The gist of the declaration, if any.
    pub gist: Option<String>,
}

/// Flattens declarations into (identifier, gist) pairs, in declaration order.
pub(crate) fn flatten_declarations(declarations: &[Declaration]) -> Vec<DeclaredRequirement> {
    declarations
        .iter()
        .flat_map(|declaration| {
            declaration.verifies.iter().map(|id| DeclaredRequirement {
                id: id.clone(),
                gist: declaration.gist.clone(),
            })
        })
        .collect()
}

/// Maps a test to the requirement declarations attached to it.
pub trait RequirementSource {
    /// Returns the declarations for `test`, in declaration order.
    ///
    /// A test with no declarations returns an empty list. An error means the declarations could
    /// not be determined.
    fn declarations(&self, test: &TestName) -> Result<Vec<Declaration>, IntrospectionError>;
}

impl<F> RequirementSource for F
where
    F: Fn(&TestName) -> Result<Vec<Declaration>, IntrospectionError>,
{
    fn declarations(&self, test: &TestName) -> Result<Vec<Declaration>, IntrospectionError> {
        (self)(test)
    }
}

/// An explicit registry of tests and their requirement declarations.
#[derive(Clone, Debug, Default)]
pub struct RequirementRegistry {
    tests: IndexMap<TestName, Vec<Declaration>>,
}

impl RequirementRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a test without adding any declarations to it.
    ///
    /// Registered tests are known to the registry: they are discovered, and looking up their
    /// declarations succeeds.
    pub fn register_test(&mut self, test: TestName) -> &mut Self {
        self.tests.entry(test).or_default();
        self
    }

    /// Adds a declaration to a test, registering the test if necessary.
    pub fn declare(&mut self, test: TestName, declaration: Declaration) -> &mut Self {
        self.tests.entry(test).or_default().push(declaration);
        self
    }

    /// Returns all registered tests along with their declarations, in registration order.
    pub fn tests(&self) -> impl ExactSizeIterator<Item = (&TestName, &[Declaration])> + '_ {
        self.tests
            .iter()
            .map(|(test, declarations)| (test, declarations.as_slice()))
    }

    /// Returns the number of registered tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true if no tests are registered.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

impl RequirementSource for RequirementRegistry {
    fn declarations(&self, test: &TestName) -> Result<Vec<Declaration>, IntrospectionError> {
        self.tests
            .get(test)
            .cloned()
            .ok_or_else(|| IntrospectionError::UnknownTest { test: test.clone() })
    }
}
