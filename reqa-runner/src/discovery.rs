// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovering the owners of tests to run.
//!
//! An owner is the module path a test function lives in, for example `math::tests`. Discovery
//! maps a [`DiscoveryScope`] to the ordered set of owners that contain at least one known test.

use crate::declare::RequirementRegistry;
use indexmap::IndexSet;
use smol_str::SmolStr;
use std::fmt;

/// The set of owners to discover.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiscoveryScope {
    /// All known owners.
    All,

    /// Owners at or below the given module path.
    Package(String),

    /// Owners at or below the module a call was made from.
    ///
    /// Usually created with [`caller_scope!`](crate::caller_scope).
    Caller(&'static str),
}

impl DiscoveryScope {
    /// Returns the module path this scope is restricted to, or `None` for [`Self::All`].
    pub fn module(&self) -> Option<&str> {
        match self {
            DiscoveryScope::All => None,
            DiscoveryScope::Package(module) => Some(module),
            DiscoveryScope::Caller(module) => Some(module),
        }
    }

    /// Returns true if the owner is within this scope.
    ///
    /// A module path matches itself and every module nested below it, but not modules that merely
    /// share a prefix: `math` matches `math` and `math::tests`, and not `mathematics`.
    pub fn matches(&self, owner: &str) -> bool {
        match self.module() {
            None | Some("") => true,
            Some(module) => match owner.strip_prefix(module) {
                Some(rest) => rest.is_empty() || rest.starts_with("::"),
                None => false,
            },
        }
    }
}

impl fmt::Display for DiscoveryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryScope::All => write!(f, "all owners"),
            DiscoveryScope::Package(module) => write!(f, "package `{module}`"),
            DiscoveryScope::Caller(module) => write!(f, "caller module `{module}`"),
        }
    }
}

/// Creates a [`DiscoveryScope::Caller`] for the module this macro is invoked in.
#[macro_export]
macro_rules! caller_scope {
    () => {
        $crate::discovery::DiscoveryScope::Caller(::core::module_path!())
    };
}

/// Finds the owners that contain tests.
pub trait TestDiscovery {
    /// Returns the owners within `scope` that contain at least one test, in a stable order.
    fn discover(&self, scope: &DiscoveryScope) -> IndexSet<SmolStr>;
}

impl TestDiscovery for RequirementRegistry {
    fn discover(&self, scope: &DiscoveryScope) -> IndexSet<SmolStr> {
        self.tests()
            .map(|(test, _)| test.owner())
            .filter(|owner| scope.matches(owner))
            .map(SmolStr::new)
            .collect()
    }
}
