// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by reqa.

use crate::{
    listener::RunState,
    session::{RequirementId, TestName},
};
use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use std::{error, fmt};
use thiserror::Error;

/// Displays an error along with its chain of causes, one per line.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: error::Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain` wrapping `error`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut source = self.error.source();
        if source.is_some() {
            write!(f, "\ncaused by:")?;
        }
        while let Some(cause) = source {
            write!(f, "\n  - {cause}")?;
            source = cause.source();
        }

        Ok(())
    }
}

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse reqa config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// A precondition on a [`TestRecord`](crate::session::TestRecord) was violated.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestRecordError {
    /// The test was reported as finished, but it was never reported as started.
    #[error("test `{test}` finished without having started")]
    NotStarted {
        /// The test that finished.
        test: TestName,
    },
}

/// The total duration of a requirement was requested, but one of its tests has no duration.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("requirement `{requirement}` includes test `{test}`, which has no recorded duration")]
pub struct RequirementDurationError {
    requirement: RequirementId,
    test: TestName,
}

impl RequirementDurationError {
    pub(crate) fn new(requirement: RequirementId, test: TestName) -> Self {
        Self { requirement, test }
    }

    /// Returns the requirement whose duration was requested.
    pub fn requirement(&self) -> &RequirementId {
        &self.requirement
    }

    /// Returns the test that has no recorded duration.
    pub fn test(&self) -> &TestName {
        &self.test
    }
}

/// Requirement declarations for a test could not be determined.
///
/// Sessions recover from this error: the test is treated as declaring no requirements.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum IntrospectionError {
    /// The test is not known to the declaration source.
    #[error("test `{test}` is not known to the requirement registry")]
    UnknownTest {
        /// The test that was looked up.
        test: TestName,
    },

    /// The declaration source failed for another reason.
    #[error("failed to read requirement declarations for `{test}`: {message}")]
    Other {
        /// The test that was looked up.
        test: TestName,

        /// A description of the failure.
        message: String,
    },
}

/// An error that occurred while dispatching a lifecycle event.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DispatchError {
    /// The event isn't valid in the current state of the run.
    #[error("received `{event}` while the run is {state}")]
    InvalidTransition {
        /// The name of the event.
        event: &'static str,

        /// The state the run was in.
        state: RunState,
    },

    /// Updating the session's test record failed.
    #[error("error updating test record")]
    Record(#[from] TestRecordError),
}

/// An error that occurred while reading or writing the session history file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    /// An error occurred while reading the history file.
    #[error("error reading history file `{file}`")]
    Read {
        /// The history file.
        file: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// The history file's contents could not be parsed.
    #[error("error parsing history file `{file}`")]
    Parse {
        /// The history file.
        file: Utf8PathBuf,

        /// The underlying JSON error.
        #[source]
        error: serde_json::Error,
    },

    /// The session history could not be serialized.
    #[error("error serializing session history for `{file}`")]
    Serialize {
        /// The history file.
        file: Utf8PathBuf,

        /// The underlying JSON error.
        #[source]
        error: serde_json::Error,
    },

    /// An error occurred while creating the directory containing the history file.
    #[error("error creating directory `{dir}`")]
    CreateDir {
        /// The directory being created.
        dir: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// An error occurred while writing the history file.
    #[error("error writing history file `{file}`")]
    Write {
        /// The history file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: atomicwrites::Error<std::io::Error>,
    },
}

/// An error that occurred while a presenter emitted its result.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PresentError {
    /// An error occurred while operating on the file system.
    #[error("error operating on path {file}")]
    Fs {
        /// The file being operated on.
        file: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// An error occurred while atomically writing a report.
    #[error("error writing report to {file}")]
    Write {
        /// The report file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: atomicwrites::Error<std::io::Error>,
    },

    /// An error occurred while serializing a requirement to JSON.
    #[error("error serializing requirement `{requirement}` to JSON")]
    Json {
        /// The requirement being serialized.
        requirement: RequirementId,

        /// The underlying JSON error.
        #[source]
        error: serde_json::Error,
    },

    /// An error occurred while saving the session to the history file.
    #[error("error saving session history")]
    History(#[from] HistoryError),

    /// An error occurred while producing JUnit XML.
    #[error("error writing JUnit output to {file}")]
    Junit {
        /// The output file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: Box<dyn error::Error + Send + Sync>,
    },
}

/// An error returned by a [`TestEngine`](crate::tester::TestEngine) while running tests.
#[derive(Debug, Error)]
#[error("test engine failed: {message}")]
pub struct EngineError {
    message: String,
    #[source]
    source: Option<Box<dyn error::Error + Send + Sync>>,
}

impl EngineError {
    /// Creates a new `EngineError` with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `EngineError` with a message and an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// An error that occurred during a run started by a
/// [`RequirementTester`](crate::tester::RequirementTester).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    /// The test engine reported an error.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The test engine delivered an invalid lifecycle event.
    #[error("error dispatching test event")]
    Dispatch(#[from] DispatchError),

    /// The test engine returned without reporting that the run finished.
    #[error("test engine returned while the run was {state}")]
    Incomplete {
        /// The state the run was left in.
        state: RunState,
    },
}
