// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use reqa_runner::errors::{ConfigParseError, HistoryError, PresentError};
use std::{error::Error, path::PathBuf};
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

/// Documented exit codes for `cargo reqa` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum ReqaExitCode {}

impl ReqaExitCode {
    /// No errors occurred and reqa exited normally.
    pub const OK: i32 = 0;

    /// A user issue happened while setting up a reqa invocation.
    pub const SETUP_ERROR: i32 = 96;

    /// The session history could not be read.
    pub const HISTORY_READ_FAILED: i32 = 107;

    /// The requested session is not in the history.
    pub const SESSION_NOT_FOUND: i32 = 108;

    /// A presenter failed to emit its result.
    pub const PRESENT_FAILED: i32 = 109;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected error that occurred while running `cargo reqa`.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine current directory")]
    CurrentDirFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 { path: PathBuf },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("history read error")]
    HistoryReadError {
        #[from]
        err: HistoryError,
    },
    #[error("session not found")]
    SessionNotFound {
        history_file: Utf8PathBuf,
        index: usize,
        count: usize,
    },
    #[error("present error")]
    PresentError {
        presenter: &'static str,
        #[source]
        err: PresentError,
    },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn present_error(presenter: &'static str, err: PresentError) -> Self {
        Self::PresentError { presenter, err }
    }

    pub(crate) fn write_output_error(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::ConfigParseError { .. } => ReqaExitCode::SETUP_ERROR,
            Self::HistoryReadError { .. } => ReqaExitCode::HISTORY_READ_FAILED,
            Self::SessionNotFound { .. } => ReqaExitCode::SESSION_NOT_FOUND,
            Self::PresentError { .. } => ReqaExitCode::PRESENT_FAILED,
            Self::WriteOutputError { .. } => ReqaExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::CurrentDirFailed { err } => {
                error!("could not determine current directory");
                Some(err as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { path } => {
                error!(
                    "current directory `{}` is not valid UTF-8 (pass in --root)",
                    path.display().style(styles.bold)
                );
                None
            }
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse reqa config at `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::HistoryReadError { err } => {
                error!("failed to read session history");
                Some(err as &dyn Error)
            }
            Self::SessionNotFound {
                history_file,
                index,
                count,
            } => {
                if *count == 0 {
                    error!(
                        "session {} not found: history file `{}` has no sessions",
                        index.style(styles.bold),
                        history_file.style(styles.bold),
                    );
                } else {
                    error!(
                        "session {} not found: history file `{}` has sessions 0 to {}",
                        index.style(styles.bold),
                        history_file.style(styles.bold),
                        (count - 1).style(styles.bold),
                    );
                }
                None
            }
            Self::PresentError { presenter, err } => {
                error!(
                    "{} presenter failed",
                    presenter.style(styles.warning_text)
                );
                Some(err as &dyn Error)
            }
            Self::WriteOutputError { err } => {
                error!("error writing output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
