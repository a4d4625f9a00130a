// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::Presenter;
use crate::{
    errors::{HistoryError, PresentError},
    helpers::plural,
    session::{Session, SessionSummary},
};
use camino::{Utf8Path, Utf8PathBuf};
use std::{io, io::Write};
use tracing::debug;

/// A JSON file holding the summaries of previous sessions, newest first.
#[derive(Clone, Debug)]
pub struct HistoryFile {
    path: Utf8PathBuf,
}

impl HistoryFile {
    /// Creates a new `HistoryFile` at `path`. The file doesn't need to exist.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the history file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Reads all saved sessions, newest first.
    ///
    /// A missing or blank file is an empty history.
    pub fn load(&self) -> Result<Vec<SessionSummary>, HistoryError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => {
                return Err(HistoryError::Read {
                    file: self.path.clone(),
                    error,
                });
            }
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|error| HistoryError::Parse {
            file: self.path.clone(),
            error,
        })
    }

    /// Saves a session ahead of all previously saved sessions, and returns the new history.
    pub fn append(&self, summary: SessionSummary) -> Result<Vec<SessionSummary>, HistoryError> {
        let mut sessions = vec![summary];
        sessions.extend(self.load()?);

        let json =
            serde_json::to_string_pretty(&sessions).map_err(|error| HistoryError::Serialize {
                file: self.path.clone(),
                error,
            })?;

        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|error| HistoryError::CreateDir {
                dir: dir.to_owned(),
                error,
            })?;
        }
        atomicwrites::AtomicFile::new(&self.path, atomicwrites::AllowOverwrite)
            .write(|file| file.write_all(json.as_bytes()))
            .map_err(|error| HistoryError::Write {
                file: self.path.clone(),
                error,
            })?;

        debug!(
            "saved session to {} ({} {} in history)",
            self.path,
            sessions.len(),
            plural::sessions_str(sessions.len()),
        );
        Ok(sessions)
    }
}

/// Appends the session to a [`HistoryFile`].
#[derive(Clone, Debug)]
pub struct HistoryPresenter {
    file: HistoryFile,
}

impl HistoryPresenter {
    /// Creates a new history presenter saving to `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            file: HistoryFile::new(path),
        }
    }

    /// Returns the history file.
    pub fn file(&self) -> &HistoryFile {
        &self.file
    }
}

impl Presenter for HistoryPresenter {
    type Output = SessionSummary;

    fn name(&self) -> &'static str {
        "history"
    }

    fn create_result(&self, session: &Session) -> Result<SessionSummary, PresentError> {
        Ok(session.to_summary())
    }

    fn present_result(&mut self, result: SessionSummary) -> Result<(), PresentError> {
        self.file.append(result)?;
        Ok(())
    }
}
