// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::Presenter;
use crate::{
    errors::PresentError,
    helpers::escape_html,
    session::Session,
    time::format_timestamp,
};
use atomicwrites::{AllowOverwrite, AtomicFile};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;
use swrite::{SWrite, swrite, swriteln};
use tracing::debug;

/// The title used by [`HtmlPresenter`] unless another one is set.
pub const DEFAULT_HTML_TITLE: &str = "Requirement Quality Assurance report";

/// Writes a standalone HTML report of the session to a file.
#[derive(Clone, Debug)]
pub struct HtmlPresenter {
    path: Utf8PathBuf,
    title: String,
}

impl HtmlPresenter {
    /// Creates a new HTML presenter writing to `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            title: DEFAULT_HTML_TITLE.to_owned(),
        }
    }

    /// Sets the report title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Returns the path the report is written to.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Presenter for HtmlPresenter {
    type Output = String;

    fn name(&self) -> &'static str {
        "html"
    }

    fn create_result(&self, session: &Session) -> Result<String, PresentError> {
        let title = escape_html(&self.title);
        let mut out = String::new();
        swriteln!(out, "<!DOCTYPE html>");
        swriteln!(out, "<html>");
        swriteln!(
            out,
            "<head><meta charset=\"utf-8\"><title>{title}</title></head>"
        );
        swriteln!(out, "<body>");
        swriteln!(out, "<h1>{title}</h1>");
        match session.end() {
            Some(end) => swriteln!(out, "<p><b>{}</b></p>", format_timestamp(&end)),
            None => swriteln!(out, "<p><b>run did not finish</b></p>"),
        }
        swriteln!(
            out,
            "<p>Requirement count: {}</p>",
            session.requirement_count()
        );
        swriteln!(out, "<p>Test count: {}</p>", session.test_count());

        if session.requirement_count() > 0 {
            swriteln!(out, "<h2>Requirements</h2>");
            for view in session.requirements() {
                swriteln!(out, "<h4>{}</h4>", escape_html(view.id().as_str()));
                swriteln!(
                    out,
                    "<p>{}</p>",
                    if view.is_verified() {
                        "Successful"
                    } else {
                        "Failure"
                    }
                );
                match view.duration_millis() {
                    Ok(millis) => swriteln!(out, "<p>Duration: {millis} ms</p>"),
                    Err(_) => swriteln!(out, "<p>Duration: unknown</p>"),
                }
                swriteln!(out, "<ul>");
                for test in view.tests() {
                    swrite!(out, "<li>{}: ", escape_html(&test.name().to_string()));
                    swrite!(
                        out,
                        "<b>{}</b>",
                        if test.is_success() { "Success" } else { "Failed" }
                    );
                    if let Some(gist) = test.gist() {
                        swrite!(out, " ({})", escape_html(gist));
                    }
                    swriteln!(out, "</li>");
                }
                swriteln!(out, "</ul>");
            }
        }

        swriteln!(out, "</body>");
        swriteln!(out, "</html>");
        Ok(out)
    }

    fn present_result(&mut self, result: String) -> Result<(), PresentError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|error| PresentError::Fs {
                file: dir.to_owned(),
                error,
            })?;
        }
        AtomicFile::new(&self.path, AllowOverwrite)
            .write(|f| f.write_all(result.as_bytes()))
            .map_err(|error| PresentError::Write {
                file: self.path.clone(),
                error,
            })?;
        debug!("wrote HTML report to {}", self.path);
        Ok(())
    }
}
