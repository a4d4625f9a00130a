// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::Presenter;
use crate::{errors::PresentError, session::Session};
use atomicwrites::{AllowOverwrite, AtomicFile};
use camino::{Utf8Path, Utf8PathBuf};
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use std::time::Duration;
use tracing::debug;

/// The report name used by [`JunitPresenter`] unless another one is set.
pub const DEFAULT_JUNIT_REPORT_NAME: &str = "reqa";

/// Writes the session as a JUnit XML report: one test suite per requirement, and one test case
/// per test that verifies it.
#[derive(Clone, Debug)]
pub struct JunitPresenter {
    path: Utf8PathBuf,
    report_name: String,
}

impl JunitPresenter {
    /// Creates a new JUnit presenter writing to `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            report_name: DEFAULT_JUNIT_REPORT_NAME.to_owned(),
        }
    }

    /// Sets the name of the report.
    pub fn with_report_name(mut self, report_name: impl Into<String>) -> Self {
        self.report_name = report_name.into();
        self
    }

    /// Returns the path the report is written to.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Presenter for JunitPresenter {
    type Output = Report;

    fn name(&self) -> &'static str {
        "junit"
    }

    fn create_result(&self, session: &Session) -> Result<Report, PresentError> {
        let mut report = Report::new(self.report_name.as_str());
        if let Some(start) = session.start() {
            report.set_timestamp(start);
        }
        if let (Some(start), Some(end)) = (session.start(), session.end()) {
            report.set_time((end - start).to_std().unwrap_or_default());
        }

        report.add_test_suites(session.requirements().map(|view| {
            let mut suite = TestSuite::new(view.id().as_str());
            for test in view.tests() {
                let status = match test.failure() {
                    None => TestCaseStatus::success(),
                    Some(detail) => {
                        let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
                        status.set_message(detail.message());
                        if let Some(trace) = detail.trace() {
                            status.set_description(trace);
                        }
                        status
                    }
                };

                let mut testcase = TestCase::new(test.name().name(), status);
                testcase.set_classname(test.name().owner());
                if let Some(started_at) = test.started_at() {
                    testcase.set_timestamp(started_at);
                }
                if let Some(millis) = test.duration_millis() {
                    testcase.set_time(Duration::from_millis(millis.max(0).unsigned_abs()));
                }
                suite.add_test_case(testcase);
            }
            suite
        }));

        Ok(report)
    }

    fn present_result(&mut self, result: Report) -> Result<(), PresentError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|error| PresentError::Fs {
                file: dir.to_owned(),
                error,
            })?;
        }

        AtomicFile::new(&self.path, AllowOverwrite)
            .write(|f| result.serialize(f))
            .map_err(|error| PresentError::Junit {
                file: self.path.clone(),
                error: Box::new(error),
            })?;
        debug!("wrote JUnit report to {}", self.path);
        Ok(())
    }
}
