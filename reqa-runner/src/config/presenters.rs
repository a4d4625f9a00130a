// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use serde::Deserialize;
use std::fmt;

/// A kind of presenter that can be enabled through configuration.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresenterKind {
    /// Log each requirement as JSON.
    Json,

    /// Write an HTML report.
    Html,

    /// Append the session to the history file.
    History,

    /// Write a JUnit XML report.
    Junit,
}

impl fmt::Display for PresenterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenterKind::Json => write!(f, "json"),
            PresenterKind::Html => write!(f, "html"),
            PresenterKind::History => write!(f, "history"),
            PresenterKind::Junit => write!(f, "junit"),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct PresentersConfig {
    pub(super) enabled: Vec<PresenterKind>,
    pub(super) history: HistoryConfig,
    pub(super) html: HtmlConfig,
    pub(super) junit: JunitConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct HistoryConfig {
    pub(super) file: Utf8PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct HtmlConfig {
    pub(super) file: Utf8PathBuf,
    pub(super) title: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct JunitConfig {
    pub(super) file: Utf8PathBuf,
    pub(super) report_name: String,
}
