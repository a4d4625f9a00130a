// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{PresenterKind, presenters::PresentersConfig};
use crate::{
    declare::{Declaration, RequirementRegistry},
    errors::{ConfigParseError, ConfigParseErrorKind},
    listener::RunObserver,
    presenter::{
        HistoryFile, HistoryPresenter, HtmlPresenter, JsonPresenter, JunitPresenter,
        PresenterObserver,
    },
    session::TestName,
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{
    Config, ConfigBuilder, ConfigError, File, FileFormat, FileSourceFile, builder::DefaultState,
};
use itertools::Itertools;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Overall configuration for reqa.
///
/// This is the root data structure for reqa configuration. Configuration is read from the
/// embedded defaults, overridden by the workspace's `.config/reqa.toml` or an explicitly passed in
/// file.
#[derive(Clone, Debug)]
pub struct ReqaConfig {
    workspace_root: Utf8PathBuf,
    inner: ReqaConfigDeserialize,
}

impl ReqaConfig {
    /// The default location of the config within the workspace: `.config/reqa.toml`.
    pub const CONFIG_PATH: &'static str = ".config/reqa.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Reads the reqa config from the given file, or if not specified from
    /// `.config/reqa.toml` in the workspace root.
    ///
    /// If the file isn't specified and `.config/reqa.toml` doesn't exist, uses the default
    /// config options. Unknown keys are reported as warnings.
    pub fn from_sources(
        workspace_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_impl(workspace_root, config_file, |config_file, unknown| {
            let mut unknown_str = String::new();
            if unknown.len() == 1 {
                // Print this on the same line.
                unknown_str.push(' ');
                unknown_str.push_str(unknown.iter().next().map_or("", String::as_str));
            } else {
                for ignored_key in unknown {
                    unknown_str.push('\n');
                    unknown_str.push_str("  - ");
                    unknown_str.push_str(ignored_key);
                }
            }

            warn!("ignoring unknown configuration keys in config file {config_file}:{unknown_str}")
        })
    }

    // A custom unknown_callback can be passed in while testing.
    fn from_sources_impl(
        workspace_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
        mut unknown_callback: impl FnMut(&Utf8Path, &BTreeSet<String>),
    ) -> Result<Self, ConfigParseError> {
        let workspace_root = workspace_root.into();
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = workspace_root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let inner = Self::read_from_source(&config_file, source, &mut unknown_callback)?;
        Ok(Self {
            workspace_root,
            inner,
        })
    }

    /// Returns the default reqa config.
    #[cfg(test)]
    pub(crate) fn default_config(workspace_root: impl Into<Utf8PathBuf>) -> Self {
        let (inner, unknown) = Self::build_and_deserialize_config(&Self::make_default_config())
            .expect("default config is always valid");

        // Make sure there aren't any unknown keys in the default config, since it is
        // embedded/shipped with this binary.
        if !unknown.is_empty() {
            panic!(
                "found unknown keys in default config: {}",
                unknown.iter().join(", ")
            );
        }

        Self {
            workspace_root: workspace_root.into(),
            inner,
        }
    }

    /// Returns the workspace root.
    pub fn workspace_root(&self) -> &Utf8Path {
        &self.workspace_root
    }

    /// Returns the directory reports and history are written to.
    pub fn store_dir(&self) -> Utf8PathBuf {
        self.workspace_root.join(&self.inner.store.dir)
    }

    /// Returns the enabled presenters, in the order they should run. Duplicates are removed.
    pub fn enabled_presenters(&self) -> Vec<PresenterKind> {
        self.inner.presenters.enabled.iter().copied().unique().collect()
    }

    /// Returns the path to the history file.
    pub fn history_path(&self) -> Utf8PathBuf {
        self.store_dir().join(&self.inner.presenters.history.file)
    }

    /// Returns the history file.
    pub fn history_file(&self) -> HistoryFile {
        HistoryFile::new(self.history_path())
    }

    /// Returns the path the HTML report is written to.
    pub fn html_path(&self) -> Utf8PathBuf {
        self.store_dir().join(&self.inner.presenters.html.file)
    }

    /// Returns the title of the HTML report.
    pub fn html_title(&self) -> &str {
        &self.inner.presenters.html.title
    }

    /// Returns the path the JUnit report is written to.
    pub fn junit_path(&self) -> Utf8PathBuf {
        self.store_dir().join(&self.inner.presenters.junit.file)
    }

    /// Returns the name of the JUnit report.
    pub fn junit_report_name(&self) -> &str {
        &self.inner.presenters.junit.report_name
    }

    /// Returns the JSON presenter.
    pub fn json_presenter(&self) -> JsonPresenter {
        JsonPresenter::new()
    }

    /// Returns the HTML presenter, as configured.
    pub fn html_presenter(&self) -> HtmlPresenter {
        HtmlPresenter::new(self.html_path()).with_title(self.html_title())
    }

    /// Returns the history presenter, as configured.
    pub fn history_presenter(&self) -> HistoryPresenter {
        HistoryPresenter::new(self.history_path())
    }

    /// Returns the JUnit presenter, as configured.
    pub fn junit_presenter(&self) -> JunitPresenter {
        JunitPresenter::new(self.junit_path()).with_report_name(self.junit_report_name())
    }

    /// Returns observers for every enabled presenter, in order.
    pub fn presenter_observers(&self) -> Vec<Box<dyn RunObserver>> {
        self.enabled_presenters()
            .into_iter()
            .map(|kind| -> Box<dyn RunObserver> {
                debug!("enabling {kind} presenter");
                match kind {
                    PresenterKind::Json => Box::new(PresenterObserver::new(self.json_presenter())),
                    PresenterKind::Html => Box::new(PresenterObserver::new(self.html_presenter())),
                    PresenterKind::History => {
                        Box::new(PresenterObserver::new(self.history_presenter()))
                    }
                    PresenterKind::Junit => {
                        Box::new(PresenterObserver::new(self.junit_presenter()))
                    }
                }
            })
            .collect()
    }

    /// Builds a requirement registry from the `[[declare]]` tables.
    pub fn registry(&self) -> RequirementRegistry {
        let mut registry = RequirementRegistry::new();
        for declare in &self.inner.declare {
            let test = TestName::parse(&declare.test);
            if declare.verifies.is_empty() {
                registry.register_test(test);
                continue;
            }

            let mut declaration = Declaration::new(declare.verifies.iter().map(String::as_str));
            if let Some(gist) = &declare.gist {
                declaration = declaration.with_gist(gist.as_str());
            }
            registry.declare(test, declaration);
        }
        registry
    }

    // ---
    // Helper methods
    // ---

    fn read_from_source(
        config_file: &Utf8Path,
        source: File<FileSourceFile, FileFormat>,
        unknown_callback: &mut impl FnMut(&Utf8Path, &BTreeSet<String>),
    ) -> Result<ReqaConfigDeserialize, ConfigParseError> {
        let builder = Self::make_default_config().add_source(source);
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(config_file, kind))?;

        if !unknown.is_empty() {
            unknown_callback(config_file, &unknown);
        }
        Ok(config)
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(ReqaConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: ReqaConfigDeserialize =
            serde_path_to_error::deserialize(ignored_de).map_err(|error| {
                // The config crate also reports the key. Drop it so the path is only shown once.
                let path = error.path().clone();
                let config_error = error.into_inner();
                let error = match config_error {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReqaConfigDeserialize {
    store: StoreConfig,
    presenters: PresentersConfig,
    #[serde(default)]
    declare: Vec<DeclareConfig>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct StoreConfig {
    dir: Utf8PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeclareConfig {
    test: String,
    #[serde(default)]
    verifies: Vec<String>,
    #[serde(default)]
    gist: Option<String>,
}
