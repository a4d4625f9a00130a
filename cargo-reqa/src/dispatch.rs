// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, ReqaExitCode, Result,
    output::{OutputContext, OutputOpts, OutputWriter, StdoutStyles},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use itertools::Itertools;
use owo_colors::OwoColorize;
use reqa_runner::{
    config::ReqaConfig,
    declare::RequirementRegistry,
    discovery::{DiscoveryScope, TestDiscovery},
    helpers::plural,
    presenter::{HtmlPresenter, JsonPresenter, JunitPresenter, Presenter},
    session::{Session, SessionSummary},
    time::format_timestamp,
};
use std::io::Write;
use swrite::{SWrite, swrite};
use tracing::{debug, info, warn};

/// Requirement traceability for Rust test runs.
///
/// This binary should typically be invoked as `cargo reqa` (in which case
/// this message will not be seen), not `cargo-reqa`.
#[derive(Debug, Parser)]
#[command(
    version,
    bin_name = "cargo",
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct CargoReqaApp {
    #[clap(subcommand)]
    subcommand: ReqaSubcommand,
}

impl CargoReqaApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        match &self.subcommand {
            ReqaSubcommand::Reqa(app) => app.output.init(),
        }
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.subcommand {
            ReqaSubcommand::Reqa(app) => app.exec(output, output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum ReqaSubcommand {
    /// Requirement traceability for Rust test runs.
    Reqa(Box<AppOpts>),
}

#[derive(Debug, Args)]
#[clap(version, display_name = "cargo-reqa")]
struct AppOpts {
    /// Workspace root [default: current directory]
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<Utf8PathBuf>,

    #[clap(flatten)]
    output: OutputOpts,

    #[clap(flatten)]
    config_opts: ConfigOpts,

    #[clap(subcommand)]
    command: Command,
}

impl AppOpts {
    fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let workspace_root = match self.root {
            Some(root) => root,
            None => current_dir()?,
        };
        let config = self.config_opts.make_config(&workspace_root)?;
        let styles = output.stdout_styles();

        match self.command {
            Command::History => {
                let sessions = config.history_file().load()?;
                if sessions.is_empty() {
                    info!("no sessions in history file {}", config.history_path());
                } else {
                    debug!(
                        "loaded {} {} from {}",
                        sessions.len(),
                        plural::sessions_str(sessions.len()),
                        config.history_path(),
                    );
                }
                let mut writer = output_writer.stdout_writer();
                write_history(&sessions, output.verbose, &styles, &mut writer)
                    .and_then(|()| writer.flush())
                    .map_err(ExpectedError::write_output_error)?;
            }
            Command::Present {
                session,
                format,
                output_file,
            } => {
                let session = load_session(&config, session)?;
                match format {
                    PresentFormat::Json => {
                        let results = JsonPresenter::new()
                            .create_result(&session)
                            .map_err(|err| ExpectedError::present_error("json", err))?;
                        let mut writer = output_writer.stdout_writer();
                        results
                            .iter()
                            .try_for_each(|json| writeln!(writer, "{json}"))
                            .and_then(|()| writer.flush())
                            .map_err(ExpectedError::write_output_error)?;
                    }
                    PresentFormat::Html => {
                        let mut presenter = match output_file {
                            Some(path) => HtmlPresenter::new(path).with_title(config.html_title()),
                            None => config.html_presenter(),
                        };
                        presenter
                            .present(&session)
                            .map_err(|err| ExpectedError::present_error("html", err))?;
                        info!("wrote HTML report to {}", presenter.path());
                    }
                    PresentFormat::Junit => {
                        let mut presenter = match output_file {
                            Some(path) => JunitPresenter::new(path)
                                .with_report_name(config.junit_report_name()),
                            None => config.junit_presenter(),
                        };
                        presenter
                            .present(&session)
                            .map_err(|err| ExpectedError::present_error("junit", err))?;
                        info!("wrote JUnit report to {}", presenter.path());
                    }
                }
            }
            Command::Declarations { package } => {
                let scope = match package {
                    Some(package) => DiscoveryScope::Package(package),
                    None => DiscoveryScope::All,
                };
                let registry = config.registry();
                if registry.is_empty() {
                    warn!(
                        "no [[declare]] tables found in config (add them to {})",
                        ReqaConfig::CONFIG_PATH
                    );
                }
                let mut writer = output_writer.stdout_writer();
                write_declarations(&registry, &scope, &styles, &mut writer)
                    .and_then(|()| writer.flush())
                    .map_err(ExpectedError::write_output_error)?;
            }
        }

        Ok(ReqaExitCode::OK)
    }
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Config file [default: workspace-root/.config/reqa.toml]
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    /// Creates a reqa config with the given options.
    fn make_config(&self, workspace_root: &Utf8Path) -> Result<ReqaConfig> {
        Ok(ReqaConfig::from_sources(
            workspace_root,
            self.config_file.as_deref(),
        )?)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List saved sessions, newest first
    ///
    /// Each line shows the session's index (for use with `present --session`), its start and end
    /// times, and how many of its requirements were verified.
    History,

    /// Present a saved session again
    ///
    /// JSON output is written to stdout. HTML and JUnit reports are written to the paths in the
    /// config, unless --output-file is passed in.
    Present {
        /// Index of the session to present, as listed by `history` (0 is the newest)
        #[arg(long, short, default_value_t = 0, value_name = "N")]
        session: usize,

        /// Output format
        #[arg(long, short = 'F', value_enum, default_value_t, value_name = "FMT")]
        format: PresentFormat,

        /// Write the report to this path instead of the configured one
        #[arg(long, short, value_name = "PATH")]
        output_file: Option<Utf8PathBuf>,
    },

    /// List owners in scope and the requirements their tests declare
    Declarations {
        /// Only list owners under this module path, e.g. `math::parser`
        #[arg(long, short, value_name = "PATH")]
        package: Option<String>,
    },
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum PresentFormat {
    /// Pretty-printed JSON, one object per requirement
    #[default]
    Json,
    /// A standalone HTML page
    Html,
    /// JUnit XML, one test suite per requirement
    Junit,
}

fn current_dir() -> Result<Utf8PathBuf> {
    let dir = std::env::current_dir().map_err(|err| ExpectedError::CurrentDirFailed { err })?;
    Utf8PathBuf::try_from(dir)
        .map_err(|err| ExpectedError::CurrentDirInvalidUtf8 {
            path: err.into_path_buf(),
        })
}

fn load_session(config: &ReqaConfig, index: usize) -> Result<Session> {
    let mut sessions = config.history_file().load()?;
    let count = sessions.len();
    if index >= count {
        return Err(ExpectedError::SessionNotFound {
            history_file: config.history_path(),
            index,
            count,
        });
    }
    Ok(Session::from(sessions.swap_remove(index)))
}

fn write_history(
    sessions: &[SessionSummary],
    verbose: bool,
    styles: &StdoutStyles,
    writer: &mut dyn Write,
) -> std::io::Result<()> {
    let index_width = sessions.len().saturating_sub(1).to_string().len();
    for (index, summary) in sessions.iter().enumerate() {
        let verified = summary
            .verifies
            .iter()
            .filter(|requirement| requirement.is_verified)
            .count();
        let total = summary.verifies.len();
        let status_style = if verified == total {
            styles.pass
        } else {
            styles.fail
        };

        let mut line = String::new();
        swrite!(
            line,
            "{:>index_width$}  {} .. {}  ",
            index.style(styles.bold),
            format_optional_timestamp(summary.session_start.as_ref()),
            format_optional_timestamp(summary.session_end.as_ref()),
        );
        swrite!(
            line,
            "{} {} verified, {} {}",
            format!("{verified}/{total}").style(status_style),
            plural::requirements_str(total),
            summary.tests.len().style(styles.count),
            plural::tests_str(summary.tests.len()),
        );
        writeln!(writer, "{line}")?;

        if verbose {
            for requirement in &summary.verifies {
                let (status, style) = if requirement.is_verified {
                    ("verified", styles.pass)
                } else {
                    ("not verified", styles.fail)
                };
                writeln!(
                    writer,
                    "    {}: {}",
                    requirement.id.style(styles.requirement),
                    status.style(style),
                )?;
            }
        }
    }
    Ok(())
}

fn format_optional_timestamp(
    timestamp: Option<&chrono::DateTime<chrono::FixedOffset>>,
) -> String {
    timestamp.map_or_else(|| "(unknown)".to_owned(), format_timestamp)
}

fn write_declarations(
    registry: &RequirementRegistry,
    scope: &DiscoveryScope,
    styles: &StdoutStyles,
    writer: &mut dyn Write,
) -> std::io::Result<()> {
    let owners = registry.discover(scope);
    if owners.is_empty() {
        warn!("no tests found in {scope}");
        return Ok(());
    }

    let mut test_count = 0;
    let mut requirements = Vec::new();
    for owner in &owners {
        writeln!(writer, "{}", owner.style(styles.bold))?;
        for (test, declarations) in registry
            .tests()
            .filter(|(test, _)| test.owner() == owner.as_str())
        {
            test_count += 1;
            let ids = declarations
                .iter()
                .flat_map(|declaration| declaration.verifies())
                .collect::<Vec<_>>();
            requirements.extend(ids.iter().map(|id| id.as_str()));

            let mut line = String::new();
            swrite!(line, "    {}: ", test.name());
            if ids.is_empty() {
                swrite!(line, "(no requirements)");
            } else {
                swrite!(
                    line,
                    "{}",
                    ids.iter()
                        .map(|&id| id.style(styles.requirement))
                        .join(", ")
                );
            }
            if let Some(gist) = declarations.iter().rev().find_map(|d| d.gist()) {
                swrite!(line, " ({gist})");
            }
            writeln!(writer, "{line}")?;
        }
    }

    let requirement_count = requirements.into_iter().unique().count();
    writeln!(
        writer,
        "{} {} in {} {}, declaring {} {}",
        test_count.style(styles.count),
        plural::tests_str(test_count),
        owners.len().style(styles.count),
        plural::owners_str(owners.len()),
        requirement_count.style(styles.count),
        plural::requirements_str(requirement_count),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Color;
    use camino_tempfile::Utf8TempDir;
    use camino_tempfile_ext::prelude::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    static CONFIG: &str = indoc! {r#"
        [[declare]]
        test = "math::tests::adds"
        verifies = ["MATH-ADD", "MATH-1"]
        gist = "Adding two and two gives four."

        [[declare]]
        test = "math::tests::subtracts"
        verifies = ["MATH-SUB"]

        [[declare]]
        test = "geo::tests::area"
        verifies = ["GEO-1", "MATH-1"]

        [[declare]]
        test = "geo::tests::helper"
    "#};

    static HISTORY: &str = indoc! {r#"
        [
          {
            "sessionStart": "2024-03-01T09:00:00:000+00:00",
            "sessionEnd": "2024-03-01T09:00:00:090+00:00",
            "verifies": [
              {
                "id": "MATH-ADD",
                "isVerified": true,
                "tests": [
                  {
                    "test": "math::tests::adds",
                    "startedAt": "2024-03-01T09:00:00:010+00:00",
                    "finishedAt": "2024-03-01T09:00:00:020+00:00",
                    "durationInMillis": 10,
                    "isSuccessful": true
                  }
                ],
                "durationInMillis": 10
              },
              {
                "id": "MATH-SUB",
                "isVerified": false,
                "tests": [
                  {
                    "test": "math::tests::subtracts",
                    "isSuccessful": false,
                    "failure": { "message": "assertion failed" }
                  }
                ]
              }
            ],
            "tests": [
              {
                "test": "math::tests::adds",
                "startedAt": "2024-03-01T09:00:00:010+00:00",
                "finishedAt": "2024-03-01T09:00:00:020+00:00",
                "durationInMillis": 10,
                "isSuccessful": true
              },
              {
                "test": "math::tests::subtracts",
                "isSuccessful": false,
                "failure": { "message": "assertion failed" }
              }
            ]
          },
          {
            "sessionStart": "2024-02-29T09:00:00:000+00:00",
            "verifies": [],
            "tests": []
          }
        ]
    "#};

    fn workspace() -> Utf8TempDir {
        let dir = Utf8TempDir::new().unwrap();
        dir.child(ReqaConfig::CONFIG_PATH).write_str(CONFIG).unwrap();
        dir.child("target/reqa/history.json")
            .write_str(HISTORY)
            .unwrap();
        dir
    }

    fn run(dir: &Utf8TempDir, args: &[&str]) -> Result<String> {
        let mut cli_args = vec!["cargo", "reqa", "--root", dir.path().as_str()];
        cli_args.extend_from_slice(args);
        let app = CargoReqaApp::try_parse_from(cli_args).unwrap();
        let output = OutputContext {
            verbose: false,
            color: Color::Never,
        };

        let mut output_writer = OutputWriter::Test { stdout: Vec::new() };
        let code = app.exec(output, &mut output_writer)?;
        assert_eq!(code, ReqaExitCode::OK);
        match output_writer {
            OutputWriter::Test { stdout } => Ok(String::from_utf8(stdout).unwrap()),
            OutputWriter::Normal => unreachable!("test writer was passed in"),
        }
    }

    #[test]
    fn history_lists_sessions() {
        let dir = workspace();
        let stdout = run(&dir, &["history"]).unwrap();
        assert_eq!(
            stdout,
            indoc! {"
                0  2024-03-01T09:00:00:000+00:00 .. 2024-03-01T09:00:00:090+00:00  1/2 requirements verified, 2 tests
                1  2024-02-29T09:00:00:000+00:00 .. (unknown)  0/0 requirements verified, 0 tests
            "}
        );
    }

    #[test]
    fn verbose_history_lists_requirements() {
        let dir = workspace();
        let sessions = ReqaConfig::from_sources(dir.path(), None)
            .unwrap()
            .history_file()
            .load()
            .unwrap();

        let mut out = Vec::new();
        write_history(&sessions[..1], true, &StdoutStyles::default(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            indoc! {"
                0  2024-03-01T09:00:00:000+00:00 .. 2024-03-01T09:00:00:090+00:00  1/2 requirements verified, 2 tests
                    MATH-ADD: verified
                    MATH-SUB: not verified
            "}
        );
    }

    #[test]
    fn history_without_file_is_empty() {
        let dir = Utf8TempDir::new().unwrap();
        let stdout = run(&dir, &["history"]).unwrap();
        assert_eq!(stdout, "");
    }

    #[test]
    fn present_json_prints_requirements() {
        let dir = workspace();
        let stdout = run(&dir, &["present", "--format", "json"]).unwrap();
        assert!(stdout.contains(r#""id": "MATH-ADD""#), "stdout: {stdout}");
        assert!(stdout.contains(r#""isVerified": false"#), "stdout: {stdout}");
    }

    #[test]
    fn present_html_writes_report() {
        let dir = workspace();
        let path = dir.path().join("out/report.html");
        let stdout = run(
            &dir,
            &["present", "--format", "html", "--output-file", path.as_str()],
        )
        .unwrap();
        assert_eq!(stdout, "", "HTML isn't written to stdout");

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("<h4>MATH-SUB</h4>\n<p>Failure</p>"), "html: {html}");
    }

    #[test]
    fn present_missing_session_is_an_error() {
        let dir = workspace();
        let error = run(&dir, &["present", "--session", "2"]).unwrap_err();
        assert!(
            matches!(
                error,
                ExpectedError::SessionNotFound {
                    index: 2,
                    count: 2,
                    ..
                }
            ),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn declarations_lists_owners() {
        let dir = workspace();
        let stdout = run(&dir, &["declarations"]).unwrap();
        assert_eq!(
            stdout,
            indoc! {"
                math::tests
                    adds: MATH-ADD, MATH-1 (Adding two and two gives four.)
                    subtracts: MATH-SUB
                geo::tests
                    area: GEO-1, MATH-1
                    helper: (no requirements)
                4 tests in 2 owners, declaring 4 requirements
            "}
        );

        let stdout = run(&dir, &["declarations", "--package", "geo"]).unwrap();
        assert_eq!(
            stdout,
            indoc! {"
                geo::tests
                    area: GEO-1, MATH-1
                    helper: (no requirements)
                2 tests in 1 owner, declaring 2 requirements
            "}
        );
    }
}
