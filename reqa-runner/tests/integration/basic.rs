// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino_tempfile::Utf8TempDir;
use camino_tempfile_ext::prelude::*;
use color_eyre::eyre::{Result, ensure};
use indoc::indoc;
use pretty_assertions::assert_eq;
use reqa_runner::{
    config::ReqaConfig,
    discovery::DiscoveryScope,
    presenter::{HistoryFile, HistoryPresenter, HtmlPresenter, JunitPresenter},
    session::Session,
    tester::RequirementTester,
};

fn requirement_status(session: &Session) -> Vec<(String, bool, Vec<String>)> {
    session
        .requirements()
        .map(|view| {
            (
                view.id().to_string(),
                view.is_verified(),
                view.tests().map(|test| test.name().to_string()).collect(),
            )
        })
        .collect()
}

#[test]
fn test_run_verifies_requirements() -> Result<()> {
    let registry = fixture_registry(CALCULATOR_TESTS);
    let clock = SteppingClock::default();
    let mut tester = RequirementTester::new(&registry, &registry).with_clock(&clock);
    let mut engine = FixtureEngine::new(CALCULATOR_TESTS);

    let session = tester.run(&mut engine)?;

    assert_eq!(
        requirement_status(&session),
        vec![
            (
                "CALC-ADD".to_owned(),
                true,
                vec![
                    "calc::tests::addition".to_owned(),
                    "calc::tests::addition_overflow".to_owned()
                ]
            ),
            (
                "CALC-OVERFLOW".to_owned(),
                true,
                vec!["calc::tests::addition_overflow".to_owned()]
            ),
            (
                "CALC-SUB".to_owned(),
                false,
                vec!["calc::tests::subtraction".to_owned()]
            ),
            (
                "CALC-PARSE".to_owned(),
                true,
                vec!["calc::parser::tests::parses_literals".to_owned()]
            ),
        ]
    );
    assert_eq!(session.test_count(), CALCULATOR_TESTS.len());

    // Every read of the clock moves it forward by 10ms, and the run start is the first read.
    let add = session.requirement("CALC-ADD").expect("CALC-ADD is declared");
    assert_eq!(add.duration_millis()?, 20);
    let sub = session.requirement("CALC-SUB").expect("CALC-SUB is declared");
    assert_eq!(sub.duration_millis()?, 10);
    let sub_test = sub.tests().next().expect("CALC-SUB has a test");
    assert_eq!(sub_test.gist(), Some("Subtracting five from ten gives five."));
    ensure!(
        sub_test
            .failure()
            .is_some_and(|detail| detail.message().starts_with("assertion `left == right`")),
        "failure detail is kept"
    );

    let ignored = session
        .tests()
        .find(|test| test.name().name() == "slow_fuzz")
        .expect("ignored test is recorded");
    assert_eq!(ignored.is_skipped(), Some(true));
    assert_eq!(ignored.duration_millis(), None);

    Ok(())
}

#[test]
fn test_scoped_run() -> Result<()> {
    let registry = fixture_registry(CALCULATOR_TESTS);
    let mut tester = RequirementTester::new(&registry, &registry)
        .with_scope(DiscoveryScope::Package("calc::parser".to_owned()));
    let mut engine = FixtureEngine::new(CALCULATOR_TESTS);

    let session = tester.run(&mut engine)?;
    assert_eq!(session.test_count(), 2);
    assert_eq!(
        requirement_status(&session),
        vec![(
            "CALC-PARSE".to_owned(),
            true,
            vec!["calc::parser::tests::parses_literals".to_owned()]
        )]
    );
    Ok(())
}

#[test]
fn test_presenters_write_reports() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let registry = fixture_registry(CALCULATOR_TESTS);
    let clock = SteppingClock::default();
    let mut tester = RequirementTester::new(&registry, &registry).with_clock(&clock);
    tester
        .add_presenter(HtmlPresenter::new(dir.path().join("out/report.html")))
        .add_presenter(JunitPresenter::new(dir.path().join("out/requirements.xml")))
        .add_presenter(HistoryPresenter::new(dir.path().join("history.json")));
    let mut engine = FixtureEngine::new(CALCULATOR_TESTS);

    tester.run(&mut engine)?;

    let html = read_to_string(&dir.path().join("out/report.html"))?;
    ensure!(html.contains("<p>Requirement count: 4</p>"), "html: {html}");
    ensure!(html.contains("<p>Test count: 5</p>"), "html: {html}");
    ensure!(
        html.contains(indoc! {"
            <h4>CALC-SUB</h4>
            <p>Failure</p>
            <p>Duration: 10 ms</p>
        "}),
        "html: {html}"
    );

    let junit = read_to_string(&dir.path().join("out/requirements.xml"))?;
    ensure!(junit.contains(r#"<testsuite name="CALC-ADD""#), "junit: {junit}");
    ensure!(
        junit.contains(r#"classname="calc::parser::tests""#),
        "junit: {junit}"
    );

    // A second run adds to the history, newest first.
    tester.run(&mut engine)?;
    assert_eq!(engine.runs(), 2);
    let history = HistoryFile::new(dir.path().join("history.json")).load()?;
    assert_eq!(history.len(), 2);
    ensure!(
        history[0].session_start > history[1].session_start,
        "newest session comes first"
    );

    let restored = Session::from(history[0].clone());
    assert_eq!(restored.requirement_count(), 4);
    assert_eq!(restored.verified_count(), 3);
    Ok(())
}

#[test]
fn test_configured_tester() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    dir.child(ReqaConfig::CONFIG_PATH).write_str(indoc! {r#"
        [store]
        dir = "reqa-out"

        [presenters]
        enabled = ["json", "history", "html"]

        [[declare]]
        test = "calc::tests::addition"
        verifies = ["CALC-ADD"]

        [[declare]]
        test = "calc::tests::subtraction"
        verifies = ["CALC-SUB"]
        gist = "Subtracting five from ten gives five."
    "#})?;

    let config = ReqaConfig::from_sources(dir.path(), None)?;
    let registry = config.registry();
    let mut tester = RequirementTester::new(&registry, &registry);
    tester.add_configured_presenters(&config);
    let mut engine = FixtureEngine::new(CALCULATOR_TESTS);

    let session = tester.run(&mut engine)?;
    // Only calc::tests is discovered, but the engine runs every test it owns. The undeclared
    // addition_overflow test doesn't contribute to any requirement.
    assert_eq!(session.test_count(), 3);
    assert_eq!(session.requirement_count(), 2);
    assert_eq!(session.verified_count(), 1);

    ensure!(config.html_path().exists(), "HTML report was written");
    let history = config.history_file().load()?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].verifies.len(), 2);
    Ok(())
}
