// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    FailureDetail, RequirementId, RequirementRecord, RequirementView, Session, TestName,
    TestOutcome, TestRecord,
};
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The serialized form of a [`Session`], as stored in the history file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// The time the session started.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::time::serde_timestamp_opt"
    )]
    pub session_start: Option<DateTime<FixedOffset>>,

    /// The time the session ended.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::time::serde_timestamp_opt"
    )]
    pub session_end: Option<DateTime<FixedOffset>>,

    /// Requirement records, in aggregation order.
    #[serde(default)]
    pub verifies: Vec<RequirementSummary>,

    /// Test records, in insertion order.
    #[serde(default)]
    pub tests: Vec<TestSummary>,
}

/// The serialized form of a requirement record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementSummary {
    /// The requirement identifier.
    pub id: RequirementId,

    /// Whether every contributing test succeeded.
    pub is_verified: bool,

    /// The contributing tests, in the order they were attached.
    #[serde(default)]
    pub tests: Vec<TestSummary>,

    /// The total duration of the contributing tests.
    ///
    /// Absent if some contributing test has no recorded duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_in_millis: Option<i64>,
}

impl RequirementSummary {
    /// Builds the summary of a requirement.
    pub fn from_view(view: RequirementView<'_>) -> Self {
        Self {
            id: view.id().clone(),
            is_verified: view.is_verified(),
            tests: view.tests().map(TestSummary::from_record).collect(),
            duration_in_millis: view.duration_millis().ok(),
        }
    }
}

/// The serialized form of a test record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    /// The qualified test name.
    pub test: TestName,

    /// The gist of the last declaration processed for this test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gist: Option<String>,

    /// The time the test started.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::time::serde_timestamp_opt"
    )]
    pub started_at: Option<DateTime<FixedOffset>>,

    /// The time the test finished.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::time::serde_timestamp_opt"
    )]
    pub finished_at: Option<DateTime<FixedOffset>>,

    /// The duration of the test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_in_millis: Option<i64>,

    /// Whether the test succeeded.
    pub is_successful: bool,

    /// Whether the test was skipped, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_skipped: Option<bool>,

    /// The failure detail, if the test failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureDetail>,
}

impl TestSummary {
    /// Builds the summary of a test record.
    pub fn from_record(record: &TestRecord) -> Self {
        Self {
            test: record.name.clone(),
            gist: record.gist.clone(),
            started_at: record.started_at,
            finished_at: record.finished_at,
            duration_in_millis: record.duration_millis,
            is_successful: record.is_success(),
            is_skipped: record.skipped,
            failure: record.failure().cloned(),
        }
    }

    fn into_record(self) -> TestRecord {
        let outcome = match (self.is_successful, self.failure) {
            (true, _) => TestOutcome::Success,
            (false, detail) => TestOutcome::Failure(detail.unwrap_or_default()),
        };
        TestRecord {
            name: self.test,
            gist: self.gist,
            started_at: self.started_at,
            finished_at: self.finished_at,
            duration_millis: self.duration_in_millis,
            outcome,
            skipped: self.is_skipped,
        }
    }
}

impl Session {
    /// Returns the serializable summary of this session.
    pub fn to_summary(&self) -> SessionSummary {
        SessionSummary {
            session_start: self.start,
            session_end: self.end,
            verifies: self
                .requirements()
                .map(RequirementSummary::from_view)
                .collect(),
            tests: self.tests().map(TestSummary::from_record).collect(),
        }
    }
}

impl From<SessionSummary> for Session {
    /// Rebuilds a session from its summary.
    ///
    /// Requirement records keep their saved verified flag and test order. They are not recomputed.
    fn from(summary: SessionSummary) -> Self {
        let mut tests: IndexMap<TestName, TestRecord> = summary
            .tests
            .into_iter()
            .map(|test| (test.test.clone(), test.into_record()))
            .collect();

        let mut requirements = IndexMap::with_capacity(summary.verifies.len());
        for requirement in summary.verifies {
            let mut record =
                RequirementRecord::with_verified(requirement.id.clone(), requirement.is_verified);
            for test in requirement.tests {
                let name = test.test.clone();
                tests.entry(name.clone()).or_insert_with(|| test.into_record());
                record.push_name(name);
            }
            requirements.insert(requirement.id, record);
        }

        Session {
            start: summary.session_start,
            end: summary.session_end,
            tests,
            requirements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        declare::{Declaration, RequirementRegistry},
        test_helpers::{at_millis, test_name},
    };
    use pretty_assertions::assert_eq;

    fn finished_session() -> Session {
        let mut registry = RequirementRegistry::new();
        registry.declare(
            test_name("math::tests::adds"),
            Declaration::new(["MATH-ADD", "MATH-1"]).with_gist("adds two numbers"),
        );
        registry.declare(
            test_name("math::tests::subtracts"),
            Declaration::new(["MATH-1"]),
        );
        registry.register_test(test_name("math::tests::helper"));

        let mut session = Session::new();
        session.set_start(at_millis(0));
        session.test_started(test_name("math::tests::adds"), at_millis(10));
        session
            .test_finished(test_name("math::tests::adds"), at_millis(25))
            .unwrap();
        session.test_started(test_name("math::tests::subtracts"), at_millis(30));
        session.record_failure(
            test_name("math::tests::subtracts"),
            FailureDetail::new("assertion failed: 10 - 5 == 4").with_trace("at subtracts"),
        );
        session
            .test_finished(test_name("math::tests::subtracts"), at_millis(70))
            .unwrap();
        session.record_skip(test_name("math::tests::helper"));
        session.set_end(at_millis(80));
        session.verify(&registry);
        session
    }

    #[test]
    fn summary_round_trips_through_json() {
        let session = finished_session();
        let summary = session.to_summary();

        let json = serde_json::to_string_pretty(&summary).unwrap();
        let parsed: SessionSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);

        let restored = Session::from(parsed);
        assert_eq!(restored.to_summary(), summary);
        assert_eq!(restored.start(), Some(at_millis(0)));
        assert_eq!(restored.end(), Some(at_millis(80)));

        let math_1 = restored.requirement("MATH-1").expect("MATH-1 restored");
        assert!(!math_1.is_verified());
        assert_eq!(
            math_1.record().test_names(),
            &[
                test_name("math::tests::adds"),
                test_name("math::tests::subtracts")
            ]
        );
        assert_eq!(math_1.duration_millis(), Ok(55));

        let subtracts = restored
            .test(&test_name("math::tests::subtracts"))
            .expect("subtracts restored");
        assert_eq!(
            subtracts.failure().and_then(FailureDetail::trace),
            Some("at subtracts")
        );
    }

    #[test]
    fn summary_uses_camel_case_and_omits_absent_fields() {
        let summary = finished_session().to_summary();
        let value = serde_json::to_value(&summary).unwrap();

        assert!(value.get("sessionStart").is_some());
        let helper = &value["tests"][2];
        assert_eq!(helper["test"], "math::tests::helper");
        assert_eq!(helper["isSkipped"], true);
        assert_eq!(helper["isSuccessful"], true);
        assert!(helper.get("startedAt").is_none(), "absent fields are omitted");
        assert!(helper.get("gist").is_none());

        let adds = &value["verifies"][0]["tests"][0];
        assert_eq!(adds["gist"], "adds two numbers");
        assert_eq!(adds["durationInMillis"], 15);
    }

    #[test]
    fn saved_verification_is_not_recomputed() {
        let json = r#"{
            "sessionStart": "2014-06-01T12:30:00:250+02:00",
            "verifies": [
                {
                    "id": "R1",
                    "isVerified": false,
                    "tests": [{ "test": "a::T1", "isSuccessful": false }]
                }
            ],
            "tests": []
        }"#;
        let summary: SessionSummary = serde_json::from_str(json).unwrap();
        let session = Session::from(summary);

        assert_eq!(session.test_count(), 1, "embedded test is restored");
        let test = session.test(&test_name("a::T1")).unwrap();
        assert_eq!(test.failure(), Some(&FailureDetail::default()));
        assert!(!session.requirement("R1").unwrap().is_verified());
    }
}
