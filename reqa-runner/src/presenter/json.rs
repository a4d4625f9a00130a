// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::Presenter;
use crate::{
    errors::PresentError,
    session::{RequirementSummary, Session},
};
use tracing::info;

/// Logs each requirement record as a pretty-printed JSON object, at the `info` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonPresenter;

impl JsonPresenter {
    /// Creates a new JSON presenter.
    pub fn new() -> Self {
        Self
    }
}

impl Presenter for JsonPresenter {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "json"
    }

    fn create_result(&self, session: &Session) -> Result<Vec<String>, PresentError> {
        session
            .requirements()
            .map(|view| {
                serde_json::to_string_pretty(&RequirementSummary::from_view(view)).map_err(
                    |error| PresentError::Json {
                        requirement: view.id().clone(),
                        error,
                    },
                )
            })
            .collect()
    }

    fn present_result(&mut self, result: Vec<String>) -> Result<(), PresentError> {
        for json in result {
            info!("{json}");
        }
        Ok(())
    }
}
