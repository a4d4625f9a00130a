// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Present the results of a finished run.
//!
//! A [`Presenter`] turns a finished [`Session`] into a result value, then emits it. Presenters are
//! registered with a [`RunListener`](crate::listener::RunListener) through [`PresenterObserver`],
//! and run once requirement records have been computed.
//!
//! Several presenters are provided: [`JsonPresenter`], [`HtmlPresenter`], [`HistoryPresenter`]
//! and [`JunitPresenter`].

mod history;
mod html;
mod json;
mod junit;

pub use history::*;
pub use html::*;
pub use json::*;
pub use junit::*;

use crate::{
    errors::PresentError,
    listener::{RunObserver, RunResult},
    session::Session,
};

/// Creates a result from a finished session, and emits it.
///
/// Presenters never mutate the session.
pub trait Presenter {
    /// The value created from the session.
    type Output;

    /// A short name for this presenter, used in logs.
    fn name(&self) -> &'static str;

    /// Creates the result from the session.
    fn create_result(&self, session: &Session) -> Result<Self::Output, PresentError>;

    /// Emits a result created by [`Self::create_result`].
    fn present_result(&mut self, result: Self::Output) -> Result<(), PresentError>;

    /// Creates a result from the session and emits it.
    fn present(&mut self, session: &Session) -> Result<(), PresentError> {
        let result = self.create_result(session)?;
        self.present_result(result)
    }
}

/// Adapts a [`Presenter`] into a [`RunObserver`] that presents the session when the run finishes.
#[derive(Clone, Debug)]
pub struct PresenterObserver<P> {
    presenter: P,
}

impl<P: Presenter> PresenterObserver<P> {
    /// Wraps a presenter.
    pub fn new(presenter: P) -> Self {
        Self { presenter }
    }

    /// Returns the wrapped presenter.
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Consumes the observer, returning the presenter.
    pub fn into_inner(self) -> P {
        self.presenter
    }
}

impl<P: Presenter> RunObserver for PresenterObserver<P> {
    fn name(&self) -> &str {
        self.presenter.name()
    }

    fn run_finished(&mut self, session: &Session, _result: &RunResult) -> Result<(), PresentError> {
        self.presenter.present(session)
    }
}
