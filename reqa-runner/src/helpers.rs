// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for reqa-runner.

use std::borrow::Cow;

/// Utilities for pluralizing various words based on count or plurality.
pub mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "requirement" if `count` is 1, otherwise "requirements".
    pub fn requirements_str(count: usize) -> &'static str {
        if count == 1 {
            "requirement"
        } else {
            "requirements"
        }
    }

    /// Returns "session" if `count` is 1, otherwise "sessions".
    pub fn sessions_str(count: usize) -> &'static str {
        if count == 1 { "session" } else { "sessions" }
    }

    /// Returns "owner" if `count` is 1, otherwise "owners".
    pub fn owners_str(count: usize) -> &'static str {
        if count == 1 { "owner" } else { "owners" }
    }
}

/// Escapes text for inclusion in HTML element content or a double-quoted attribute.
pub(crate) fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }

    let mut escaped = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}
