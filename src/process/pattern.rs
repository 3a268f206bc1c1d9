// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! What `wait_for_output` looks for.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// A condition on captured output.
///
/// ```
/// use regex::Regex;
/// use testbed_rs::process::Pattern;
///
/// assert!(Pattern::from("Listening").matches("Server Listening on 80"));
/// assert!(Pattern::from(Regex::new(r"port \d+").unwrap()).matches("port 8080"));
/// assert!(Pattern::predicate(|text| text.lines().count() >= 2).matches("a\nb\n"));
/// ```
#[derive(Clone)]
pub enum Pattern {
    /// Exact substring.
    Substring(String),
    /// Regular expression, unanchored.
    Regex(Regex),
    /// Arbitrary predicate over the text.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl Pattern {
    /// Wraps a closure as a pattern.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Tests `text` against this pattern.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Substring(needle) => text.contains(needle.as_str()),
            Self::Regex(re) => re.is_match(text),
            Self::Predicate(f) => f(text),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring(needle) => write!(f, "{needle:?}"),
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
            Self::Predicate(_) => f.write_str("<predicate>"),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({self})")
    }
}

impl From<&str> for Pattern {
    fn from(needle: &str) -> Self {
        Self::Substring(needle.to_string())
    }
}

impl From<String> for Pattern {
    fn from(needle: String) -> Self {
        Self::Substring(needle)
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

impl From<&Regex> for Pattern {
    fn from(re: &Regex) -> Self {
        Self::Regex(re.clone())
    }
}
