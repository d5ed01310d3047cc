//! Owned failure records, detached from the tree for reporting

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tree::{NodeId, Tree};

/// Stack frames pointing into the test frameworks themselves
pub const DEFAULT_IGNORED_FRAMES: [&str; 2] = ["/js/test/libs/jasmine.js:", "/js/test/libs/qunit.js:"];

/// A failed assertion with the name of the test it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub num: u32,
    pub test: Option<String>,
    pub message: Option<String>,
    pub expected: Option<String>,
    pub got: Option<String>,
    pub matcher: Option<String>,
    pub stack: Vec<String>,
}

impl Failure {
    /// Record for a failed assertion node. `None` for anything else.
    pub fn from_node(tree: &Tree, id: NodeId) -> Option<Self> {
        let assertion = tree.assertion(id).filter(|a| !a.success)?;
        Some(Self {
            num: assertion.num,
            test: tree.owner_name(id).map(str::to_string),
            message: assertion.message.clone(),
            expected: assertion.expected.clone(),
            got: assertion.got.clone(),
            matcher: assertion.matcher.clone(),
            stack: assertion.stack.clone(),
        })
    }

    /// Every failure of a tree, in document order
    pub fn collect(tree: &Tree) -> Vec<Self> {
        tree.all_failures()
            .into_iter()
            .filter_map(|id| Self::from_node(tree, id))
            .collect()
    }

    /// The message, or the expectation when there is none
    pub fn headline(&self) -> String {
        match (&self.message, self.expectation()) {
            (Some(message), _) => message.clone(),
            (None, Some(expectation)) => expectation,
            (None, None) => format!("assertion {} failed", self.num),
        }
    }

    /// `expected: '..', got: '..'`, with the matcher when one was reported
    pub fn expectation(&self) -> Option<String> {
        let (expected, got) = (self.expected.as_ref()?, self.got.as_ref()?);
        let mut text = format!("expected: '{}', got: '{}'", expected, got);
        if let Some(matcher) = &self.matcher {
            text.push_str(&format!(", matcher: '{}'", matcher));
        }
        Some(text)
    }

    /// Stack frames not matching any of `ignore`
    pub fn filtered_stack<'a, S: AsRef<str>>(&'a self, ignore: &'a [S]) -> impl Iterator<Item = &'a str> + 'a {
        self.stack
            .iter()
            .map(String::as_str)
            .filter(move |frame| !ignore.iter().any(|pattern| frame.contains(pattern.as_ref())))
    }

    /// Multi-line rendering: ` + <test> - <num>: <message>`, then the
    /// expectation and the kept stack frames, each on a tab-indented line
    pub fn render<S: AsRef<str>>(&self, ignore: &[S]) -> String {
        let mut lines = vec![format!(
            " + {} - {}: {}",
            self.test.as_deref().unwrap_or("<no test>"),
            self.num,
            self.message.as_deref().unwrap_or("failed")
        )];
        lines.extend(self.expectation().map(|expectation| format!("\t{}", expectation)));
        lines.extend(self.filtered_stack(ignore).map(|frame| format!("\t{}", frame)));
        lines.join("\n")
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&DEFAULT_IGNORED_FRAMES))
    }
}
