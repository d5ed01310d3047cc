//! Line classification
//!
//! Each physical line of a reporter stream is recognized as exactly one
//! structural element. Module, test and assertion lines are tried first, in
//! that order; stack frames and plan lines are only considered when none of
//! those match.

use once_cell::sync::Lazy;
use regex::Regex;

static MODULE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<indent>\s*)# module: (?P<name>.*)$").expect("module pattern is valid")
});

static TEST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<indent>\s*)# test: (?P<name>.*)$").expect("test pattern is valid")
});

static ASSERTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<indent>\s*)(?P<type>(?:not )?ok) (?P<num>\d+)(?: - (?P<details>.*))?$")
        .expect("assertion pattern is valid")
});

static STACK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<indent>\s*)#\s+at\s+(?P<stack>.*)$").expect("stack pattern is valid")
});

static END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<indent>\s*)(?P<start>\d+)\.\.(?P<end>\d+)(?: - (?P<details>.*))?$")
        .expect("plan pattern is valid")
});

/// A classified line, borrowing from the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// `# module: <name>`
    Module { indent: &'a str, name: &'a str },

    /// `# test: <name>`
    Test { indent: &'a str, name: &'a str },

    /// `ok <n>` / `not ok <n>`, optionally followed by ` - <details>`
    Assertion {
        indent: &'a str,
        success: bool,
        num: u32,
        details: Option<&'a str>,
    },

    /// `#    at <frame>`, continuing the stack of the current assertion
    Stack { indent: &'a str, frame: &'a str },

    /// `<start>..<end>` plan line
    End {
        start: u64,
        end: u64,
        details: Option<&'a str>,
    },

    /// Empty or whitespace-only line
    Blank,

    /// Anything else
    Unrecognized(&'a str),
}

impl<'a> Line<'a> {
    /// Leading whitespace captured from the source line, when the shape has one
    pub fn indent(&self) -> &'a str {
        match self {
            Line::Module { indent, .. }
            | Line::Test { indent, .. }
            | Line::Assertion { indent, .. }
            | Line::Stack { indent, .. } => indent,
            _ => "",
        }
    }
}

/// Classify a single line. Trailing whitespace (including the newline) is ignored.
pub fn classify(line: &str) -> Line<'_> {
    let line = line.trim_end();
    if line.is_empty() {
        return Line::Blank;
    }

    if let Some(caps) = MODULE_RE.captures(line) {
        return Line::Module {
            indent: group(&caps, "indent"),
            name: group(&caps, "name").trim(),
        };
    }

    if let Some(caps) = TEST_RE.captures(line) {
        return Line::Test {
            indent: group(&caps, "indent"),
            name: group(&caps, "name").trim(),
        };
    }

    if let Some(caps) = ASSERTION_RE.captures(line) {
        // A sequence number that overflows is not something we can report on.
        if let Ok(num) = group(&caps, "num").parse() {
            return Line::Assertion {
                indent: group(&caps, "indent"),
                success: group(&caps, "type") == "ok",
                num,
                details: caps.name("details").map(|m| m.as_str()),
            };
        }
        return Line::Unrecognized(line);
    }

    if let Some(caps) = STACK_RE.captures(line) {
        return Line::Stack {
            indent: group(&caps, "indent"),
            frame: group(&caps, "stack"),
        };
    }

    if let Some(caps) = END_RE.captures(line) {
        if let (Ok(start), Ok(end)) = (group(&caps, "start").parse(), group(&caps, "end").parse()) {
            return Line::End {
                start,
                end,
                details: caps.name("details").map(|m| m.as_str()),
            };
        }
    }

    Line::Unrecognized(line)
}

fn group<'a>(caps: &regex::Captures<'a>, name: &str) -> &'a str {
    caps.name(name).map(|m| m.as_str()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_line() {
        assert_eq!(
            classify("# module: This is a module"),
            Line::Module { indent: "", name: "This is a module" }
        );
        assert_eq!(
            classify("    # module: nested  \n"),
            Line::Module { indent: "    ", name: "nested" }
        );
    }

    #[test]
    fn test_test_line() {
        assert_eq!(
            classify("# test: This is a test"),
            Line::Test { indent: "", name: "This is a test" }
        );
    }

    #[test]
    fn test_assertion_lines() {
        assert_eq!(
            classify("ok 1"),
            Line::Assertion { indent: "", success: true, num: 1, details: None }
        );
        assert_eq!(
            classify("  not ok 284 - I should be equal to me."),
            Line::Assertion {
                indent: "  ",
                success: false,
                num: 284,
                details: Some("I should be equal to me."),
            }
        );
    }

    #[test]
    fn test_stack_line() {
        assert_eq!(
            classify("#    at http://localhost/static/js/app.js:12"),
            Line::Stack { indent: "", frame: "http://localhost/static/js/app.js:12" }
        );
    }

    #[test]
    fn test_end_line() {
        assert_eq!(classify("1..12"), Line::End { start: 1, end: 12, details: None });
        assert_eq!(
            classify("1..3 - done"),
            Line::End { start: 1, end: 3, details: Some("done") }
        );
    }

    #[test]
    fn test_module_wins_over_stack() {
        // "# module: at x" must never be read as a stack frame
        assert!(matches!(classify("# module: at home"), Line::Module { .. }));
    }

    #[test]
    fn test_unrecognized_and_blank() {
        assert_eq!(classify(""), Line::Blank);
        assert_eq!(classify("   \t"), Line::Blank);
        assert_eq!(classify("Loading page..."), Line::Unrecognized("Loading page..."));
        assert_eq!(classify("okay 1"), Line::Unrecognized("okay 1"));
        assert!(matches!(classify("ok 99999999999999999999"), Line::Unrecognized(_)));
    }
}
