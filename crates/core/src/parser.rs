//! Incremental tree parser
//!
//! The reporters never close a module or a test explicitly: a node ends when
//! a sibling or a shallower node arrives, or when the stream ends. The parser
//! keeps the open path from the root to the current node and, for every new
//! node, pops whatever that node proves closed before attaching it.
//!
//! Closed nodes of the requested granularity are handed back as soon as they
//! are known to be complete, so callers can report a test while the browser
//! is still running the next one.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use tracing::debug;

use crate::line::{classify, Line};
use crate::tree::{Item, NodeId, NodeKind, Tree};

/// Parser settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Kind of node handed back once closed
    pub granularity: NodeKind,

    /// Also hand back shallower nodes (e.g. modules when the granularity is
    /// `Test`) as soon as they open, so they can serve as headers.
    pub announce_enclosing: bool,

    /// Log dropped lines at debug level
    pub debug: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            granularity: NodeKind::Test,
            announce_enclosing: false,
            debug: false,
        }
    }
}

impl ParserOptions {
    pub fn new(granularity: NodeKind) -> Self {
        Self {
            granularity,
            ..Default::default()
        }
    }

    pub fn announce_enclosing(mut self, announce: bool) -> Self {
        self.announce_enclosing = announce;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Stateful parser building one [`Tree`]
#[derive(Debug, Clone)]
pub struct TapParser {
    tree: Tree,
    /// Open nodes from the outermost to the current one, root excluded
    path: Vec<NodeId>,
    options: ParserOptions,
}

impl Default for TapParser {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl TapParser {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            tree: Tree::new(),
            path: Vec::new(),
            options,
        }
    }

    pub fn with_granularity(granularity: NodeKind) -> Self {
        Self::new(ParserOptions::new(granularity))
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    /// Innermost open node, or the root
    pub fn current(&self) -> NodeId {
        self.path.last().copied().unwrap_or(Tree::ROOT)
    }

    /// Consume one line, returning the nodes it closed (innermost first)
    pub fn feed(&mut self, line: &str) -> Vec<NodeId> {
        let line = classify(line);
        if let Some(item) = Item::from_line(&line) {
            return self.open(item, line.indent());
        }

        match line {
            Line::Stack { frame, .. } => {
                let current = self.current();
                match self.tree.assertion_mut(current) {
                    Some(assertion) => assertion.stack.push(frame.to_string()),
                    None if self.options.debug => {
                        debug!(frame, "stack frame outside of an assertion, dropped");
                    }
                    None => {}
                }
            }
            Line::End { start, end, .. } if self.options.debug => {
                debug!("# end {}-{}", start, end);
            }
            Line::Unrecognized(text) if self.options.debug => {
                debug!("not matched: {}", text);
            }
            _ => {}
        }

        Vec::new()
    }

    /// End of stream: close every open node, innermost first
    pub fn finish(&mut self) -> Vec<NodeId> {
        let mut closed = Vec::new();
        while let Some(id) = self.path.pop() {
            if self.tree.kind(id) == Some(self.options.granularity) {
                closed.push(id);
            }
        }
        closed
    }

    /// Lazily parse `lines`, yielding closed nodes of the configured granularity
    pub fn parse<I>(self, lines: I) -> Parse<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Parse {
            parser: self,
            lines: lines.into_iter(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    fn open(&mut self, item: Item, indent: &str) -> Vec<NodeId> {
        let kind = item.kind();
        let mut closed = Vec::new();

        while let Some(&current) = self.path.last() {
            let node = &self.tree[current];
            let Some(current_kind) = node.kind() else {
                break;
            };

            // Assertions are leaves and close on any arrival.
            let closes = current_kind == NodeKind::Assertion
                || kind < current_kind
                || (kind == current_kind && indent.len() <= node.parsed_indent().len());
            if !closes {
                break;
            }

            if current_kind == self.options.granularity {
                closed.push(current);
            }
            self.path.pop();
        }

        let parent = self.current();
        let id = self.tree.attach(parent, item, indent);
        self.path.push(id);

        if self.options.announce_enclosing && kind < self.options.granularity {
            closed.push(id);
        }

        closed
    }
}

/// Lazy, single-pass sequence of closed nodes.
///
/// The tree stays readable between calls to `next()` through [`Parse::tree`].
#[derive(Debug)]
pub struct Parse<I> {
    parser: TapParser,
    lines: I,
    pending: VecDeque<NodeId>,
    finished: bool,
}

impl<I> Parse<I> {
    pub fn tree(&self) -> &Tree {
        self.parser.tree()
    }

    /// Finished (or partially parsed) tree
    pub fn into_tree(self) -> Tree {
        self.parser.into_tree()
    }
}

impl<I> Iterator for Parse<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            if let Some(id) = self.pending.pop_front() {
                return Some(id);
            }
            if self.finished {
                return None;
            }
            match self.lines.next() {
                Some(line) => {
                    let closed = self.parser.feed(line.as_ref());
                    self.pending.extend(closed);
                }
                None => {
                    let closed = self.parser.finish();
                    self.pending.extend(closed);
                    self.finished = true;
                }
            }
        }
    }
}

impl<I> FusedIterator for Parse<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
}
