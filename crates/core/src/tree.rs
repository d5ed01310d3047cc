//! Result tree
//!
//! Nodes live in an arena owned by [`Tree`] and are addressed by [`NodeId`].
//! Every node except the synthetic root has exactly one parent, fixed when it
//! is appended; children keep insertion order.

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::details::Details;
use crate::error::{Result, TapError};
use crate::line::Line;

/// Display indent added under each module
pub const INDENT: usize = 4;

/// Index of a node inside its [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Node kinds and payloads
// ============================================================================

/// Structural level of a node. Declaration order is depth order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Module,
    Test,
    Assertion,
}

impl NodeKind {
    pub fn depth(self) -> u8 {
        match self {
            NodeKind::Module => 0,
            NodeKind::Test => 1,
            NodeKind::Assertion => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Module => "module",
            NodeKind::Test => "test",
            NodeKind::Assertion => "assertion",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = TapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "module" => Ok(NodeKind::Module),
            "test" => Ok(NodeKind::Test),
            "assertion" => Ok(NodeKind::Assertion),
            _ => Err(TapError::UnknownGranularity(s.to_string())),
        }
    }
}

/// A named group: a module or a test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
}

/// One pass/fail check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    /// Sequence number as reported upstream. Not validated.
    pub num: u32,
    pub success: bool,
    pub message: Option<String>,
    pub expected: Option<String>,
    pub got: Option<String>,
    pub matcher: Option<String>,
    pub stack: Vec<String>,
}

impl Assertion {
    pub fn new(num: u32, success: bool) -> Self {
        Self {
            num,
            success,
            message: None,
            expected: None,
            got: None,
            matcher: None,
            stack: Vec::new(),
        }
    }

    /// Build an assertion from decoded details
    pub fn with_details(num: u32, success: bool, details: Details) -> Self {
        let (expected, got) = match (details.expected, details.got) {
            (Some(expected), Some(got)) => (Some(expected), Some(got)),
            _ => (None, None),
        };

        Self {
            num,
            success,
            message: details.message,
            expected,
            got,
            matcher: details.matcher,
            stack: details.source.into_iter().collect(),
        }
    }

    /// Single-glyph rendering used inline by tests
    fn glyph(&self) -> String {
        if self.success {
            "ok".green().bold().to_string()
        } else {
            "ko".red().bold().to_string()
        }
    }

    fn status(&self) -> String {
        if self.success {
            format!("ok {}", self.num).green().bold().to_string()
        } else {
            format!("not ok {}", self.num).red().bold().to_string()
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(f, "ok {}", self.num)
        } else {
            write!(f, "not ok {}", self.num)
        }
    }
}

/// Payload of a non-root node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Item {
    Module(Group),
    Test(Group),
    Assertion(Assertion),
}

impl Item {
    pub fn module(name: impl Into<String>) -> Self {
        Item::Module(Group { name: name.into() })
    }

    pub fn test(name: impl Into<String>) -> Self {
        Item::Test(Group { name: name.into() })
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Item::Module(_) => NodeKind::Module,
            Item::Test(_) => NodeKind::Test,
            Item::Assertion(_) => NodeKind::Assertion,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Item::Module(group) | Item::Test(group) => Some(&group.name),
            Item::Assertion(_) => None,
        }
    }

    pub fn as_assertion(&self) -> Option<&Assertion> {
        match self {
            Item::Assertion(assertion) => Some(assertion),
            _ => None,
        }
    }

    /// Build the item a classified line opens, if any
    pub fn from_line(line: &Line<'_>) -> Option<Self> {
        match *line {
            Line::Module { name, .. } => Some(Item::module(name)),
            Line::Test { name, .. } => Some(Item::test(name)),
            Line::Assertion { success, num, details, .. } => {
                let details = details.map(Details::decode).unwrap_or_default();
                Some(Item::Assertion(Assertion::with_details(num, success, details)))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Module(group) => write!(f, "# module: {}", group.name),
            Item::Test(group) => write!(f, "# test: {}", group.name),
            Item::Assertion(assertion) => write!(f, "{}", assertion),
        }
    }
}

// ============================================================================
// Arena
// ============================================================================

/// A node of the tree
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    parent: Option<NodeId>,
    parsed_indent: String,
    item: Option<Item>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Leading whitespace of the source line
    pub fn parsed_indent(&self) -> &str {
        &self.parsed_indent
    }

    /// `None` for the root
    pub fn item(&self) -> Option<&Item> {
        self.item.as_ref()
    }

    pub fn kind(&self) -> Option<NodeKind> {
        self.item.as_ref().map(Item::kind)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Counts over a whole tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub modules: usize,
    pub tests: usize,
    pub assertions: usize,
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} module(s), {} test(s), {} assertion(s): {} passed, {} failed",
            self.modules, self.tests, self.assertions, self.passed, self.failed
        )
    }
}

/// Arena-backed result tree with a synthetic root
#[derive(Debug, Clone, Serialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                parsed_indent: String::new(),
                item: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn item(&self, id: NodeId) -> Option<&Item> {
        self.get(id).and_then(Node::item)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).and_then(Node::kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or_default()
    }

    pub fn assertion(&self, id: NodeId) -> Option<&Assertion> {
        self.item(id).and_then(Item::as_assertion)
    }

    pub(crate) fn assertion_mut(&mut self, id: NodeId) -> Option<&mut Assertion> {
        match self.nodes.get_mut(id.0).and_then(|n| n.item.as_mut()) {
            Some(Item::Assertion(assertion)) => Some(assertion),
            _ => None,
        }
    }

    /// Number of nodes, root excluded
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All non-root nodes in creation (document) order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, node)| (NodeId(i), node))
    }

    /// Append `item` as the last child of `parent`.
    ///
    /// Assertions are leaves: appending under one is an error.
    pub fn append(&mut self, parent: NodeId, item: Item, parsed_indent: &str) -> Result<NodeId> {
        let holder = self.get(parent).ok_or(TapError::UnknownNode(parent.0))?;
        if let Some(kind @ NodeKind::Assertion) = holder.kind() {
            return Err(TapError::NotAGroup {
                id: parent.0,
                kind: kind.to_string(),
            });
        }
        Ok(self.attach(parent, item, parsed_indent))
    }

    /// Append without checks. `parent` must be a group or the root.
    pub(crate) fn attach(&mut self, parent: NodeId, item: Item, parsed_indent: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            parsed_indent: parsed_indent.to_string(),
            item: Some(item),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Display indent: each enclosing module adds [`INDENT`] spaces, tests add nothing.
    pub fn indent(&self, id: NodeId) -> String {
        let mut width = 0;
        let mut cursor = self.parent(id);
        while let Some(ancestor) = cursor {
            if self.kind(ancestor) == Some(NodeKind::Module) {
                width += INDENT;
            }
            cursor = self.parent(ancestor);
        }
        " ".repeat(width)
    }

    /// Human-readable rendering of a node
    pub fn display(&self, id: NodeId) -> String {
        let indent = self.indent(id);
        match self.item(id) {
            None => String::new(),
            Some(Item::Module(group)) => format!("{}{}", indent, group.name),
            Some(Item::Test(group)) => {
                let glyphs: Vec<String> = self
                    .children(id)
                    .iter()
                    .filter_map(|&child| self.assertion(child))
                    .map(Assertion::glyph)
                    .collect();
                if glyphs.is_empty() {
                    format!("{}{}", indent, group.name)
                } else {
                    format!("{}{} ({})", indent, group.name, glyphs.join(" "))
                }
            }
            Some(Item::Assertion(assertion)) => {
                let mut text = format!("{}{}", indent, assertion.status());
                if let Some(message) = &assertion.message {
                    text.push_str(" - ");
                    text.push_str(message);
                }
                if let (Some(expected), Some(got)) = (&assertion.expected, &assertion.got) {
                    text.push_str(&format!("\n# expected: {}\n# got: {}", expected, got));
                }
                for frame in &assertion.stack {
                    text.push_str(&format!("\n# stack: {}", frame));
                }
                text
            }
        }
    }

    /// Failed assertions below `id`, depth first in document order
    pub fn failures(&self, id: NodeId) -> Vec<NodeId> {
        let mut failures = Vec::new();
        self.collect_failures(id, &mut failures);
        failures
    }

    fn collect_failures(&self, id: NodeId, failures: &mut Vec<NodeId>) {
        for &child in self.children(id) {
            match self.item(child) {
                Some(Item::Assertion(assertion)) if !assertion.success => failures.push(child),
                Some(Item::Assertion(_)) => {}
                _ => self.collect_failures(child, failures),
            }
        }
    }

    /// Every failed assertion in the tree
    pub fn all_failures(&self) -> Vec<NodeId> {
        self.failures(Self::ROOT)
    }

    /// Name of the closest enclosing test or module
    pub fn owner_name(&self, id: NodeId) -> Option<&str> {
        let mut cursor = self.parent(id);
        while let Some(ancestor) = cursor {
            if let Some(name) = self.item(ancestor).and_then(Item::name) {
                return Some(name);
            }
            cursor = self.parent(ancestor);
        }
        None
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for (_, node) in self.iter() {
            match node.item() {
                Some(Item::Module(_)) => summary.modules += 1,
                Some(Item::Test(_)) => summary.tests += 1,
                Some(Item::Assertion(assertion)) => {
                    summary.assertions += 1;
                    if assertion.success {
                        summary.passed += 1;
                    } else {
                        summary.failed += 1;
                    }
                }
                None => {}
            }
        }
        summary
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}
