//! jstap core library
//!
//! Turns the line-oriented, TAP-like output of the Jasmine and QUnit
//! reporters into a `module -> test -> assertion` tree while the stream is
//! still being produced.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  line     classify(&str) -> Line                          │
//! │  details  Details::decode("msg, expected: 'a', got: 'b'") │
//! │  tree     Tree (arena) / NodeId / NodeKind / Item         │
//! │  parser   TapParser::feed / finish / parse -> Parse<I>    │
//! │  report   Failure records for reporting                   │
//! └───────────────────────────────────────────────────────────┘
//! ```

pub mod details;
pub mod error;
pub mod line;
pub mod parser;
pub mod report;
pub mod tree;

pub use details::Details;
pub use error::{Result, TapError};
pub use line::{classify, Line};
pub use parser::{Parse, ParserOptions, TapParser};
pub use report::Failure;
pub use tree::{Assertion, Group, Item, Node, NodeId, NodeKind, Summary, Tree};

/// jstap version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
