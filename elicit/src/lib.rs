//! Spec documents: a constrained Markdown dialect describing scenarios as
//! ordered lists of steps, with tables and code blocks as step data.
//!
//! ```text
//! # Calculator
//!
//! ## Add numbers
//!
//! | a | b  | sum |
//! |---|----|-----|
//! | 2 | 3  | 5   |
//! | 10| -1 | 9   |
//!
//! - The sum of <a> and <b> is <sum>
//! ```

pub mod document;
pub mod parser;
pub mod table;

pub use document::{Scenario, SpecDocument, Step};
pub use parser::{ParseError, Parsed, Parser, parse_str};
pub use table::{Table, TextBlock};
