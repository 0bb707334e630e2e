//! Filter expression parser and field resolver for task queries.
//!
//! A filter is a boolean expression over task fields, for example
//! `priority >= 3 && (due_date < now+7d || labels in 1,2)`.
//!
//! # Supported Syntax
//!
//! ## Comparators
//! - `=` / `==`, `!=`, `>`, `>=`, `<`, `<=`
//! - `~` or `like` - substring match
//! - `?=` or `in` - the value is a comma-separated list
//!
//! ## Boolean Operators
//! - `&&`, `&` or `and` - AND
//! - `||`, `|` or `or` - OR
//! - `()` - Grouping
//!
//! ## Values
//! - bare words (`3`, `true`, `now-1d`, `2024-03-01`)
//! - quoted strings (`"buy milk"`, `'-3 days'`)
//!
//! Time values accept date math (`now+1w/d`), short phrases (`-3 days`,
//! `2 hours ago`) and absolute timestamps.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use tasklane_core::filter::{FieldResolver, FilterParser, FilterValue};
//!
//! let group = FilterParser::parse("priority >= 3 and done = false").unwrap();
//! let resolved = FieldResolver::new(Utc::now(), chrono_tz::UTC)
//!     .resolve_group(group)
//!     .unwrap();
//! assert_eq!(resolved.leaves()[0].value, FilterValue::Int(3));
//! ```

mod ast;
pub mod datemath;
mod error;
mod fields;
mod lexer;
mod parser;
mod value;

pub use ast::{Comparator, Concat, FilterTerm, Group, Node, RawTerm};
pub use error::{FilterError, FilterResult};
pub use fields::{lookup, FieldKind, FieldResolver, FieldDef, Route, FIELDS};
pub use lexer::{FilterToken, Lexer, LexerError};
pub use parser::FilterParser;
pub use value::{parse_bool, parse_user_time, FilterValue};
