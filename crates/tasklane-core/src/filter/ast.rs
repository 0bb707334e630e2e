//! Abstract Syntax Tree (AST) for filter expressions.
//!
//! The parser produces a [`Group`] of [`RawTerm`] leaves. Field resolution
//! maps every leaf onto a [`FilterTerm`] carrying a typed value, keeping the
//! shape of the tree.

use super::error::{FilterError, FilterResult};
use super::fields::FieldDef;
use super::value::FilterValue;

/// A filter comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Equals,
    NotEquals,
    Greater,
    GreaterEquals,
    Less,
    LessEquals,
    Like,
    In,
    /// Sentinel for a comparator that could not be recognised.
    Invalid,
}

impl Comparator {
    /// Maps an operator used in filter expressions.
    ///
    /// `like` and `in` are matched case-insensitively. Everything else,
    /// including `!~`, `?!=` and `?>`, is [`Comparator::Invalid`].
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "=" | "==" => Comparator::Equals,
            "!=" => Comparator::NotEquals,
            ">" => Comparator::Greater,
            ">=" => Comparator::GreaterEquals,
            "<" => Comparator::Less,
            "<=" => Comparator::LessEquals,
            "~" => Comparator::Like,
            "?=" => Comparator::In,
            other if other.eq_ignore_ascii_case("like") => Comparator::Like,
            other if other.eq_ignore_ascii_case("in") => Comparator::In,
            _ => Comparator::Invalid,
        }
    }

    /// Maps a comparator word of the legacy `filter_comparator` parameter.
    pub fn from_legacy(word: &str) -> Self {
        match word {
            "equals" => Comparator::Equals,
            "not_equals" => Comparator::NotEquals,
            "greater" => Comparator::Greater,
            "greater_equals" => Comparator::GreaterEquals,
            "less" => Comparator::Less,
            "less_equals" => Comparator::LessEquals,
            "like" => Comparator::Like,
            "in" => Comparator::In,
            _ => Comparator::Invalid,
        }
    }

    /// Rejects the invalid sentinel.
    pub fn validate(self) -> FilterResult<Self> {
        if self == Comparator::Invalid {
            return Err(FilterError::invalid_comparator(self.as_str()));
        }
        Ok(self)
    }

    /// Returns the canonical form of the comparator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Equals => "=",
            Comparator::NotEquals => "!=",
            Comparator::Greater => ">",
            Comparator::GreaterEquals => ">=",
            Comparator::Less => "<",
            Comparator::LessEquals => "<=",
            Comparator::Like => "like",
            Comparator::In => "in",
            Comparator::Invalid => "invalid",
        }
    }
}

/// How the children of a group are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Concat {
    And,
    #[default]
    Or,
}

impl Concat {
    /// Parses `and` / `or`, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("and") {
            Some(Concat::And)
        } else if value.eq_ignore_ascii_case("or") {
            Some(Concat::Or)
        } else {
            None
        }
    }
}

/// A `field comparator literal` leaf as written by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTerm {
    pub field: String,
    pub comparator: Comparator,
    pub value: String,
}

impl RawTerm {
    pub fn new(field: impl Into<String>, comparator: Comparator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            comparator,
            value: value.into(),
        }
    }
}

/// A resolved leaf with its typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTerm {
    /// The registry entry the field name resolved to.
    pub field: FieldDef,
    pub comparator: Comparator,
    pub value: FilterValue,
    /// Set when the stored column is a 64-bit integer.
    pub is_numeric: bool,
}

/// A node in a filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node<T> {
    Term(T),
    Group(Group<T>),
}

/// An ordered list of children combined with one operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<T> {
    pub concat: Concat,
    pub children: Vec<Node<T>>,
}

impl<T> Group<T> {
    pub fn new(concat: Concat, children: Vec<Node<T>>) -> Self {
        Self { concat, children }
    }

    /// A group holding a single term.
    pub fn single(term: T) -> Self {
        Self {
            concat: Concat::And,
            children: vec![Node::Term(term)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Maps every leaf, keeping the tree shape. Stops at the first error.
    pub fn try_map<U, E>(self, f: &mut impl FnMut(T) -> Result<U, E>) -> Result<Group<U>, E> {
        let children = self
            .children
            .into_iter()
            .map(|child| match child {
                Node::Term(term) => f(term).map(Node::Term),
                Node::Group(group) => group.try_map(f).map(Node::Group),
            })
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Group {
            concat: self.concat,
            children,
        })
    }

    /// Returns every leaf in order, ignoring the nesting.
    pub fn leaves(&self) -> Vec<&T> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a T>) {
        for child in &self.children {
            match child {
                Node::Term(term) => out.push(term),
                Node::Group(group) => group.collect_leaves(out),
            }
        }
    }
}
