//! Recursive descent parser for filter expressions.

use super::ast::{Comparator, Concat, Group, Node, RawTerm};
use super::error::{FilterError, FilterResult};
use super::lexer::{FilterToken, Lexer, PositionedToken};

/// Parser for task filter expressions.
///
/// # Grammar
///
/// ```text
/// expression ::= or_expr
/// or_expr    ::= and_expr (("||" | "|" | "or") and_expr)*
/// and_expr   ::= primary (("&&" | "&" | "and") primary)*
/// primary    ::= "(" expression ")" | term
/// term       ::= field comparator value
/// comparator ::= "=" | "==" | "!=" | ">" | ">=" | "<" | "<=" | "~" | "like"
///              | "?=" | "in"
/// value      ::= item ("," item)*
/// item       ::= quoted-string | bare-word
/// ```
///
/// `and`, `or`, `like` and `in` are case-insensitive. A list value is kept as
/// one comma-joined literal; field resolution splits it again.
///
/// # Example
///
/// ```
/// use tasklane_core::filter::{Concat, FilterParser};
///
/// let group = FilterParser::parse("priority >= 3 and done = false").unwrap();
/// assert_eq!(group.concat, Concat::And);
/// assert_eq!(group.children.len(), 2);
/// ```
pub struct FilterParser {
    tokens: Vec<PositionedToken>,
    position: usize,
}

impl FilterParser {
    /// Parses a filter expression into its group tree.
    ///
    /// The root is always a group; a lone term is wrapped in a one-child
    /// `and` group.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::EmptyExpression` for blank input,
    /// `FilterError::InvalidSyntax` for lexer errors,
    /// `FilterError::InvalidComparator` for unsupported operators and the
    /// other syntax variants for malformed expressions.
    pub fn parse(input: &str) -> FilterResult<Group<RawTerm>> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(FilterError::EmptyExpression);
        }

        let result = Lexer::new(trimmed).tokenize_with_errors();
        if let Some(error) = result.errors.first() {
            return Err(FilterError::invalid_syntax(error.to_string()));
        }
        if result.tokens.is_empty() {
            return Err(FilterError::EmptyExpression);
        }

        let mut parser = Self {
            tokens: result.tokens,
            position: 0,
        };
        let node = parser.parse_or_expr()?;

        // Check that we consumed all tokens
        if let Some(remaining) = parser.peek() {
            return Err(FilterError::unexpected_token(remaining.describe()));
        }

        Ok(match node {
            Node::Group(group) => group,
            Node::Term(term) => Group::single(term),
        })
    }

    /// Builds terms from the legacy parallel arrays.
    ///
    /// Position `i` of each array forms one term. A missing comparator
    /// defaults to `equals`.
    pub fn parse_legacy(
        fields: &[String],
        comparators: &[String],
        values: &[String],
    ) -> FilterResult<Vec<RawTerm>> {
        if fields.len() != values.len() {
            return Err(FilterError::invalid_syntax(format!(
                "{} filter fields but {} filter values",
                fields.len(),
                values.len()
            )));
        }

        fields
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (field, value))| {
                let comparator = match comparators.get(i) {
                    Some(word) => Comparator::from_legacy(word)
                        .validate()
                        .map_err(|_| FilterError::invalid_comparator(word.as_str()))?,
                    None => Comparator::Equals,
                };
                Ok(RawTerm::new(field.as_str(), comparator, value.as_str()))
            })
            .collect()
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&FilterToken> {
        self.tokens.get(self.position).map(|t| &t.token)
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Option<FilterToken> {
        let token = self.tokens.get(self.position).map(|t| t.token.clone());
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn check(&self, expected: &FilterToken) -> bool {
        self.peek() == Some(expected)
    }

    fn check_join(&self, concat: Concat) -> bool {
        match self.peek() {
            Some(FilterToken::And) => concat == Concat::And,
            Some(FilterToken::Or) => concat == Concat::Or,
            Some(FilterToken::Word(word)) => Concat::parse(word) == Some(concat),
            _ => false,
        }
    }

    /// Parses OR expressions: `and_expr ("||" and_expr)*`
    fn parse_or_expr(&mut self) -> FilterResult<Node<RawTerm>> {
        self.parse_chain(Concat::Or, Self::parse_and_expr)
    }

    /// Parses AND expressions: `primary ("&&" primary)*`
    fn parse_and_expr(&mut self) -> FilterResult<Node<RawTerm>> {
        self.parse_chain(Concat::And, Self::parse_primary)
    }

    fn parse_chain(
        &mut self,
        concat: Concat,
        operand: fn(&mut Self) -> FilterResult<Node<RawTerm>>,
    ) -> FilterResult<Node<RawTerm>> {
        let mut children = vec![operand(self)?];
        while self.check_join(concat) {
            self.advance();
            children.push(operand(self)?);
        }

        if children.len() == 1 {
            if let Some(only) = children.pop() {
                return Ok(only);
            }
        }
        Ok(Node::Group(Group::new(concat, children)))
    }

    /// Parses primary expressions: `"(" expression ")" | term`
    fn parse_primary(&mut self) -> FilterResult<Node<RawTerm>> {
        let token = self.advance().ok_or(FilterError::UnexpectedEndOfInput)?;

        match token {
            FilterToken::OpenParen => {
                let inner = self.parse_or_expr()?;
                if !self.check(&FilterToken::CloseParen) {
                    return Err(FilterError::UnclosedParenthesis);
                }
                self.advance(); // consume ')'
                Ok(inner)
            }
            FilterToken::Word(field) => self.parse_term(field).map(Node::Term),
            other => Err(FilterError::unexpected_token(other.describe())),
        }
    }

    /// Parses the comparator and value of a term whose field was consumed.
    fn parse_term(&mut self, field: String) -> FilterResult<RawTerm> {
        let symbol = match self.advance() {
            Some(FilterToken::Operator(symbol)) => symbol,
            Some(FilterToken::Word(word))
                if word.eq_ignore_ascii_case("like") || word.eq_ignore_ascii_case("in") =>
            {
                word
            }
            Some(other) => return Err(FilterError::unexpected_token(other.describe())),
            None => return Err(FilterError::UnexpectedEndOfInput),
        };

        let comparator = Comparator::from_symbol(&symbol);
        if comparator == Comparator::Invalid {
            return Err(FilterError::invalid_comparator(symbol));
        }

        let mut items = vec![self.parse_value_item()?];
        while self.check(&FilterToken::Comma) {
            self.advance(); // consume ','
            items.push(self.parse_value_item()?);
        }

        Ok(RawTerm::new(field, comparator, items.join(",")))
    }

    fn parse_value_item(&mut self) -> FilterResult<String> {
        match self.advance() {
            Some(FilterToken::Word(word)) => Ok(word),
            Some(FilterToken::Quoted(text)) => Ok(text),
            Some(other) => Err(FilterError::unexpected_token(other.describe())),
            None => Err(FilterError::UnexpectedEndOfInput),
        }
    }
}
