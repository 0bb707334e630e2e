//! Lexer (tokenizer) for filter expressions.

use std::iter::Peekable;
use std::str::Chars;

/// Error encountered during lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    /// The quote character of the string that was never closed.
    pub character: char,
    /// The position (0-indexed byte offset) where the string starts.
    pub position: usize,
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unterminated string opened with {} at position {}",
            self.character, self.position
        )
    }
}

impl std::error::Error for LexerError {}

/// Result of tokenizing a filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerResult {
    /// The tokens successfully parsed, with their positions.
    pub tokens: Vec<PositionedToken>,
    /// Any errors encountered.
    pub errors: Vec<LexerError>,
}

/// A token with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken {
    /// The token.
    pub token: FilterToken,
    /// The byte position where the token starts (0-indexed).
    pub position: usize,
}

/// A token in a filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterToken {
    // ==================== Operands ====================
    /// A bare word: a field name, a literal, or one of the words `and`,
    /// `or`, `like` and `in`, which the parser recognises by position.
    Word(String),

    /// A single- or double-quoted literal, with escapes resolved.
    Quoted(String),

    /// A run of comparator characters such as `>=` or `?=`.
    Operator(String),

    /// A `,` separating list items.
    Comma,

    // ==================== Joins ====================
    /// `&` or `&&`.
    And,

    /// `|` or `||`.
    Or,

    /// Opening parenthesis `(`.
    OpenParen,

    /// Closing parenthesis `)`.
    CloseParen,
}

impl FilterToken {
    /// Returns the token as written, for error messages.
    pub fn describe(&self) -> String {
        match self {
            FilterToken::Word(word) => word.clone(),
            FilterToken::Quoted(text) => format!("\"{text}\""),
            FilterToken::Operator(op) => op.clone(),
            FilterToken::Comma => ",".to_string(),
            FilterToken::And => "&&".to_string(),
            FilterToken::Or => "||".to_string(),
            FilterToken::OpenParen => "(".to_string(),
            FilterToken::CloseParen => ")".to_string(),
        }
    }
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '=' | '!' | '<' | '>' | '~' | '?')
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace()
        && !is_operator_char(c)
        && !matches!(c, '(' | ')' | '&' | '|' | ',' | '"' | '\'')
}

/// Lexer for tokenizing filter expressions.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    /// Current byte position in the input string.
    position: usize,
    /// Errors encountered during tokenization.
    errors: Vec<LexerError>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
            errors: Vec::new(),
        }
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    /// Consumes and returns the next character, updating position.
    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            self.position += ch.len_utf8();
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.peek() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Reads characters while `accept` holds.
    fn read_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(&c) = self.peek() {
            if !accept(c) {
                break;
            }
            out.push(c);
            self.next_char();
        }
        out
    }

    /// Reads a quoted string (single or double quotes).
    fn read_quoted_string(&mut self, quote_char: char, start: usize) -> String {
        // Consume the opening quote
        self.next_char();

        let mut result = String::new();
        loop {
            match self.next_char() {
                Some(c) if c == quote_char => return result,
                Some('\\') => {
                    if let Some(escaped) = self.next_char() {
                        result.push(escaped);
                    }
                }
                Some(c) => result.push(c),
                None => {
                    self.errors.push(LexerError {
                        character: quote_char,
                        position: start,
                    });
                    return result;
                }
            }
        }
    }

    /// Consumes a single- or double-character join (`&`, `&&`, `|`, `||`).
    fn read_join(&mut self, c: char) {
        self.next_char();
        if self.peek() == Some(&c) {
            self.next_char();
        }
    }

    /// Returns the next token with its position, or None if at end of input.
    pub fn next_token(&mut self) -> Option<PositionedToken> {
        self.skip_whitespace();

        let c = *self.peek()?;
        let position = self.position;

        let token = match c {
            '&' => {
                self.read_join('&');
                FilterToken::And
            }
            '|' => {
                self.read_join('|');
                FilterToken::Or
            }
            '(' => {
                self.next_char();
                FilterToken::OpenParen
            }
            ')' => {
                self.next_char();
                FilterToken::CloseParen
            }
            ',' => {
                self.next_char();
                FilterToken::Comma
            }
            '"' | '\'' => FilterToken::Quoted(self.read_quoted_string(c, position)),
            _ if is_operator_char(c) => FilterToken::Operator(self.read_while(is_operator_char)),
            _ => FilterToken::Word(self.read_while(is_word_char)),
        };

        Some(PositionedToken { token, position })
    }

    /// Collects all tokens into a vector (without positions).
    #[cfg(test)]
    pub fn tokenize(self) -> Vec<FilterToken> {
        self.tokenize_with_errors()
            .tokens
            .into_iter()
            .map(|pt| pt.token)
            .collect()
    }

    /// Collects all tokens and any errors encountered.
    pub fn tokenize_with_errors(mut self) -> LexerResult {
        let mut tokens = Vec::new();
        while let Some(positioned_token) = self.next_token() {
            tokens.push(positioned_token);
        }
        LexerResult {
            tokens,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> FilterToken {
        FilterToken::Word(s.to_string())
    }

    fn op(s: &str) -> FilterToken {
        FilterToken::Operator(s.to_string())
    }

    #[test]
    fn test_tokenize_simple_term() {
        let tokens = Lexer::new("priority >= 3").tokenize();
        assert_eq!(tokens, vec![word("priority"), op(">="), word("3")]);
    }

    #[test]
    fn test_tokenize_term_without_spaces() {
        let tokens = Lexer::new("done=false").tokenize();
        assert_eq!(tokens, vec![word("done"), op("="), word("false")]);
    }

    #[test]
    fn test_tokenize_joins() {
        let tokens = Lexer::new("a = 1 && b = 2 || c = 3 & d = 4 | e = 5").tokenize();
        assert_eq!(tokens[3], FilterToken::And);
        assert_eq!(tokens[7], FilterToken::Or);
        assert_eq!(tokens[11], FilterToken::And);
        assert_eq!(tokens[15], FilterToken::Or);
    }

    #[test]
    fn test_tokenize_words_are_not_keywords() {
        let tokens = Lexer::new("title like x and done in 1").tokenize();
        assert_eq!(
            tokens,
            vec![
                word("title"),
                word("like"),
                word("x"),
                word("and"),
                word("done"),
                word("in"),
                word("1"),
            ]
        );
    }

    #[test]
    fn test_tokenize_comma_list() {
        let tokens = Lexer::new("labels in 1, 2,3").tokenize();
        assert_eq!(
            tokens,
            vec![
                word("labels"),
                word("in"),
                word("1"),
                FilterToken::Comma,
                word("2"),
                FilterToken::Comma,
                word("3"),
            ]
        );
    }

    #[test]
    fn test_tokenize_quoted_strings() {
        let tokens = Lexer::new(r#"title = "buy \"milk\"" || title = 'it''s'"#).tokenize();
        assert_eq!(tokens[2], FilterToken::Quoted(r#"buy "milk""#.to_string()));
        assert_eq!(tokens[6], FilterToken::Quoted("it".to_string()));
    }

    #[test]
    fn test_tokenize_datemath_literal_is_one_word() {
        let tokens = Lexer::new("due_date < now+7d/d").tokenize();
        assert_eq!(tokens, vec![word("due_date"), op("<"), word("now+7d/d")]);
    }

    #[test]
    fn test_tokenize_rfc3339_literal_is_one_word() {
        let tokens = Lexer::new("due_date > 2024-03-01T10:00:00+02:00").tokenize();
        assert_eq!(tokens[2], word("2024-03-01T10:00:00+02:00"));
    }

    #[test]
    fn test_tokenize_unsupported_operators_stay_whole() {
        let tokens = Lexer::new("title !~ x").tokenize();
        assert_eq!(tokens[1], op("!~"));
        let tokens = Lexer::new("title ?!= x").tokenize();
        assert_eq!(tokens[1], op("?!="));
    }

    #[test]
    fn test_tokenize_parentheses() {
        let tokens = Lexer::new("(a = 1)").tokenize();
        assert_eq!(tokens.first(), Some(&FilterToken::OpenParen));
        assert_eq!(tokens.last(), Some(&FilterToken::CloseParen));
    }

    #[test]
    fn test_tokenize_positions() {
        let result = Lexer::new("done = true").tokenize_with_errors();
        let positions: Vec<usize> = result.tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 5, 7]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_tokenize_unterminated_string_is_an_error() {
        let result = Lexer::new("title = \"open").tokenize_with_errors();
        assert_eq!(
            result.errors,
            vec![LexerError {
                character: '"',
                position: 8,
            }]
        );
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(Lexer::new("   ").tokenize().is_empty());
    }
}
