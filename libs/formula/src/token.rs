//! Token types for the formula lexer
//!
//! Tokens represent the lexical elements of formula expressions.

use std::fmt;

/// Token types for the formula lexer
#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub enum TokenType {
    // Literals
    NumberLiteral,
    StringLiteral,

    // Identifiers (function names or field references)
    Identifier,

    // Operators
    Plus,               // +
    Minus,              // -
    Multiply,           // *
    Divide,             // /
    Equal,              // =
    GreaterThan,        // >
    LessThan,           // <
    GreaterThanOrEqual, // >=
    LessThanOrEqual,    // <=

    // Delimiters
    OpenParen,  // (
    CloseParen, // )
    Comma,      // ,

    // End of input
    Eof,
}

impl TokenType {
    pub fn is_operator(self) -> bool {
        matches!(
            self,
            TokenType::Plus
                | TokenType::Minus
                | TokenType::Multiply
                | TokenType::Divide
                | TokenType::Equal
                | TokenType::GreaterThan
                | TokenType::LessThan
                | TokenType::GreaterThanOrEqual
                | TokenType::LessThanOrEqual
        )
    }

    /// Human-readable description used in parse errors
    pub fn describe(self) -> &'static str {
        match self {
            TokenType::NumberLiteral => "number",
            TokenType::StringLiteral => "string",
            TokenType::Identifier => "identifier",
            TokenType::Plus => "'+'",
            TokenType::Minus => "'-'",
            TokenType::Multiply => "'*'",
            TokenType::Divide => "'/'",
            TokenType::Equal => "'='",
            TokenType::GreaterThan => "'>'",
            TokenType::LessThan => "'<'",
            TokenType::GreaterThanOrEqual => "'>='",
            TokenType::LessThanOrEqual => "'<='",
            TokenType::OpenParen => "'('",
            TokenType::CloseParen => "')'",
            TokenType::Comma => "','",
            TokenType::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A token in the formula expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    /// Byte offset of the token's first character
    pub position: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        value: String,
        position: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            token_type,
            value,
            position,
            line,
            column,
        }
    }

    pub fn eof(position: usize, line: usize, column: usize) -> Self {
        Self {
            token_type: TokenType::Eof,
            value: String::new(),
            position,
            line,
            column,
        }
    }
}
