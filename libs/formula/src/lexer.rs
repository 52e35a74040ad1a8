//! Formula lexer - tokenizes input strings
//!
//! Converts expression text into a stream of tokens. Whitespace is discarded,
//! `>=`/`<=` are matched before `>`/`<`, and string literals are delimited by
//! `"` with no escape processing.

use crate::error::{Error, Result};
use crate::token::{Token, TokenType};

/// Tokenize a whole expression, ending with an `Eof` token.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = token.token_type == TokenType::Eof;
        tokens.push(token);
        if is_eof {
            return Ok(tokens);
        }
    }
}

/// The formula lexer
pub struct Lexer {
    /// Index into `chars`
    index: usize,
    /// Byte offset of `current_char` in the input
    position: usize,
    line: usize,
    column: usize,
    chars: Vec<char>,
    current_char: Option<char>,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Self {
            index: 0,
            position: 0,
            line: 1,
            column: 1,
            chars,
            current_char,
        }
    }

    /// Advance to the next character
    fn advance(&mut self) {
        if let Some(c) = self.current_char {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += c.len_utf8();
        }
        self.index += 1;
        self.current_char = self.chars.get(self.index).copied();
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read an identifier: `[A-Za-z_][A-Za-z0-9_]*`
    fn read_identifier(&mut self) -> String {
        let start = self.index;

        while let Some(c) = self.current_char {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        self.chars[start..self.index].iter().collect()
    }

    /// Read a number: `\d+(\.\d+)?`
    fn read_number(&mut self) -> String {
        let start = self.index;

        while let Some(c) = self.current_char {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        // The fractional part is only consumed when digits follow the dot
        if self.current_char == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while let Some(c) = self.current_char {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        self.chars[start..self.index].iter().collect()
    }

    /// Read a string literal: "text"
    fn read_string(&mut self) -> Result<String> {
        let start = self.position;
        self.advance(); // Skip opening quote

        let mut value = String::new();
        while let Some(c) = self.current_char {
            if c == '"' {
                self.advance(); // Skip closing quote
                return Ok(value);
            }
            value.push(c);
            self.advance();
        }

        Err(Error::lex(start, "Unterminated string literal"))
    }

    fn single(&mut self, token_type: TokenType, text: &str) -> Token {
        let token = Token::new(
            token_type,
            text.into(),
            self.position,
            self.line,
            self.column,
        );
        self.advance();
        token
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let position = self.position;
        let line = self.line;
        let column = self.column;

        let Some(c) = self.current_char else {
            return Ok(Token::eof(position, line, column));
        };

        let token = match c {
            '(' => self.single(TokenType::OpenParen, "("),
            ')' => self.single(TokenType::CloseParen, ")"),
            ',' => self.single(TokenType::Comma, ","),
            '+' => self.single(TokenType::Plus, "+"),
            '-' => self.single(TokenType::Minus, "-"),
            '*' => self.single(TokenType::Multiply, "*"),
            '/' => self.single(TokenType::Divide, "/"),
            '=' => self.single(TokenType::Equal, "="),
            '<' | '>' => {
                self.advance();
                let with_eq = self.current_char == Some('=');
                if with_eq {
                    self.advance();
                }
                let (token_type, text) = match (c, with_eq) {
                    ('<', true) => (TokenType::LessThanOrEqual, "<="),
                    ('<', false) => (TokenType::LessThan, "<"),
                    (_, true) => (TokenType::GreaterThanOrEqual, ">="),
                    (_, false) => (TokenType::GreaterThan, ">"),
                };
                Token::new(token_type, text.into(), position, line, column)
            }
            '"' => {
                let value = self.read_string()?;
                Token::new(TokenType::StringLiteral, value, position, line, column)
            }
            c if c.is_ascii_digit() => {
                let value = self.read_number();
                Token::new(TokenType::NumberLiteral, value, position, line, column)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let ident = self.read_identifier();
                Token::new(TokenType::Identifier, ident, position, line, column)
            }
            other => {
                return Err(Error::lex(
                    position,
                    format!(
                        "Unexpected character '{}' at line {}, column {}",
                        other, line, column
                    ),
                ));
            }
        };

        Ok(token)
    }
}
