//! Formula parser - converts token streams to AST
//!
//! Recursive descent parser. Precedence (lowest to highest):
//! 1. comparison (=, >, <, >=, <=)
//! 2. additive (+, -)
//! 3. multiplicative (*, /)
//! 4. unary minus
//! 5. primary (literal, field reference, function call, parenthesized)
//!
//! All binary levels are left-associative. The parser only checks syntax;
//! unknown names and argument counts are the validator's concern.
//!
//! Two limits keep every later tree walk within the stack: parser recursion
//! (parentheses, calls, negation) is capped at 200 levels, and the depth of
//! the produced tree is capped at [`MAX_TREE_DEPTH`]. Operator chains such as
//! `a + b + c + ...` nest one level per operator without recursing in the
//! parser, so only the second limit catches them.

use crate::ast::{AstNode, BinaryOperator};
use crate::error::{Error, Result};
use crate::lexer::tokenize;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Tokenize and parse an expression in one step
pub fn parse(input: &str) -> Result<AstNode> {
    let tokens = tokenize(input)?;
    Parser::new(tokens).parse()
}

/// Parser for formula expressions
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    recursion_depth: usize,
}

const MAX_RECURSION_DEPTH: usize = 200;

/// Deepest AST the parser will return, counted in nodes from root to leaf
pub const MAX_TREE_DEPTH: usize = 512;

/// A parsed subtree and its depth
type Parsed = (AstNode, usize);

impl Parser {
    /// Create a parser over a token stream.
    ///
    /// A missing trailing `Eof` token is tolerated.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.token_type) != Some(TokenType::Eof) {
            let position = tokens
                .last()
                .map(|t| t.position + t.value.len().max(1))
                .unwrap_or(0);
            tokens.push(Token::eof(position, 1, position + 1));
        }

        Self {
            tokens,
            current: 0,
            recursion_depth: 0,
        }
    }

    fn current_token(&self) -> &Token {
        // `new` guarantees a trailing Eof, and `advance` never moves past it
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn current_token_is(&self, token_type: TokenType) -> bool {
        self.current_token().token_type == token_type
    }

    fn peek_is(&self, token_type: TokenType) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|t| t.token_type == token_type)
    }

    fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if token.token_type != TokenType::Eof {
            self.current += 1;
        }
        token
    }

    fn error_at(token: &Token, message: impl Into<String>) -> Error {
        Error::parse(token.position, message)
    }

    /// `number '2'`, `identifier 'amount'`, `'*'`
    fn describe(token: &Token) -> String {
        match token.token_type {
            TokenType::NumberLiteral | TokenType::StringLiteral | TokenType::Identifier => {
                format!("{} '{}'", token.token_type.describe(), token.value)
            }
            other => other.describe().to_string(),
        }
    }

    fn unexpected(token: &Token) -> Error {
        if token.token_type == TokenType::Eof {
            return Self::error_at(token, "Unexpected end of expression");
        }
        Self::error_at(
            token,
            format!(
                "Unexpected {} at line {}, column {}",
                Self::describe(token),
                token.line,
                token.column
            ),
        )
    }

    /// Parse the entire expression (top-level entry point)
    pub fn parse(&mut self) -> Result<AstNode> {
        if self.current_token_is(TokenType::Eof) {
            return Err(Self::error_at(self.current_token(), "Empty expression"));
        }

        let (expr, _) = self.parse_expression()?;

        // Ensure we've consumed all input
        let token = self.current_token();
        match token.token_type {
            TokenType::Eof => Ok(expr),
            TokenType::CloseParen => Err(Self::error_at(
                token,
                format!(
                    "Unbalanced parentheses: unexpected ')' at line {}, column {}",
                    token.line, token.column
                ),
            )),
            _ => Err(Self::error_at(
                token,
                format!("Unexpected {} after complete expression", Self::describe(token)),
            )),
        }
    }

    fn check_recursion_depth(&mut self) -> Result<()> {
        self.recursion_depth += 1;
        if self.recursion_depth > MAX_RECURSION_DEPTH {
            return Err(Self::error_at(
                self.current_token(),
                format!(
                    "Expression too deeply nested (max depth: {})",
                    MAX_RECURSION_DEPTH
                ),
            ));
        }
        Ok(())
    }

    fn decrement_recursion_depth(&mut self) {
        self.recursion_depth -= 1;
    }

    /// Depth of a node over `children`, rejecting trees past [`MAX_TREE_DEPTH`]
    fn node_depth(&self, children: impl IntoIterator<Item = usize>) -> Result<usize> {
        let depth = 1 + children.into_iter().max().unwrap_or(0);
        if depth > MAX_TREE_DEPTH {
            return Err(Self::error_at(
                self.current_token(),
                format!("Expression too deeply nested (max depth: {})", MAX_TREE_DEPTH),
            ));
        }
        Ok(depth)
    }

    fn binary(&self, op: BinaryOperator, left: Parsed, right: Parsed) -> Result<Parsed> {
        let depth = self.node_depth([left.1, right.1])?;
        Ok((AstNode::binary(op, left.0, right.0), depth))
    }

    /// expr := comparison
    fn parse_expression(&mut self) -> Result<Parsed> {
        self.check_recursion_depth()?;
        let expr = self.parse_comparison()?;
        self.decrement_recursion_depth();
        Ok(expr)
    }

    /// comparison := additive (('=' | '>' | '<' | '>=' | '<=') additive)*
    fn parse_comparison(&mut self) -> Result<Parsed> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current_token().token_type {
                TokenType::Equal => BinaryOperator::Equal,
                TokenType::GreaterThan => BinaryOperator::GreaterThan,
                TokenType::LessThan => BinaryOperator::LessThan,
                TokenType::GreaterThanOrEqual => BinaryOperator::GreaterThanOrEqual,
                TokenType::LessThanOrEqual => BinaryOperator::LessThanOrEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = self.binary(op, left, right)?;
        }

        Ok(left)
    }

    /// additive := term (('+' | '-') term)*
    fn parse_additive(&mut self) -> Result<Parsed> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.current_token().token_type {
                TokenType::Plus => BinaryOperator::Add,
                TokenType::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = self.binary(op, left, right)?;
        }

        Ok(left)
    }

    /// term := unary (('*' | '/') unary)*
    fn parse_term(&mut self) -> Result<Parsed> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token().token_type {
                TokenType::Multiply => BinaryOperator::Multiply,
                TokenType::Divide => BinaryOperator::Divide,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.binary(op, left, right)?;
        }

        Ok(left)
    }

    /// unary := '-' unary | primary
    ///
    /// `-<number>` folds into a negative literal.
    fn parse_unary(&mut self) -> Result<Parsed> {
        if !self.current_token_is(TokenType::Minus) {
            return self.parse_primary();
        }

        self.advance(); // Skip '-'
        if self.current_token_is(TokenType::NumberLiteral) {
            let token = self.advance();
            let n = Self::parse_number(&token)?;
            return Ok((AstNode::number(-n), 1));
        }

        self.check_recursion_depth()?;
        let (operand, operand_depth) = self.parse_unary()?;
        self.decrement_recursion_depth();
        let depth = self.node_depth([operand_depth])?;
        Ok((
            AstNode::Negate {
                operand: Box::new(operand),
            },
            depth,
        ))
    }

    fn parse_number(token: &Token) -> Result<f64> {
        token
            .value
            .parse::<f64>()
            .map_err(|e| Self::error_at(token, format!("Invalid number '{}': {}", token.value, e)))
    }

    /// primary := NUMBER | STRING | IDENTIFIER | IDENTIFIER '(' argList? ')' | '(' expr ')'
    fn parse_primary(&mut self) -> Result<Parsed> {
        let token = self.current_token().clone();

        match token.token_type {
            TokenType::NumberLiteral => {
                self.advance();
                Ok((AstNode::number(Self::parse_number(&token)?), 1))
            }
            TokenType::StringLiteral => {
                self.advance();
                let literal = AstNode::Literal {
                    value: Value::Text(token.value),
                };
                Ok((literal, 1))
            }
            TokenType::Identifier => {
                // An identifier directly followed by '(' is always a call
                if self.peek_is(TokenType::OpenParen) {
                    return self.parse_function_call();
                }
                self.advance();
                let node = if token.value.eq_ignore_ascii_case("true") {
                    AstNode::boolean(true)
                } else if token.value.eq_ignore_ascii_case("false") {
                    AstNode::boolean(false)
                } else {
                    AstNode::FieldRef { name: token.value }
                };
                Ok((node, 1))
            }
            TokenType::OpenParen => {
                self.advance(); // Skip '('
                let expr = self.parse_expression()?;
                self.expect_close_paren(&token)?;
                Ok(expr)
            }
            _ => Err(Self::unexpected(&token)),
        }
    }

    fn expect_close_paren(&mut self, open: &Token) -> Result<()> {
        if self.current_token_is(TokenType::CloseParen) {
            self.advance();
            return Ok(());
        }

        let token = self.current_token();
        if token.token_type == TokenType::Eof {
            Err(Self::error_at(
                open,
                format!(
                    "Unbalanced parentheses: '(' at line {}, column {} is never closed",
                    open.line, open.column
                ),
            ))
        } else {
            Err(Self::error_at(
                token,
                format!(
                    "Expected ')' but found {} at line {}, column {}",
                    Self::describe(token),
                    token.line,
                    token.column
                ),
            ))
        }
    }

    /// IDENTIFIER '(' argList? ')'
    fn parse_function_call(&mut self) -> Result<Parsed> {
        let name_token = self.advance();
        let open = self.advance(); // Skip '('

        let mut args = Vec::new();
        let mut arg_depths = Vec::new();
        if !self.current_token_is(TokenType::CloseParen) {
            loop {
                let (arg, arg_depth) = self.parse_expression()?;
                args.push(arg);
                arg_depths.push(arg_depth);
                if self.current_token_is(TokenType::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_close_paren(&open)?;
        let depth = self.node_depth(arg_depths)?;

        let name = name_token.value;
        if name.eq_ignore_ascii_case("IF") && args.len() == 3 {
            let else_branch = args.pop();
            let then_branch = args.pop();
            let condition = args.pop();
            if let (Some(condition), Some(then_branch), Some(else_branch)) =
                (condition, then_branch, else_branch)
            {
                let conditional = AstNode::Conditional {
                    condition: Box::new(condition),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                };
                return Ok((conditional, depth));
            }
        }

        Ok((AstNode::FunctionCall { name, args }, depth))
    }
}
