//! Abstract Syntax Tree (AST) representation
//!
//! The AST mirrors the formula grammar directly, without semantic analysis.
//! Each node owns its children; the tree has no sharing and no cycles.
//!
//! ```text
//! expr       := comparison
//! comparison := additive (('=' | '>' | '<' | '>=' | '<=') additive)*
//! additive   := term (('+' | '-') term)*
//! term       := unary (('*' | '/') unary)*
//! unary      := '-' unary | primary
//! primary    := NUMBER | STRING | IDENTIFIER | IDENTIFIER '(' argList? ')' | '(' expr ')'
//! argList    := expr (',' expr)*
//! ```

use crate::value::Value;
use std::fmt;

/// AST node representing a formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    /// Numeric, string or boolean constant
    Literal { value: Value },

    /// Reference to a schema field
    FieldRef { name: String },

    /// Unary minus applied to a non-literal operand
    Negate { operand: Box<AstNode> },

    /// Binary operator application
    BinaryOp {
        op: BinaryOperator,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },

    /// Function call: NAME '(' args ')'
    FunctionCall { name: String, args: Vec<AstNode> },

    /// Desugared `IF(condition, then, else)`
    Conditional {
        condition: Box<AstNode>,
        then_branch: Box<AstNode>,
        else_branch: Box<AstNode>,
    },
}

impl AstNode {
    pub fn number(n: f64) -> Self {
        AstNode::Literal {
            value: Value::Number(n),
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        AstNode::Literal {
            value: Value::Text(s.into()),
        }
    }

    pub fn boolean(b: bool) -> Self {
        AstNode::Literal {
            value: Value::Boolean(b),
        }
    }

    pub fn field(name: impl Into<String>) -> Self {
        AstNode::FieldRef { name: name.into() }
    }

    pub fn binary(op: BinaryOperator, left: AstNode, right: AstNode) -> Self {
        AstNode::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<AstNode>) -> Self {
        AstNode::FunctionCall {
            name: name.into(),
            args,
        }
    }

    /// True for a numeric literal equal to zero (including `-0`)
    pub fn is_literal_zero(&self) -> bool {
        match self {
            AstNode::Literal {
                value: Value::Number(n),
            } => *n == 0.0,
            AstNode::Negate { operand } => operand.is_literal_zero(),
            _ => false,
        }
    }

    /// Direct children in evaluation order
    pub fn children(&self) -> Vec<&AstNode> {
        match self {
            AstNode::Literal { .. } | AstNode::FieldRef { .. } => Vec::new(),
            AstNode::Negate { operand } => vec![&**operand],
            AstNode::BinaryOp { left, right, .. } => vec![&**left, &**right],
            AstNode::FunctionCall { args, .. } => args.iter().collect(),
            AstNode::Conditional {
                condition,
                then_branch,
                else_branch,
            } => vec![&**condition, &**then_branch, &**else_branch],
        }
    }

    /// Number of nodes on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(AstNode::depth)
            .max()
            .unwrap_or(0)
    }

    /// Field names referenced anywhere in the tree, in first-seen order
    pub fn field_refs(&self) -> Vec<&str> {
        fn walk<'a>(node: &'a AstNode, out: &mut Vec<&'a str>) {
            if let AstNode::FieldRef { name } = node {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            for child in node.children() {
                walk(child, out);
            }
        }

        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }
}

/// Canonical, fully parenthesised rendering
impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Literal { value } => write!(f, "{}", value),
            AstNode::FieldRef { name } => f.write_str(name),
            AstNode::Negate { operand } => write!(f, "-{}", operand),
            AstNode::BinaryOp { op, left, right } => write!(f, "({} {} {})", left, op, right),
            AstNode::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            AstNode::Conditional {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "IF({}, {}, {})", condition, then_branch, else_branch),
        }
    }
}

/// Binary operators, `+ - * / = > < >= <=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Equal => "=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::LessThanOrEqual => "<=",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::GreaterThan
                | BinaryOperator::LessThan
                | BinaryOperator::GreaterThanOrEqual
                | BinaryOperator::LessThanOrEqual
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
