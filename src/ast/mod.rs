use std::collections::HashSet;
use std::fmt;

mod builder;
mod evaluator;
mod grammar;
mod operator;
mod postfix;
mod tokenizer;
mod value;

pub use builder::TreeBuilder;
pub use evaluator::*;
pub(crate) use evaluator::evaluate_tree;
pub use grammar::Grammar;
pub use operator::{Function, Operator};
pub use postfix::PostfixTranslator;
pub use tokenizer::{Symbol, Token, Tokenizer};
pub use value::*;

/// Payload of an expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Constant(f64),
    Variable(String),
    Operator(Operator),
    Function(Function),
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeValue::Constant(value) => write!(f, "{:?}", value),
            NodeValue::Variable(name) => f.write_str(name),
            NodeValue::Operator(operator) => write!(f, "{}", operator.symbol()),
            NodeValue::Function(function) => f.write_str(function.name()),
        }
    }
}

/// A node of the binary expression tree.
///
/// Leaves hold constants or variable names, unary function nodes hold their operand in
/// `left`, and binary operator nodes hold both children. Outside the crate the constructors
/// below are the only way to build a node, so every tree handed out has one of these shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) value: NodeValue,
    pub(crate) left: Option<Box<Node>>,
    pub(crate) right: Option<Box<Node>>,
}

impl Node {
    pub fn constant(value: f64) -> Self {
        Self {
            value: NodeValue::Constant(value),
            left: None,
            right: None,
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self {
            value: NodeValue::Variable(name.into()),
            left: None,
            right: None,
        }
    }

    pub fn unary(function: Function, operand: Node) -> Self {
        Self {
            value: NodeValue::Function(function),
            left: Some(Box::new(operand)),
            right: None,
        }
    }

    pub fn binary(operator: Operator, left: Node, right: Node) -> Self {
        Self {
            value: NodeValue::Operator(operator),
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    pub fn left(&self) -> Option<&Node> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&Node> {
        self.right.as_deref()
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Distinct variable names referenced by the tree, in left-to-right order of first use.
    pub fn variables(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            if let NodeValue::Variable(name) = &node.value {
                if seen.insert(name.as_str()) {
                    names.push(name.as_str());
                }
            }
            stack.extend(node.right());
            stack.extend(node.left());
        }

        names
    }
}

// Long operator chains build very deep trees; the default recursive drop would overflow.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending: Vec<Box<Node>> = Vec::new();
        pending.extend(self.left.take());
        pending.extend(self.right.take());

        while let Some(mut node) = pending.pop() {
            pending.extend(node.left.take());
            pending.extend(node.right.take());
        }
    }
}

/// Renders the tree as fully parenthesised infix text, e.g. `(sqrt(x) + (y / 2.0))`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        enum Piece<'a> {
            Node(&'a Node),
            Value(&'a NodeValue),
            Text(&'static str),
        }

        let mut stack = vec![Piece::Node(self)];
        while let Some(piece) = stack.pop() {
            let node = match piece {
                Piece::Node(node) => node,
                Piece::Value(value) => {
                    write!(f, "{}", value)?;
                    continue;
                }
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
            };

            match (node.left(), node.right()) {
                (Some(left), Some(right)) => {
                    stack.push(Piece::Text(")"));
                    stack.push(Piece::Node(right));
                    stack.push(Piece::Text(" "));
                    stack.push(Piece::Value(&node.value));
                    stack.push(Piece::Text(" "));
                    stack.push(Piece::Node(left));
                    f.write_str("(")?;
                }
                (Some(operand), None) => {
                    stack.push(Piece::Text(")"));
                    stack.push(Piece::Node(operand));
                    write!(f, "{}(", node.value)?;
                }
                _ => write!(f, "{}", node.value)?,
            }
        }

        Ok(())
    }
}
