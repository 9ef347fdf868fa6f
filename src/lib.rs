pub mod ast;
pub mod error;

pub use ast::{
    Bindings, Evaluator, EvaluatorBuilder, Function, Grammar, Node, NodeValue, Operator, Value,
};
pub use error::{ExpressionError, Result};

/// Parses `expression` with the default grammar (`sqrt`, `sin`, `cos`, `+ - * /`).
pub fn parse_expression(expression: &str) -> Result<Node> {
    Grammar::default().parse(expression)
}

/// Parses and evaluates `expression` against `bindings`.
pub fn evaluate_expression(expression: &str, bindings: &Bindings) -> Result<Value> {
    let tree = parse_expression(expression)?;
    ast::evaluate_tree(&tree, bindings, ast::DEFAULT_EPSILON)
}
