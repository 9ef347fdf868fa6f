use crate::ast::{Grammar, Node, Token};
use crate::error::{ExpressionError, Result};

/// Builds an expression tree from a postfix token sequence.
pub struct TreeBuilder<'a> {
    grammar: &'a Grammar,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(grammar: &'a Grammar) -> Self {
        Self { grammar }
    }

    pub fn build(&self, postfix: Vec<Token>) -> Result<Node> {
        let mut stack: Vec<Node> = Vec::new();

        for token in postfix {
            match token {
                Token::Identifier(name) => match self.grammar.function(&name) {
                    Some(function) => {
                        let operand = stack.pop().ok_or_else(|| {
                            ExpressionError::syntax(format!("function {} without operand", name))
                        })?;
                        stack.push(Node::unary(function, operand));
                    }
                    None => stack.push(Self::leaf(name)),
                },
                Token::Symbol(symbol) => {
                    let operator = symbol.operator().ok_or_else(|| {
                        ExpressionError::syntax(format!("unexpected {} in postfix", symbol.as_char()))
                    })?;
                    let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                        return Err(ExpressionError::syntax(format!(
                            "operator {} without two operands",
                            operator.symbol()
                        )));
                    };
                    stack.push(Node::binary(operator, left, right));
                }
                Token::Number(text) => stack.push(Self::leaf(text)),
            }
        }

        match (stack.pop(), stack.is_empty()) {
            (Some(root), true) => Ok(root),
            (None, _) => Err(ExpressionError::syntax("empty expression")),
            (Some(_), false) => Err(ExpressionError::syntax(format!(
                "invalid expression: {} operands left without an operator",
                stack.len() + 1
            ))),
        }
    }

    // Anything that reads as a float (including `inf` and `nan`) is a constant.
    fn leaf(text: String) -> Node {
        match text.parse::<f64>() {
            Ok(value) => Node::constant(value),
            Err(_) => Node::variable(text),
        }
    }
}
