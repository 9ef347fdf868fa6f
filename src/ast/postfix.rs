use crate::ast::{Grammar, Symbol, Token};
use crate::error::{ExpressionError, Result};
use log::debug;

/// Shunting-yard translation from infix tokens to postfix order.
pub struct PostfixTranslator<'a> {
    grammar: &'a Grammar,
}

impl<'a> PostfixTranslator<'a> {
    pub fn new(grammar: &'a Grammar) -> Self {
        Self { grammar }
    }

    /// Reorders `tokens` into postfix form, dropping parentheses.
    ///
    /// Operators of equal precedence are left-associative, so `a - b - c` becomes `a b - c -`.
    /// A function name waits on the operator stack until its argument is complete.
    pub fn translate(&self, tokens: Vec<Token>) -> Result<Vec<Token>> {
        let mut output = Vec::with_capacity(tokens.len());
        let mut stack: Vec<Token> = Vec::new();

        for token in tokens {
            let is_function =
                matches!(&token, Token::Identifier(name) if self.grammar.is_function(name));

            match token {
                Token::Identifier(_) if is_function => stack.push(token),
                Token::Number(_) | Token::Identifier(_) => output.push(token),
                Token::Symbol(Symbol::LeftParen) => stack.push(token),
                Token::Symbol(Symbol::RightParen) => {
                    loop {
                        match stack.pop() {
                            Some(Token::Symbol(Symbol::LeftParen)) => break,
                            Some(entry) => output.push(entry),
                            None => return Err(Self::mismatched()),
                        }
                    }
                    if self.function_on_top(&stack) {
                        output.extend(stack.pop());
                    }
                }
                Token::Symbol(symbol) => {
                    while self.pops_before(&stack, symbol) {
                        output.extend(stack.pop());
                    }
                    stack.push(token);
                }
            }
        }

        while let Some(entry) = stack.pop() {
            if let Token::Symbol(Symbol::LeftParen | Symbol::RightParen) = entry {
                return Err(Self::mismatched());
            }
            output.push(entry);
        }

        debug!(
            "Postfix: {}",
            output
                .iter()
                .map(|token| token.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        );
        Ok(output)
    }

    fn function_on_top(&self, stack: &[Token]) -> bool {
        matches!(stack.last(), Some(Token::Identifier(name)) if self.grammar.is_function(name))
    }

    /// Whether the stack top must move to the output before `incoming` is pushed.
    fn pops_before(&self, stack: &[Token], incoming: Symbol) -> bool {
        let Some(incoming) = incoming.operator() else {
            return false;
        };

        match stack.last() {
            Some(Token::Identifier(_)) => true,
            Some(Token::Symbol(top)) => top.operator().map_or(false, |top| {
                self.grammar.precedence(top) >= self.grammar.precedence(incoming)
            }),
            _ => false,
        }
    }

    fn mismatched() -> ExpressionError {
        ExpressionError::syntax("mismatched parentheses")
    }
}
