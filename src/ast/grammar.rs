use crate::ast::{Function, Node, Operator, PostfixTranslator, Tokenizer, TreeBuilder};
use crate::error::Result;
use log::debug;
use std::collections::HashMap;

/// Function and operator tables used to parse expressions.
///
/// The default grammar knows `sqrt`, `sin` and `cos`, with `+`/`-` at precedence 2 and
/// `*`/`/` at precedence 3. A function name always shadows a variable of the same name.
#[derive(Debug, Clone)]
pub struct Grammar {
    functions: HashMap<&'static str, Function>,
    precedence: HashMap<Operator, u8>,
}

impl Default for Grammar {
    fn default() -> Self {
        let functions = Function::ALL
            .into_iter()
            .map(|function| (function.name(), function))
            .collect();
        let precedence = Operator::ALL
            .into_iter()
            .map(|operator| (operator, operator.default_precedence()))
            .collect();

        Self {
            functions,
            precedence,
        }
    }
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes `function` from the grammar; its name then parses as an ordinary variable.
    pub fn without_function(mut self, function: Function) -> Self {
        self.functions.remove(function.name());
        self
    }

    pub fn with_precedence(mut self, operator: Operator, precedence: u8) -> Self {
        self.precedence.insert(operator, precedence);
        self
    }

    pub fn function(&self, name: &str) -> Option<Function> {
        self.functions.get(name).copied()
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn precedence(&self, operator: Operator) -> u8 {
        self.precedence.get(&operator).copied().unwrap_or(0)
    }

    /// Parses `expression` into a tree: tokenize, translate to postfix, build.
    pub fn parse(&self, expression: &str) -> Result<Node> {
        debug!("Parsing expression: {}", expression);
        let tokens = Tokenizer::tokenize(expression)?;
        let postfix = PostfixTranslator::new(self).translate(tokens)?;
        let tree = TreeBuilder::new(self).build(postfix)?;
        debug!("Parsed tree: {}", tree);
        Ok(tree)
    }
}
