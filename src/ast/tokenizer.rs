use crate::ast::Operator;
use crate::error::{ExpressionError, Result};
use log::debug;
use pest::Parser;
use pest_derive::Parser;
use std::fmt;

#[derive(Parser)]
#[grammar = "ast/token.pest"]
struct TokenParser;

/// Single-character operators and parentheses.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    LeftParen,
    RightParen,
    Plus,
    Minus,
    Star,
    Slash,
}

impl Symbol {
    pub fn as_char(&self) -> char {
        match self {
            Symbol::LeftParen => '(',
            Symbol::RightParen => ')',
            Symbol::Plus => '+',
            Symbol::Minus => '-',
            Symbol::Star => '*',
            Symbol::Slash => '/',
        }
    }

    /// The binary operator this symbol denotes; `None` for parentheses.
    pub fn operator(&self) -> Option<Operator> {
        match self {
            Symbol::Plus => Some(Operator::Add),
            Symbol::Minus => Some(Operator::Subtract),
            Symbol::Star => Some(Operator::Multiply),
            Symbol::Slash => Some(Operator::Divide),
            Symbol::LeftParen | Symbol::RightParen => None,
        }
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ExpressionError;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "(" => Ok(Symbol::LeftParen),
            ")" => Ok(Symbol::RightParen),
            "+" => Ok(Symbol::Plus),
            "-" => Ok(Symbol::Minus),
            "*" => Ok(Symbol::Star),
            "/" => Ok(Symbol::Slash),
            _ => Err(ExpressionError::Lex {
                expression: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(String),
    Identifier(String),
    Symbol(Symbol),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(text) | Token::Identifier(text) => f.write_str(text),
            Token::Symbol(symbol) => write!(f, "{}", symbol.as_char()),
        }
    }
}

pub struct Tokenizer;

impl Tokenizer {
    /// Splits `input` into tokens. Fails unless the whole input, minus whitespace, is covered
    /// by numbers, identifiers, operators and parentheses.
    pub fn tokenize(input: &str) -> Result<Vec<Token>> {
        debug!("Tokenizing expression: {}", input);
        let stream = TokenParser::parse(Rule::tokens, input)
            .map_err(|e| {
                debug!("Token grammar rejected input: {}", e);
                ExpressionError::Lex {
                    expression: input.to_string(),
                }
            })?
            .next()
            .ok_or_else(|| ExpressionError::Lex {
                expression: input.to_string(),
            })?;

        let mut tokens = Vec::new();
        for pair in stream.into_inner() {
            match pair.as_rule() {
                Rule::number => tokens.push(Token::Number(pair.as_str().to_string())),
                Rule::identifier => tokens.push(Token::Identifier(pair.as_str().to_string())),
                Rule::symbol => tokens.push(Token::Symbol(Symbol::try_from(pair.as_str())?)),
                _ => {}
            }
        }

        debug!("Tokens: {:?}", tokens);
        Ok(tokens)
    }
}
