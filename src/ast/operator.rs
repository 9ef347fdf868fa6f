use crate::ast::Value;
use crate::error::{ExpressionError, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    pub const ALL: [Operator; 4] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
    ];

    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
        }
    }

    /// Binding strength used by [`Grammar::default`]: `+ -` at 2, `* /` at 3.
    ///
    /// [`Grammar::default`]: crate::ast::Grammar
    pub fn default_precedence(&self) -> u8 {
        match self {
            Operator::Add | Operator::Subtract => 2,
            Operator::Multiply | Operator::Divide => 3,
        }
    }

    /// Applies the operator elementwise. Division is protected: see [`protected_divide`].
    ///
    /// [`protected_divide`]: crate::ast::protected_divide
    pub fn apply(&self, left: &Value, right: &Value, epsilon: f64) -> Result<Value> {
        match self {
            Operator::Add => left + right,
            Operator::Subtract => left - right,
            Operator::Multiply => left * right,
            Operator::Divide => left.protected_div(right, epsilon),
        }
    }
}

impl TryFrom<&str> for Operator {
    type Error = ExpressionError;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Subtract),
            "*" => Ok(Operator::Multiply),
            "/" => Ok(Operator::Divide),
            _ => Err(ExpressionError::syntax(format!("unknown operator {:?}", value))),
        }
    }
}

/// Unary functions callable from an expression.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Function {
    Sqrt,
    Sin,
    Cos,
}

impl Function {
    pub const ALL: [Function; 3] = [Function::Sqrt, Function::Sin, Function::Cos];

    pub fn name(&self) -> &'static str {
        match self {
            Function::Sqrt => "sqrt",
            Function::Sin => "sin",
            Function::Cos => "cos",
        }
    }

    /// `sqrt` clamps negative inputs to zero instead of producing NaN.
    pub fn apply_scalar(&self, x: f64) -> f64 {
        match self {
            Function::Sqrt => {
                if x < 0.0 {
                    0.0
                } else {
                    x.sqrt()
                }
            }
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
        }
    }

    pub fn apply(&self, value: &Value) -> Value {
        value.map(|x| self.apply_scalar(x))
    }
}

impl TryFrom<&str> for Function {
    type Error = ExpressionError;

    fn try_from(value: &str) -> Result<Self> {
        Function::ALL
            .into_iter()
            .find(|function| function.name() == value)
            .ok_or_else(|| ExpressionError::syntax(format!("unknown function {:?}", value)))
    }
}
