use crate::error::{ExpressionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Variable name to value mapping used for one evaluation.
pub type Bindings = HashMap<String, Value>;

/// Result or binding value: a single number or a column of numbers.
///
/// Deserialises from either a JSON number or a JSON array of numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(f64),
    Array(Vec<f64>),
}

/// Divides `numerator` by `denominator`, first clamping a denominator whose magnitude is below
/// `epsilon` to `epsilon` with the denominator's sign (zero counts as positive).
pub fn protected_divide(numerator: f64, denominator: f64, epsilon: f64) -> f64 {
    let denominator = if denominator.abs() < epsilon {
        if denominator < 0.0 {
            -epsilon
        } else {
            epsilon
        }
    } else {
        denominator
    };
    numerator / denominator
}

impl Value {
    /// Number of elements; a scalar counts as one.
    pub fn len(&self) -> usize {
        match self {
            Value::Scalar(_) => 1,
            Value::Array(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Scalar(_))
    }

    pub fn as_scalar(&self) -> Option<f64> {
        if let Value::Scalar(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    pub fn as_array(&self) -> Option<&[f64]> {
        if let Value::Array(values) = self {
            Some(values)
        } else {
            None
        }
    }

    /// Broadcasts the value to exactly `len` elements.
    pub fn into_vec(self, len: usize) -> Result<Vec<f64>> {
        match self {
            Value::Scalar(value) => Ok(vec![value; len]),
            Value::Array(values) if values.len() == len => Ok(values),
            Value::Array(values) if values.len() == 1 => Ok(vec![values[0]; len]),
            Value::Array(values) => Err(ExpressionError::ShapeMismatch {
                left: values.len(),
                right: len,
            }),
        }
    }

    pub fn map<F>(&self, f: F) -> Value
    where
        F: Fn(f64) -> f64,
    {
        match self {
            Value::Scalar(value) => Value::Scalar(f(*value)),
            Value::Array(values) => Value::Array(values.iter().map(|value| f(*value)).collect()),
        }
    }

    /// Combines two values elementwise with broadcasting: a scalar or a one-element array
    /// stretches to the other operand's length, otherwise lengths must match.
    pub fn zip_with<F>(&self, rhs: &Value, f: F) -> Result<Value>
    where
        F: Fn(f64, f64) -> f64,
    {
        match (self, rhs) {
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(f(*a, *b))),
            (Value::Scalar(a), Value::Array(b)) => {
                Ok(Value::Array(b.iter().map(|b| f(*a, *b)).collect()))
            }
            (Value::Array(a), Value::Scalar(b)) => {
                Ok(Value::Array(a.iter().map(|a| f(*a, *b)).collect()))
            }
            (Value::Array(a), Value::Array(b)) if a.len() == b.len() => Ok(Value::Array(
                a.iter().zip(b.iter()).map(|(a, b)| f(*a, *b)).collect(),
            )),
            (Value::Array(a), Value::Array(b)) if a.len() == 1 => {
                Ok(Value::Array(b.iter().map(|b| f(a[0], *b)).collect()))
            }
            (Value::Array(a), Value::Array(b)) if b.len() == 1 => {
                Ok(Value::Array(a.iter().map(|a| f(*a, b[0])).collect()))
            }
            (Value::Array(a), Value::Array(b)) => Err(ExpressionError::ShapeMismatch {
                left: a.len(),
                right: b.len(),
            }),
        }
    }

    pub fn protected_div(&self, rhs: &Value, epsilon: f64) -> Result<Value> {
        self.zip_with(rhs, |a, b| protected_divide(a, b, epsilon))
    }
}

impl Add for &Value {
    type Output = Result<Value>;

    fn add(self, rhs: Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub for &Value {
    type Output = Result<Value>;

    fn sub(self, rhs: Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl Mul for &Value {
    type Output = Result<Value>;

    fn mul(self, rhs: Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a * b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(value) => write!(f, "{}", value),
            Value::Array(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(value)
    }
}

impl From<Vec<f64>> for Value {
    fn from(values: Vec<f64>) -> Self {
        Value::Array(values)
    }
}

impl From<&[f64]> for Value {
    fn from(values: &[f64]) -> Self {
        Value::Array(values.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Value {
    fn from(values: [f64; N]) -> Self {
        Value::Array(values.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_broadcasts_against_array() {
        let x = Value::from([1.0, 2.0, 3.0]);
        let y = Value::Scalar(10.0);
        assert_eq!((&x + &y).unwrap(), Value::from([11.0, 12.0, 13.0]));
        assert_eq!((&y - &x).unwrap(), Value::from([9.0, 8.0, 7.0]));
    }

    #[test]
    fn test_equal_length_arrays_combine_elementwise() {
        let a = Value::from([1.0, 2.0, 3.0]);
        let b = Value::from([4.0, 5.0, 6.0]);
        assert_eq!((&a * &b).unwrap(), Value::from([4.0, 10.0, 18.0]));
    }

    #[test]
    fn test_single_element_array_broadcasts() {
        let a = Value::from([2.0]);
        let b = Value::from([1.0, 2.0, 3.0]);
        assert_eq!((&a * &b).unwrap(), Value::from([2.0, 4.0, 6.0]));
        assert_eq!((&b - &a).unwrap(), Value::from([-1.0, 0.0, 1.0]));
    }

    #[test]
    fn test_mismatched_lengths_fail() {
        let a = Value::from([1.0, 2.0]);
        let b = Value::from([1.0, 2.0, 3.0]);
        assert_eq!(
            (&a + &b).unwrap_err(),
            ExpressionError::ShapeMismatch { left: 2, right: 3 }
        );
    }

    #[test]
    fn test_scalar_stays_scalar() {
        let result = (&Value::Scalar(1.5) + &Value::Scalar(2.5)).unwrap();
        assert!(result.is_scalar());
        assert_eq!(result.as_scalar(), Some(4.0));
        assert_eq!(result.as_array(), None);
    }

    #[test]
    fn test_protected_divide_clamps_small_denominators() {
        assert_eq!(protected_divide(1.0, 0.0, 1e-10), 1e10);
        assert_eq!(protected_divide(1.0, -0.0, 1e-10), 1e10);
        assert_eq!(protected_divide(1.0, 1e-12, 1e-10), 1e10);
        assert_eq!(protected_divide(1.0, -1e-12, 1e-10), -1e10);
        assert_eq!(protected_divide(6.0, 3.0, 1e-10), 2.0);
        assert!(protected_divide(1.0, f64::NAN, 1e-10).is_nan());
    }

    #[test]
    fn test_protected_div_on_arrays() {
        let numerator = Value::from([1.0, 4.0]);
        let denominator = Value::from([0.0, 2.0]);
        assert_eq!(
            numerator.protected_div(&denominator, 1e-10).unwrap(),
            Value::from([1e10, 2.0])
        );
    }

    #[test]
    fn test_into_vec_broadcasts() {
        assert_eq!(Value::Scalar(2.0).into_vec(3).unwrap(), vec![2.0, 2.0, 2.0]);
        assert_eq!(Value::from([7.0]).into_vec(2).unwrap(), vec![7.0, 7.0]);
        assert_eq!(Value::from([1.0, 2.0]).into_vec(2).unwrap(), vec![1.0, 2.0]);
        assert!(Value::from([1.0, 2.0]).into_vec(3).is_err());
    }

    #[test]
    fn test_len() {
        assert_eq!(Value::Scalar(1.0).len(), 1);
        assert_eq!(Value::from(vec![1.0, 2.0]).len(), 2);
        assert!(Value::Array(Vec::new()).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Scalar(5.0).to_string(), "5");
        assert_eq!(Value::from([1.0, 2.5]).to_string(), "[1, 2.5]");
    }
}
