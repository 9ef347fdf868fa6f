use crate::ast::{Bindings, Grammar, Node, NodeValue, Value};
use crate::error::{ExpressionError, Result};
use log::{debug, trace, warn};
use lru::LruCache;
use rayon::prelude::*;
use std::borrow::Cow;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Smallest denominator magnitude used by division.
pub const DEFAULT_EPSILON: f64 = 1e-10;

/// Number of parsed trees kept by [`Evaluator::evaluate_expression`].
pub const DEFAULT_CACHE_SIZE: usize = 100;

pub struct Evaluator {
    grammar: Grammar,
    epsilon: f64,
    trees: LruCache<String, Arc<Node>>,
}

impl Default for Evaluator {
    fn default() -> Self {
        EvaluatorBuilder::new().build()
    }
}

impl Evaluator {
    /// Creates an `Evaluator` with the default grammar and epsilon, remembering up to
    /// `max_cache_size` parsed expressions.
    pub fn new(max_cache_size: usize) -> Self {
        EvaluatorBuilder::new().cache_size(max_cache_size).build()
    }

    pub fn builder() -> EvaluatorBuilder {
        EvaluatorBuilder::new()
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Parse an expression string into a tree.
    pub fn parse_expression(&self, expression: &str) -> Result<Node> {
        self.grammar.parse(expression)
    }

    /// Evaluates an expression string against `bindings`.
    ///
    /// Parsed trees are kept in an LRU cache keyed by the expression text, so evaluating the
    /// same formula against many binding sets parses it once.
    pub fn evaluate_expression(&mut self, expression: &str, bindings: &Bindings) -> Result<Value> {
        let tree = match self.trees.get(expression) {
            Some(tree) => {
                trace!("Parsed tree cache hit: {}", expression);
                Arc::clone(tree)
            }
            None => {
                let tree = Arc::new(self.parse_expression(expression)?);
                self.trees.put(expression.to_string(), Arc::clone(&tree));
                tree
            }
        };

        self.evaluate(&tree, bindings)
    }

    /// Evaluates a parsed tree against `bindings`.
    ///
    /// A scalar result is returned as [`Value::Scalar`], anything involving an array binding
    /// as [`Value::Array`].
    pub fn evaluate(&self, root: &Node, bindings: &Bindings) -> Result<Value> {
        evaluate_tree(root, bindings, self.epsilon)
    }

    /// Evaluates one tree against several independent binding sets in parallel.
    pub fn evaluate_batch(&self, root: &Node, batch: &[Bindings]) -> Vec<Result<Value>> {
        let epsilon = self.epsilon;
        debug!("Evaluating {} binding sets", batch.len());
        batch
            .par_iter()
            .map(|bindings| evaluate_tree(root, bindings, epsilon))
            .collect()
    }
}

/// Walks the tree post-order with an explicit stack instead of recursion.
///
/// A node whose children are not yet computed is pushed back under its children, so it is
/// revisited once they are done. Computed values are cached by node address for the duration
/// of this call only.
pub(crate) fn evaluate_tree(root: &Node, bindings: &Bindings, epsilon: f64) -> Result<Value> {
    let mut cache: HashMap<*const Node, Cow<'_, Value>> = HashMap::new();
    let mut stack: Vec<&Node> = vec![root];

    while let Some(node) = stack.pop() {
        let key: *const Node = node;
        if cache.contains_key(&key) {
            continue;
        }

        let value = match (&node.value, node.left(), node.right()) {
            (NodeValue::Constant(constant), None, None) => Cow::Owned(Value::Scalar(*constant)),
            (NodeValue::Variable(name), None, None) => {
                let value = bindings
                    .get(name)
                    .ok_or_else(|| ExpressionError::UnboundVariable(name.clone()))?;
                Cow::Borrowed(value)
            }
            (NodeValue::Function(function), Some(operand), None) => {
                match cache.get(&(operand as *const Node)) {
                    Some(argument) => Cow::Owned(function.apply(argument)),
                    None => {
                        stack.push(node);
                        stack.push(operand);
                        continue;
                    }
                }
            }
            (NodeValue::Operator(operator), Some(left), Some(right)) => {
                match (
                    cache.get(&(left as *const Node)),
                    cache.get(&(right as *const Node)),
                ) {
                    (Some(a), Some(b)) => Cow::Owned(operator.apply(a, b, epsilon)?),
                    _ => {
                        stack.push(node);
                        stack.push(right);
                        stack.push(left);
                        continue;
                    }
                }
            }
            _ => return Err(ExpressionError::UnknownNode(node.value.to_string())),
        };

        trace!("{} = {:?}", node.value, value);
        cache.insert(key, value);
    }

    let result = cache
        .remove(&(root as *const Node))
        .map(Cow::into_owned)
        .ok_or_else(|| ExpressionError::UnknownNode(root.value.to_string()))?;

    debug!(
        "Evaluated to {}",
        if result.is_scalar() { "scalar" } else { "array" }
    );
    Ok(result)
}

/// Configures an [`Evaluator`].
#[derive(Debug, Clone)]
pub struct EvaluatorBuilder {
    grammar: Grammar,
    epsilon: f64,
    cache_size: usize,
}

impl Default for EvaluatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluatorBuilder {
    pub fn new() -> Self {
        Self {
            grammar: Grammar::default(),
            epsilon: DEFAULT_EPSILON,
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }

    pub fn grammar(mut self, grammar: Grammar) -> Self {
        self.grammar = grammar;
        self
    }

    /// Must be finite and positive; anything else falls back to [`DEFAULT_EPSILON`] on build.
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// A size of zero still keeps the most recent tree.
    pub fn cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    pub fn build(self) -> Evaluator {
        let capacity = NonZeroUsize::new(self.cache_size).unwrap_or(NonZeroUsize::MIN);
        let epsilon = if self.epsilon.is_finite() && self.epsilon > 0.0 {
            self.epsilon
        } else {
            warn!(
                "Invalid epsilon {}, using default {}",
                self.epsilon, DEFAULT_EPSILON
            );
            DEFAULT_EPSILON
        };

        Evaluator {
            grammar: self.grammar,
            epsilon,
            trees: LruCache::new(capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Function, Operator};

    fn bindings(pairs: &[(&str, Value)]) -> Bindings {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_simple_binary_expression() {
        let mut evaluator = Evaluator::new(100);
        let context = bindings(&[("price", Value::Scalar(100.0)), ("volume", Value::Scalar(50.0))]);

        assert_eq!(
            evaluator.evaluate_expression("price + volume", &context).unwrap(),
            Value::Scalar(150.0)
        );
        assert_eq!(
            evaluator.evaluate_expression("price - volume", &context).unwrap(),
            Value::Scalar(50.0)
        );
        assert_eq!(
            evaluator.evaluate_expression("price * volume", &context).unwrap(),
            Value::Scalar(5000.0)
        );
        assert_eq!(
            evaluator.evaluate_expression("price / volume", &context).unwrap(),
            Value::Scalar(2.0)
        );
    }

    #[test]
    fn test_example_expression() {
        let mut evaluator = Evaluator::default();
        let context = bindings(&[("x", Value::Scalar(9.0)), ("y", Value::Scalar(4.0))]);
        assert_eq!(
            evaluator.evaluate_expression("sqrt(x) + y/2", &context).unwrap(),
            Value::Scalar(5.0)
        );
    }

    #[test]
    fn test_broadcasting() {
        let mut evaluator = Evaluator::default();
        let context = bindings(&[("x", Value::from([1.0, 2.0, 3.0])), ("y", Value::Scalar(10.0))]);
        assert_eq!(
            evaluator.evaluate_expression("x + y", &context).unwrap(),
            Value::from([11.0, 12.0, 13.0])
        );
    }

    #[test]
    fn test_mismatched_arrays() {
        let mut evaluator = Evaluator::default();
        let context = bindings(&[("x", Value::from([1.0, 2.0])), ("y", Value::from([1.0, 2.0, 3.0]))]);
        assert_eq!(
            evaluator.evaluate_expression("x * y", &context),
            Err(ExpressionError::ShapeMismatch { left: 2, right: 3 })
        );
    }

    #[test]
    fn test_unbound_variable() {
        let mut evaluator = Evaluator::default();
        assert_eq!(
            evaluator.evaluate_expression("x + 1", &Bindings::new()),
            Err(ExpressionError::UnboundVariable("x".to_string()))
        );
    }

    #[test]
    fn test_division_is_protected() {
        let mut evaluator = Evaluator::default();
        let context = bindings(&[("x", Value::Scalar(0.0))]);
        let result = evaluator.evaluate_expression("1/x", &context).unwrap();
        assert_eq!(result, Value::Scalar(1e10));
    }

    #[test]
    fn test_custom_epsilon() {
        let evaluator = Evaluator::builder().epsilon(0.25).build();
        let tree = evaluator.parse_expression("1 / 0").unwrap();
        assert_eq!(evaluator.evaluate(&tree, &Bindings::new()).unwrap(), Value::Scalar(4.0));
        assert_eq!(evaluator.epsilon(), 0.25);
    }

    #[test]
    fn test_invalid_epsilon_falls_back_to_default() {
        for epsilon in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let evaluator = Evaluator::builder().epsilon(epsilon).build();
            assert_eq!(evaluator.epsilon(), DEFAULT_EPSILON);

            let tree = evaluator.parse_expression("1 / 0").unwrap();
            assert_eq!(
                evaluator.evaluate(&tree, &Bindings::new()).unwrap(),
                Value::Scalar(1e10)
            );
        }
    }

    #[test]
    fn test_custom_grammar() {
        let evaluator = Evaluator::builder()
            .grammar(Grammar::new().without_function(Function::Cos))
            .build();
        let tree = evaluator.parse_expression("cos * 2").unwrap();
        let context = bindings(&[("cos", Value::Scalar(3.0))]);
        assert_eq!(evaluator.evaluate(&tree, &context).unwrap(), Value::Scalar(6.0));
        assert!(!evaluator.grammar().is_function("cos"));
    }

    #[test]
    fn test_repeated_evaluation_is_independent() {
        let evaluator = Evaluator::default();
        let tree = evaluator.parse_expression("a * (b + a)").unwrap();

        let first = bindings(&[("a", Value::Scalar(2.0)), ("b", Value::Scalar(3.0))]);
        let second = bindings(&[("a", Value::Scalar(-1.0)), ("b", Value::Scalar(5.0))]);

        assert_eq!(evaluator.evaluate(&tree, &first).unwrap(), Value::Scalar(10.0));
        assert_eq!(evaluator.evaluate(&tree, &second).unwrap(), Value::Scalar(-4.0));
        assert_eq!(evaluator.evaluate(&tree, &first).unwrap(), Value::Scalar(10.0));
    }

    #[test]
    fn test_tree_cache_reuses_parse() {
        let mut evaluator = Evaluator::new(1);
        let context = bindings(&[("x", Value::Scalar(2.0))]);

        assert_eq!(evaluator.evaluate_expression("x * x", &context).unwrap(), Value::Scalar(4.0));
        assert_eq!(evaluator.trees.len(), 1);
        assert_eq!(evaluator.evaluate_expression("x * x", &context).unwrap(), Value::Scalar(4.0));
        assert_eq!(evaluator.evaluate_expression("x + x", &context).unwrap(), Value::Scalar(4.0));
        assert_eq!(evaluator.trees.len(), 1);
        assert!(evaluator.trees.contains("x + x"));
    }

    #[test]
    fn test_parse_errors_are_not_cached() {
        let mut evaluator = Evaluator::default();
        assert!(evaluator.evaluate_expression("x +", &Bindings::new()).is_err());
        assert!(evaluator.trees.is_empty());
    }

    #[test]
    fn test_batch_evaluation() {
        let evaluator = Evaluator::default();
        let tree = evaluator.parse_expression("price * 2").unwrap();
        let batch = vec![
            bindings(&[("price", Value::Scalar(1.0))]),
            bindings(&[("price", Value::from([1.0, 2.0]))]),
            Bindings::new(),
        ];

        let results = evaluator.evaluate_batch(&tree, &batch);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Ok(Value::Scalar(2.0)));
        assert_eq!(results[1], Ok(Value::from([2.0, 4.0])));
        assert_eq!(results[2], Err(ExpressionError::UnboundVariable("price".into())));
    }

    #[test]
    fn test_malformed_node_is_unknown() {
        let node = Node {
            value: NodeValue::Operator(Operator::Add),
            left: Some(Box::new(Node::constant(1.0))),
            right: None,
        };
        assert_eq!(
            Evaluator::default().evaluate(&node, &Bindings::new()),
            Err(ExpressionError::UnknownNode("+".to_string()))
        );

        let leaf_function = Node {
            value: NodeValue::Function(Function::Sqrt),
            left: None,
            right: None,
        };
        assert!(matches!(
            Evaluator::default().evaluate(&leaf_function, &Bindings::new()),
            Err(ExpressionError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let mut tree = Node::constant(0.0);
        for _ in 0..100_000 {
            tree = Node::binary(Operator::Add, tree, Node::variable("x"));
        }
        let context = bindings(&[("x", Value::Scalar(1.0))]);
        assert_eq!(
            Evaluator::default().evaluate(&tree, &context).unwrap(),
            Value::Scalar(100_000.0)
        );
    }

    #[test]
    fn test_shared_names_cached_per_node() {
        // Each `x` leaf is its own node; both must resolve.
        let evaluator = Evaluator::default();
        let tree = evaluator.parse_expression("x - x / x").unwrap();
        let context = bindings(&[("x", Value::from([2.0, 4.0]))]);
        assert_eq!(evaluator.evaluate(&tree, &context).unwrap(), Value::from([1.0, 3.0]));
    }
}
