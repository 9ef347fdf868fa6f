use formula_tree::{Bindings, Evaluator, Value};

fn main() {
    pretty_env_logger::init();

    let contexts = vec![
        Bindings::from([
            ("price".to_string(), Value::Scalar(120.0)),
            ("volume".to_string(), Value::Scalar(3000.0)),
        ]),
        Bindings::from([
            ("price".to_string(), Value::from([80.0, 81.5, 79.0])),
            ("volume".to_string(), Value::Scalar(6000.0)),
        ]),
        Bindings::from([("price".to_string(), Value::Scalar(95.0))]),
    ];

    let expression = "price * volume / 1000";

    let evaluator = Evaluator::default();
    let tree = evaluator.parse_expression(expression).unwrap();
    for (i, result) in evaluator.evaluate_batch(&tree, &contexts).iter().enumerate() {
        match result {
            Ok(value) => println!("Result {}: {}", i, value),
            Err(err) => println!("Result {}: {}", i, err),
        }
    }
}
