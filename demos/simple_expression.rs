use formula_tree::{Bindings, Evaluator, Value};
use log::debug;

fn main() {
    pretty_env_logger::init();

    let mut evaluator = Evaluator::new(10);

    let context = Bindings::from([
        ("x".to_string(), Value::Scalar(9.0)),
        ("y".to_string(), Value::Scalar(4.0)),
    ]);

    for expression in ["sqrt(x) + y/2", "10 - 3 - 2", "1 / (x - 9)", "sqrt(y - x)", "x & y"] {
        debug!("Evaluating {}", expression);
        match evaluator.evaluate_expression(expression, &context) {
            Ok(result) => println!("{} = {}", expression, result),
            Err(err) => println!("{}: {}", expression, err),
        }
    }
}
