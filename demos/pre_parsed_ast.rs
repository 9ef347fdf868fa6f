use formula_tree::{Bindings, Evaluator, Value};

fn main() {
    pretty_env_logger::init();

    let evaluator = Evaluator::default();

    let expression = "sin(t) * amplitude + offset";
    let tree = evaluator
        .parse_expression(expression)
        .expect("Failed to parse");
    println!("Tree: {}", tree);
    println!("Variables: {:?}", tree.variables());

    for amplitude in [1.0, 2.5] {
        let context = Bindings::from([
            ("t".to_string(), Value::from([0.0, 0.5, 1.0, 1.5])),
            ("amplitude".to_string(), Value::Scalar(amplitude)),
            ("offset".to_string(), Value::Scalar(0.1)),
        ]);

        match evaluator.evaluate(&tree, &context) {
            Ok(result) => println!("amplitude {}: {}", amplitude, result),
            Err(err) => println!("Error: {}", err),
        }
    }
}
