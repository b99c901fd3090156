use serde_json::Value;

use super::cell;

/// Headline figures, most telling first.
const PRIORITY_KEYS: [&str; 6] = [
    "dscr",
    "credit_utilization_rate",
    "annual_debt_service",
    "monthly_debt_service",
    "amount",
    "id",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result_obj {
        Value::Null => println!("null"),
        Value::Object(map) => {
            if let Some(Value::Array(results)) = map.get("results") {
                for item in results {
                    println!("{}", headline(item));
                }
                return;
            }
            println!("{}", headline(result_obj));
        }
        other => println!("{}", cell(other)),
    }
}

fn headline(value: &Value) -> String {
    let Value::Object(map) = value else {
        return cell(value);
    };
    for key in PRIORITY_KEYS {
        if let Some(val) = map.get(key) {
            if !val.is_null() {
                return cell(val);
            }
        }
    }
    // no headline figure: a DSCR that could not be computed lands here
    if map.contains_key("dscr") {
        return "null".to_string();
    }
    map.iter()
        .next()
        .map(|(k, v)| format!("{k}: {}", cell(v)))
        .unwrap_or_default()
}
