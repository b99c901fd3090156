use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::cell;

/// Format output as tables using the tabled crate.
///
/// Scalar fields go in a Field/Value table; each nested object or array of
/// objects (loan terms, category breakdown, years) gets its own titled table.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(results)) = map.get("results") {
                print_rows(results);
            } else if let Some(Value::Object(result)) = map.get("result") {
                print_object(None, result);
                print_envelope_notes(map);
            } else {
                print_object(None, map);
            }
        }
        Value::Array(arr) => print_rows(arr),
        Value::Null => println!("(no record)"),
        other => println!("{}", cell(other)),
    }
}

fn print_object(title: Option<&str>, map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut sections: Vec<(&str, &Value)> = Vec::new();

    for (key, val) in map {
        match val {
            Value::Object(inner) if !inner.is_empty() => sections.push((key.as_str(), val)),
            Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
                sections.push((key.as_str(), val))
            }
            Value::Array(items) => {
                let joined: Vec<String> = items.iter().map(cell).collect();
                builder.push_record([key.as_str(), &joined.join(", ")]);
            }
            _ => {
                builder.push_record([key.as_str(), &display(val)]);
            }
        }
    }

    if let Some(t) = title {
        println!("\n{t}");
    }
    println!("{}", Table::from(builder));

    for (key, val) in sections {
        match val {
            Value::Object(inner) => print_object(Some(key), inner),
            Value::Array(items) => {
                println!("\n{key}");
                print_rows(items);
            }
            _ => {}
        }
    }
}

fn print_rows(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            println!("{}", cell(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(display).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        other => cell(other),
    }
}
