use serde_json::{Map, Value};
use std::io;

use super::cell;

/// Write output as CSV to stdout.
///
/// Envelopes print their `result` as field/value rows; a `results` array or
/// a bare array prints one row per element. Nested arrays of objects (the
/// per-category breakdown) follow as their own block after a blank line.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            if let Some(Value::Array(results)) = map.get("results") {
                write_rows(&mut wtr, results);
            } else if let Some(Value::Object(result)) = map.get("result") {
                write_fields(&mut wtr, result);
            } else {
                write_fields(&mut wtr, map);
            }
        }
        Value::Array(arr) => write_rows(&mut wtr, arr),
        Value::Null => {}
        other => {
            let _ = wtr.write_record([cell(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_fields(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    let mut nested = Vec::new();
    for (key, val) in map {
        match val {
            Value::Array(items) if items.iter().all(Value::is_object) && !items.is_empty() => {
                nested.push(items)
            }
            _ => {
                let _ = wtr.write_record([key.as_str(), &cell(val)]);
            }
        }
    }
    for items in nested {
        let _ = wtr.write_record([""]);
        write_rows(wtr, items);
    }
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([cell(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(cell).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
