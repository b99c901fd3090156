use clap::Args;
use serde_json::{json, Value};

use advisory_core::currency::parse_currency_str;

use crate::input;

/// Arguments for currency parsing
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ParseCurrencyArgs {
    /// Values to parse, e.g. "$1,234.50" (read from stdin, one per line, when omitted)
    pub values: Vec<String>,
}

pub fn run_parse_currency(args: ParseCurrencyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let values = if args.values.is_empty() {
        input::stdin::read_stdin_lines()?
    } else {
        args.values
    };
    if values.is_empty() {
        return Err("at least one value is required (as arguments or on stdin)".into());
    }

    let results: Vec<Value> = values
        .iter()
        .map(|raw| json!({ "input": raw, "amount": parse_currency_str(raw) }))
        .collect();
    Ok(json!({ "results": results }))
}
