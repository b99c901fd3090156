use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use advisory_core::debt::{analyze_debts, DebtAnalysisInput, DebtCategory, DebtRecord};

use crate::input;

/// Arguments for debt schedule aggregation
#[derive(Args)]
pub struct DebtSummaryArgs {
    /// Path to JSON input file: `{"debts": [...]}` or a bare list (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Add a debt as CATEGORY:MONTHLY:ORIGINAL:BALANCE (repeatable)
    #[arg(long = "debt", value_parser = parse_debt_flag)]
    pub debts: Vec<DebtRecord>,
}

/// Parse `CREDIT_CARD:50:1000:500`. Amounts must be plain numbers here;
/// formatted text belongs in JSON input.
fn parse_debt_flag(raw: &str) -> Result<DebtRecord, String> {
    let parts: Vec<&str> = raw.split(':').collect();
    let [category, monthly, original, balance] = parts.as_slice() else {
        return Err(format!(
            "expected CATEGORY:MONTHLY:ORIGINAL:BALANCE, got '{raw}'"
        ));
    };
    let category = DebtCategory::parse(category)
        .known()
        .ok_or_else(|| format!("unknown category '{category}'"))?;
    Ok(DebtRecord::new(
        category,
        amount(monthly, "monthly payment")?,
        amount(original, "original amount")?,
        amount(balance, "balance")?,
    ))
}

fn amount(s: &str, name: &str) -> Result<Decimal, String> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|e| format!("{name} '{s}': {e}"))
}

pub fn run_debt_summary(args: DebtSummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let debt_input = match input::read_input_value(args.input.as_deref())? {
        Some(Value::Array(items)) => DebtAnalysisInput {
            debts: serde_json::from_value(Value::Array(items))?,
        },
        Some(data) => serde_json::from_value(data)?,
        None if !args.debts.is_empty() => DebtAnalysisInput { debts: args.debts },
        None => return Err("--debt is required (or provide --input)".into()),
    };

    let result = analyze_debts(&debt_input);
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisory_core::debt::CategoryTag;

    #[test]
    fn test_parse_debt_flag() {
        let d = parse_debt_flag("credit_card:50:1000:500").unwrap();
        assert_eq!(d.category, CategoryTag::Known(DebtCategory::CreditCard));
        assert_eq!(d.monthly_payment, Decimal::from(50));
        assert_eq!(d.outstanding_balance, Decimal::from(500));
    }

    #[test]
    fn test_parse_debt_flag_rejects_bad_input() {
        assert!(parse_debt_flag("CREDIT_CARD:50:1000").is_err());
        assert!(parse_debt_flag("BOAT:1:2:3").is_err());
        assert!(parse_debt_flag("OTHER:x:2:3").is_err());
    }
}
