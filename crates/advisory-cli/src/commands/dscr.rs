use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

use advisory_core::dscr::{self, DscrInput};

use crate::input;

/// Arguments for DSCR calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DscrArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// EBITDA for a period, as LABEL=AMOUNT (e.g. 2024=250000, "2025 ytd=90000")
    #[arg(long = "ebitda", value_parser = parse_period)]
    pub ebitda: Vec<(String, Decimal)>,

    /// Existing annual debt service
    #[arg(long)]
    pub existing_debt_service: Option<Decimal>,

    /// Annual payment on the new loan
    #[arg(long)]
    pub new_loan_payment: Option<Decimal>,
}

fn parse_period(raw: &str) -> Result<(String, Decimal), String> {
    let (label, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=AMOUNT, got '{raw}'"))?;
    let amount = amount
        .trim()
        .parse::<Decimal>()
        .map_err(|e| format!("EBITDA '{amount}': {e}"))?;
    Ok((label.trim().to_string(), amount))
}

pub fn run_dscr(args: DscrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dscr_input: DscrInput = match input::read_input(args.input.as_deref())? {
        Some(data) => data,
        None => {
            if args.ebitda.is_empty() {
                return Err("--ebitda is required (or provide --input)".into());
            }
            let mut financials = Map::new();
            for (label, amount) in &args.ebitda {
                financials.insert(label.clone(), json!({ "summary": { "ebitda": amount } }));
            }
            DscrInput {
                financials: Value::Object(financials),
                existing_annual_debt_service: args.existing_debt_service,
                new_loan_annual_payment: args.new_loan_payment,
                ..DscrInput::default()
            }
        }
    };

    let result = dscr::analyze_dscr(&dscr_input)?;
    Ok(serde_json::to_value(result)?)
}
