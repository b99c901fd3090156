use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = rust_decimal::Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = rust_decimal::Decimal;

/// Coverage multiples (e.g., 1.25x DSCR)
pub type Multiple = rust_decimal::Decimal;

/// Debt service is quoted monthly; annual figures are always exactly 12x.
pub const MONTHS_PER_YEAR: Money = dec!(12);

/// Convert a whole-number percentage (7.5) into a rate (0.075).
pub fn percent_to_rate(percent: Money) -> Rate {
    percent / dec!(100)
}

/// Annualize a monthly amount, capping at the decimal range.
pub fn annualize(monthly: Money) -> Money {
    monthly.saturating_mul(MONTHS_PER_YEAR)
}

/// True when a total was capped at the edge of the decimal range.
pub fn is_saturated(value: Money) -> bool {
    value == Money::MAX || value == Money::MIN
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
