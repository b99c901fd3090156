//! Recognition of the persisted shapes a record has gone through.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::currency::{lenient_money, lenient_opt_money};
use crate::debt::DebtRecord;
use crate::types::*;

/// How a debt schedule was stored.
#[derive(Debug, Clone, PartialEq)]
pub enum DebtListShape {
    /// `{ "entries": [...] }`
    Wrapped(Vec<Value>),
    /// `[...]`
    Bare(Vec<Value>),
    /// Any other truthy value; carried through untouched.
    Opaque(Value),
    /// Missing, `null`, `false`, `0` or `""`.
    Absent,
}

impl DebtListShape {
    pub fn detect(value: &Value) -> DebtListShape {
        match value {
            Value::Array(items) => DebtListShape::Bare(items.clone()),
            Value::Object(map) => match map.get("entries") {
                Some(Value::Array(items)) => DebtListShape::Wrapped(items.clone()),
                _ => DebtListShape::Opaque(value.clone()),
            },
            v if is_falsy(v) => DebtListShape::Absent,
            other => DebtListShape::Opaque(other.clone()),
        }
    }
}

/// JavaScript truthiness, which decided what older writers stored.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// The normalized debt schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DebtEntries {
    Records(Vec<DebtRecord>),
    /// Stored in a shape nobody recognises; kept verbatim for display.
    Unrecognized(Value),
}

impl Default for DebtEntries {
    fn default() -> Self {
        DebtEntries::Records(Vec::new())
    }
}

impl DebtEntries {
    pub fn records(&self) -> &[DebtRecord] {
        match self {
            Self::Records(r) => r,
            Self::Unrecognized(_) => &[],
        }
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Self::Unrecognized(_))
    }
}

/// A debt summary computed and saved by an earlier version of the intake
/// flow. Only the headline totals are trusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDebtSummary {
    #[serde(default, alias = "monthly_debt_service", deserialize_with = "lenient_money")]
    pub monthly_debt_service: Money,
    #[serde(
        default,
        alias = "annual_debt_service",
        deserialize_with = "lenient_opt_money",
        skip_serializing_if = "Option::is_none"
    )]
    pub annual_debt_service: Option<Money>,
    #[serde(default, alias = "total_credit_balance", deserialize_with = "lenient_money")]
    pub total_credit_balance: Money,
    #[serde(default, alias = "total_credit_limit", deserialize_with = "lenient_money")]
    pub total_credit_limit: Money,
    #[serde(
        default,
        alias = "credit_utilization_rate",
        deserialize_with = "lenient_opt_money"
    )]
    pub credit_utilization_rate: Option<Rate>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoredDebtSummary {
    /// Annual service as stored, or twelve months of the monthly figure.
    pub fn annual(&self) -> Money {
        self.annual_debt_service
            .unwrap_or_else(|| annualize(self.monthly_debt_service))
    }

    pub fn is_empty(&self) -> bool {
        self.monthly_debt_service == Decimal::ZERO && self.annual_debt_service.is_none()
    }
}
