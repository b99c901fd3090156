use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::currency::lenient_money;
use crate::types::Money;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// The closed set of debt categories a borrower can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebtCategory {
    RealEstate,
    VehicleEquipment,
    CreditCard,
    LineOfCredit,
    Other,
}

impl DebtCategory {
    /// Every category, in reporting order.
    pub const ALL: [DebtCategory; 5] = [
        DebtCategory::RealEstate,
        DebtCategory::VehicleEquipment,
        DebtCategory::CreditCard,
        DebtCategory::LineOfCredit,
        DebtCategory::Other,
    ];

    /// Wire name as persisted by the intake forms.
    pub fn code(self) -> &'static str {
        match self {
            Self::RealEstate => "REAL_ESTATE",
            Self::VehicleEquipment => "VEHICLE_EQUIPMENT",
            Self::CreditCard => "CREDIT_CARD",
            Self::LineOfCredit => "LINE_OF_CREDIT",
            Self::Other => "OTHER",
        }
    }

    /// Human-readable label for reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::RealEstate => "Real Estate",
            Self::VehicleEquipment => "Vehicle / Equipment",
            Self::CreditCard => "Credit Card",
            Self::LineOfCredit => "Line of Credit",
            Self::Other => "Other",
        }
    }

    /// Revolving facilities feed credit utilization; their original amount is
    /// the credit limit.
    pub fn is_revolving(self) -> bool {
        matches!(self, Self::CreditCard | Self::LineOfCredit)
    }

    /// Resolve a persisted category string. Matching ignores case and treats
    /// `-` and spaces as `_`; anything else is kept as unrecognized.
    pub fn parse(raw: &str) -> CategoryTag {
        let normalised: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();

        Self::ALL
            .into_iter()
            .find(|c| c.code() == normalised)
            .map(CategoryTag::Known)
            .unwrap_or_else(|| CategoryTag::Unrecognized(raw.to_string()))
    }
}

impl std::fmt::Display for DebtCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A category as read from storage: one of the closed set, or the raw text
/// that failed to match it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryTag {
    Known(DebtCategory),
    Unrecognized(String),
}

impl CategoryTag {
    pub fn known(&self) -> Option<DebtCategory> {
        match self {
            Self::Known(c) => Some(*c),
            Self::Unrecognized(_) => None,
        }
    }
}

impl Default for CategoryTag {
    fn default() -> Self {
        CategoryTag::Unrecognized(String::new())
    }
}

impl From<DebtCategory> for CategoryTag {
    fn from(c: DebtCategory) -> Self {
        CategoryTag::Known(c)
    }
}

impl std::fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Known(c) => write!(f, "{c}"),
            Self::Unrecognized(raw) => write!(f, "{raw}"),
        }
    }
}

impl Serialize for CategoryTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(c) => serializer.serialize_str(c.code()),
            Self::Unrecognized(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for CategoryTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => DebtCategory::parse(&s),
            Value::Null => CategoryTag::default(),
            other => CategoryTag::Unrecognized(other.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One debt line from the borrower's debt schedule.
///
/// Amounts are persisted as formatted text and parsed leniently; a field that
/// cannot be read contributes zero rather than dropping the record. For
/// revolving categories `original_loan_amount` is the credit limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtRecord {
    #[serde(default)]
    pub category: CategoryTag,
    #[serde(default, alias = "monthly_payment", deserialize_with = "lenient_money")]
    pub monthly_payment: Money,
    #[serde(
        default,
        alias = "original_loan_amount",
        alias = "originalAmount",
        deserialize_with = "lenient_money"
    )]
    pub original_loan_amount: Money,
    #[serde(
        default,
        alias = "outstanding_balance",
        alias = "balance",
        deserialize_with = "lenient_money"
    )]
    pub outstanding_balance: Money,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub creditor: Option<String>,
}

/// Free-text fields: strings kept, numbers and booleans rendered as text,
/// anything else dropped.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        v @ (Value::Number(_) | Value::Bool(_)) => Some(v.to_string()),
        _ => None,
    })
}

impl DebtRecord {
    pub fn new(
        category: impl Into<CategoryTag>,
        monthly_payment: Money,
        original_loan_amount: Money,
        outstanding_balance: Money,
    ) -> Self {
        DebtRecord {
            category: category.into(),
            monthly_payment,
            original_loan_amount,
            outstanding_balance,
            creditor: None,
        }
    }
}
