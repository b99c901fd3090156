//! Year-keyed financial statement snapshots.
//!
//! The intake forms persist one summary per period under prefixed keys
//! (`year2023`, `year2024`, `year2025Ytd`). Here those keys become
//! [`YearLabel`]s, ordered so that iteration yields the most relevant period
//! first.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::currency::{lenient_money, lenient_opt_money};
use crate::types::Money;

// ---------------------------------------------------------------------------
// Year labels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YearLabel {
    Full(i32),
    YearToDate(i32),
}

impl YearLabel {
    pub fn year(self) -> i32 {
        match self {
            Self::Full(y) | Self::YearToDate(y) => y,
        }
    }

    pub fn is_year_to_date(self) -> bool {
        matches!(self, Self::YearToDate(_))
    }

    /// Read a persisted key such as `year2024`, `2025 year-to-date` or
    /// `year2025_ytd`. The first run of four digits is the year; a `ytd` or
    /// `year to date` marker anywhere makes it a partial period.
    pub fn parse_key(key: &str) -> Option<YearLabel> {
        let year = first_four_digit_run(key)?;
        let compact: String = key
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if compact.contains("ytd") || compact.contains("yeartodate") {
            Some(YearLabel::YearToDate(year))
        } else {
            Some(YearLabel::Full(year))
        }
    }
}

fn first_four_digit_run(key: &str) -> Option<i32> {
    let bytes = key.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start == 4 {
                return key[start..i].parse().ok();
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Priority order: newer years first; within a year the year-to-date
/// period ranks ahead of the full year.
impl Ord for YearLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .year()
            .cmp(&self.year())
            .then_with(|| other.is_year_to_date().cmp(&self.is_year_to_date()))
    }
}

impl PartialOrd for YearLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for YearLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full(y) => write!(f, "{y}"),
            Self::YearToDate(y) => write!(f, "{y} YTD"),
        }
    }
}

impl Serialize for YearLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        YearLabel::parse_key(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("no four-digit year in '{raw}'")))
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSummary {
    #[serde(default, alias = "EBITDA", deserialize_with = "lenient_money")]
    pub ebitda: Money,
    #[serde(
        default,
        alias = "totalRevenue",
        alias = "total_revenue",
        deserialize_with = "lenient_opt_money",
        skip_serializing_if = "Option::is_none"
    )]
    pub revenue: Option<Money>,
    #[serde(
        default,
        alias = "net_income",
        deserialize_with = "lenient_opt_money",
        skip_serializing_if = "Option::is_none"
    )]
    pub net_income: Option<Money>,
    #[serde(
        default,
        alias = "total_expenses",
        deserialize_with = "lenient_opt_money",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_expenses: Option<Money>,
    /// Any other summary figures, kept for presentation.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearSnapshot {
    pub summary: YearSummary,
}

impl YearSnapshot {
    pub fn ebitda(&self) -> Money {
        self.summary.ebitda
    }

    /// Read one period. Accepts `{summary: {...}}` or the summary fields
    /// directly; anything else is `None`.
    fn from_value(value: &Value) -> Option<YearSnapshot> {
        let obj = value.as_object()?;
        let summary_value = match obj.get("summary") {
            Some(s @ Value::Object(_)) => s,
            _ => value,
        };
        match serde_json::from_value::<YearSummary>(summary_value.clone()) {
            Ok(summary) => Some(YearSnapshot { summary }),
            Err(e) => {
                debug!(error = %e, "year summary unreadable, using empty summary");
                Some(YearSnapshot::default())
            }
        }
    }
}

/// Financial snapshots keyed by period, iterated in priority order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinancialYears(BTreeMap<YearLabel, YearSnapshot>);

impl FinancialYears {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: YearLabel, snapshot: YearSnapshot) {
        self.0.insert(label, snapshot);
    }

    /// Convenience for callers that only know EBITDA.
    pub fn with_ebitda(mut self, label: YearLabel, ebitda: Money) -> Self {
        self.insert(
            label,
            YearSnapshot {
                summary: YearSummary {
                    ebitda,
                    ..YearSummary::default()
                },
            },
        );
        self
    }

    pub fn get(&self, label: YearLabel) -> Option<&YearSnapshot> {
        self.0.get(&label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Periods, most relevant first.
    pub fn iter(&self) -> impl Iterator<Item = (&YearLabel, &YearSnapshot)> {
        self.0.iter()
    }

    pub fn labels(&self) -> Vec<YearLabel> {
        self.0.keys().copied().collect()
    }
}

// ---------------------------------------------------------------------------
// Blob shapes
// ---------------------------------------------------------------------------

/// How the financial blob was persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum FinancialBlobShape {
    /// Already a JSON object keyed by period.
    Structured(Map<String, Value>),
    /// JSON text that has to be decoded first.
    Encoded(String),
    /// Null, missing, or some other scalar.
    Absent,
}

impl FinancialBlobShape {
    pub fn detect(value: &Value) -> FinancialBlobShape {
        match value {
            Value::Object(map) => FinancialBlobShape::Structured(map.clone()),
            Value::String(s) if !s.trim().is_empty() => FinancialBlobShape::Encoded(s.clone()),
            _ => FinancialBlobShape::Absent,
        }
    }
}

/// Normalise a persisted financial blob into period snapshots.
///
/// Problems never fail the call: they are returned as warnings next to
/// whatever could be read.
pub fn normalize_financials(value: &Value) -> (FinancialYears, Vec<String>) {
    let mut warnings = Vec::new();
    let years = match FinancialBlobShape::detect(value) {
        FinancialBlobShape::Structured(map) => normalize_year_map(&map, &mut warnings),
        FinancialBlobShape::Encoded(text) => match serde_json::from_str::<Value>(&text) {
            // one level of double encoding has been seen in older rows
            Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
                Ok(Value::Object(map)) => normalize_year_map(&map, &mut warnings),
                _ => undecodable(&mut warnings),
            },
            Ok(Value::Object(map)) => normalize_year_map(&map, &mut warnings),
            _ => undecodable(&mut warnings),
        },
        FinancialBlobShape::Absent => {
            if !value.is_null() {
                warnings.push(format!("Financial data of unexpected type ignored: {value}"));
            }
            FinancialYears::new()
        }
    };
    (years, warnings)
}

fn undecodable(warnings: &mut Vec<String>) -> FinancialYears {
    warn!("financial data text could not be decoded");
    warnings.push("Financial data text could not be decoded; treated as empty.".into());
    FinancialYears::new()
}

fn normalize_year_map(map: &Map<String, Value>, warnings: &mut Vec<String>) -> FinancialYears {
    let mut years = FinancialYears::new();
    for (key, value) in map {
        let Some(label) = YearLabel::parse_key(key) else {
            warnings.push(format!("Financial key '{key}' has no year; ignored."));
            continue;
        };
        let Some(snapshot) = YearSnapshot::from_value(value) else {
            warnings.push(format!("Financial period '{key}' is not an object; ignored."));
            continue;
        };
        if years.get(label).is_some() {
            warnings.push(format!("Duplicate financial period {label} from '{key}'; first kept."));
            continue;
        }
        years.insert(label, snapshot);
    }
    years
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_key_prefixed() {
        assert_eq!(YearLabel::parse_key("year2024"), Some(YearLabel::Full(2024)));
        assert_eq!(YearLabel::parse_key("2023"), Some(YearLabel::Full(2023)));
    }

    #[test]
    fn test_parse_key_year_to_date() {
        assert_eq!(
            YearLabel::parse_key("year2025Ytd"),
            Some(YearLabel::YearToDate(2025))
        );
        assert_eq!(
            YearLabel::parse_key("2025 year-to-date"),
            Some(YearLabel::YearToDate(2025))
        );
        assert_eq!(
            YearLabel::parse_key("ytd_2025"),
            Some(YearLabel::YearToDate(2025))
        );
    }

    #[test]
    fn test_parse_key_without_year() {
        assert_eq!(YearLabel::parse_key("notes"), None);
        assert_eq!(YearLabel::parse_key("year24"), None);
    }

    #[test]
    fn test_priority_order() {
        let mut labels = vec![
            YearLabel::Full(2023),
            YearLabel::Full(2025),
            YearLabel::YearToDate(2025),
            YearLabel::Full(2024),
        ];
        labels.sort();
        assert_eq!(
            labels,
            vec![
                YearLabel::YearToDate(2025),
                YearLabel::Full(2025),
                YearLabel::Full(2024),
                YearLabel::Full(2023),
            ]
        );
    }

    #[test]
    fn test_label_display_roundtrip() {
        let l = YearLabel::YearToDate(2025);
        assert_eq!(l.to_string(), "2025 YTD");
        assert_eq!(YearLabel::parse_key(&l.to_string()), Some(l));
    }

    #[test]
    fn test_normalize_structured() {
        let blob = json!({
            "year2023": {"summary": {"ebitda": "$80,000", "revenue": 500000}},
            "year2024": {"summary": {"ebitda": 95000, "grossMargin": 0.4}},
        });
        let (years, warnings) = normalize_financials(&blob);
        assert!(warnings.is_empty());
        assert_eq!(years.len(), 2);
        let y23 = years.get(YearLabel::Full(2023)).unwrap();
        assert_eq!(y23.ebitda(), dec!(80000));
        assert_eq!(y23.summary.revenue, Some(dec!(500000)));
        let y24 = years.get(YearLabel::Full(2024)).unwrap();
        assert_eq!(y24.summary.extra.get("grossMargin"), Some(&json!(0.4)));
    }

    #[test]
    fn test_encoded_matches_structured() {
        let blob = json!({"year2024": {"summary": {"ebitda": 1000}}});
        let encoded = Value::String(blob.to_string());
        assert_eq!(normalize_financials(&blob).0, normalize_financials(&encoded).0);
    }

    #[test]
    fn test_double_encoded() {
        let blob = json!({"year2024": {"summary": {"ebitda": 1000}}});
        let twice = Value::String(Value::String(blob.to_string()).to_string());
        let (years, _) = normalize_financials(&twice);
        assert_eq!(years.get(YearLabel::Full(2024)).unwrap().ebitda(), dec!(1000));
    }

    #[test]
    fn test_flat_snapshot_without_summary() {
        let blob = json!({"year2024": {"ebitda": "12,500"}});
        let (years, _) = normalize_financials(&blob);
        assert_eq!(years.get(YearLabel::Full(2024)).unwrap().ebitda(), dec!(12500));
    }

    #[test]
    fn test_bad_text_is_empty_with_warning() {
        let (years, warnings) = normalize_financials(&json!("{not json"));
        assert!(years.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_null_is_empty() {
        let (years, warnings) = normalize_financials(&Value::Null);
        assert!(years.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unusable_keys_and_periods() {
        let blob = json!({
            "notes": {"summary": {"ebitda": 1}},
            "year2022": 17,
            "year2021": {"summary": {"ebitda": "n/a"}},
        });
        let (years, warnings) = normalize_financials(&blob);
        assert_eq!(years.len(), 1);
        assert_eq!(years.get(YearLabel::Full(2021)).unwrap().ebitda(), Decimal::ZERO);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_serializes_with_labels() {
        let years = FinancialYears::new()
            .with_ebitda(YearLabel::Full(2024), dec!(10))
            .with_ebitda(YearLabel::YearToDate(2025), dec!(5));
        let v = serde_json::to_value(&years).unwrap();
        assert!(v.get("2024").is_some());
        assert!(v.get("2025 YTD").is_some());
        let back: FinancialYears = serde_json::from_value(v).unwrap();
        assert_eq!(back, years);
    }
}
