use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info_span, warn};

use super::shape::{DebtEntries, DebtListShape, StoredDebtSummary};
use crate::currency::{parse_currency, parse_currency_opt};
use crate::debt::{summarize_debts, CategoryTag, DebtCategory, DebtRecord, DebtSummary};
use crate::dscr::calculate_dscr;
use crate::financials::{normalize_financials, FinancialYears, YearLabel};
use crate::loan::{LoanDefaults, LoanInfo};
use crate::store::RecordStore;
use crate::types::*;
use crate::AdvisoryResult;

const FINANCIAL_KEYS: &[&str] = &["financial_data", "financialData", "financials"];
const DEBT_KEYS: &[&str] = &["debts", "debt_schedule", "debtSchedule"];
const SUMMARY_KEYS: &[&str] = &["debt_summary", "debtSummary"];
const CREATED_KEYS: &[&str] = &["created_at", "createdAt"];

/// A persisted application, rehydrated into resolved numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub loan: LoanInfo,
    pub financials: FinancialYears,
    pub dscr: Option<Multiple>,
    /// Period the DSCR was computed from; absent when a stored ratio was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dscr_year: Option<YearLabel>,
    pub debts: DebtEntries,
    /// Summary saved alongside the record, if any.
    pub summary: Option<StoredDebtSummary>,
    pub warnings: Vec<String>,
}

impl NormalizedRecord {
    /// Summary recomputed from the debt schedule.
    pub fn debt_summary(&self) -> DebtSummary {
        summarize_debts(self.debts.records())
    }

    /// Existing annual debt service: from the parsed schedule when there is
    /// one, otherwise from the stored summary.
    pub fn existing_annual_debt_service(&self) -> Money {
        existing_service(&self.debts, self.summary.as_ref())
    }
}

fn existing_service(debts: &DebtEntries, stored: Option<&StoredDebtSummary>) -> Money {
    let records = debts.records();
    if !records.is_empty() {
        return summarize_debts(records).annual_debt_service;
    }
    stored.map(StoredDebtSummary::annual).unwrap_or(Decimal::ZERO)
}

/// Rebuild a normalized record from whatever shape it was stored in.
///
/// Never fails: unreadable parts fall back to empty or default values and
/// are listed in `warnings`.
pub fn reconstruct_record(id: &str, raw: &Value, defaults: &LoanDefaults) -> NormalizedRecord {
    let empty = Map::new();
    let mut warnings = Vec::new();
    let record = match raw.as_object() {
        Some(obj) => obj,
        None => {
            warn!(record_id = id, "persisted record is not an object");
            warnings.push("Record is not an object; all fields defaulted.".into());
            &empty
        }
    };

    let id = match record.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => id.to_string(),
    };

    let created_at = first(record, CREATED_KEYS).and_then(|v| parse_timestamp(v, &mut warnings));

    let loan = LoanInfo::from_record(record, defaults);

    let (financials, financial_warnings) = match first(record, FINANCIAL_KEYS) {
        Some(v) => normalize_financials(v),
        None => (FinancialYears::new(), Vec::new()),
    };
    warnings.extend(financial_warnings);

    let debts = match first(record, DEBT_KEYS).map(DebtListShape::detect) {
        Some(DebtListShape::Wrapped(items)) | Some(DebtListShape::Bare(items)) => {
            DebtEntries::Records(parse_debts(&items, &mut warnings))
        }
        Some(DebtListShape::Opaque(value)) => {
            warn!(record_id = %id, "debt schedule in unrecognized shape, passed through");
            warnings.push("Debt schedule is in an unrecognized shape; passed through.".into());
            DebtEntries::Unrecognized(value)
        }
        Some(DebtListShape::Absent) | None => DebtEntries::default(),
    };
    if summarize_debts(debts.records()).is_capped() {
        warnings.push("Debt totals exceed the representable range; capped.".into());
    }

    let summary = first(record, SUMMARY_KEYS)
        .filter(|v| v.is_object())
        .and_then(|v| match serde_json::from_value::<StoredDebtSummary>(v.clone()) {
            Ok(s) => Some(s),
            Err(e) => {
                warnings.push(format!("Stored debt summary unreadable: {e}"));
                None
            }
        });

    let stored_dscr = record
        .get("dscr")
        .and_then(parse_currency_opt)
        .filter(|d| *d > Decimal::ZERO);

    let (dscr, dscr_year) = match stored_dscr {
        Some(d) => (Some(d), None),
        None => {
            let existing = existing_service(&debts, summary.as_ref());
            match calculate_dscr(&financials, existing, loan.annual_payment()) {
                Some(r) => {
                    if r.year.is_year_to_date() {
                        warnings.push(format!(
                            "DSCR uses partial-year EBITDA from {}; it is not annualized.",
                            r.year
                        ));
                    }
                    (Some(r.ratio), Some(r.year))
                }
                None => {
                    let qualifying = financials.iter().any(|(_, s)| s.ebitda() > Decimal::ZERO);
                    let service = existing.saturating_add(loan.annual_payment());
                    if qualifying && service > Decimal::ZERO {
                        warnings.push("DSCR is out of range; left undefined.".into());
                    }
                    (None, None)
                }
            }
        }
    };

    NormalizedRecord {
        id,
        created_at,
        loan,
        financials,
        dscr,
        dscr_year,
        debts,
        summary,
        warnings,
    }
}

/// Fetch a record and normalize it. `Ok(None)` when the store has no such
/// record; errors are reserved for the store itself failing.
pub fn load_record(
    store: &dyn RecordStore,
    id: &str,
    defaults: &LoanDefaults,
) -> AdvisoryResult<Option<NormalizedRecord>> {
    let span = info_span!("load_record", record_id = id);
    let _guard = span.enter();

    let Some(raw) = store.fetch(id)? else {
        debug!("record not found");
        return Ok(None);
    };
    Ok(Some(reconstruct_record(id, &raw, defaults)))
}

fn first<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| record.get(*k))
}

/// Entries that are not objects are skipped. An object that does not
/// deserialize (e.g. both `balance` and `outstandingBalance` present) is read
/// field by field, first key wins.
fn parse_debts(items: &[Value], warnings: &mut Vec<String>) -> Vec<DebtRecord> {
    let mut debts = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            warnings.push(format!("Debt #{} is not an object; skipped.", i + 1));
            continue;
        };
        match serde_json::from_value::<DebtRecord>(item.clone()) {
            Ok(debt) => debts.push(debt),
            Err(e) => {
                warnings.push(format!("Debt #{} read field by field ({e}).", i + 1));
                debts.push(salvage_debt(obj));
            }
        }
    }
    debts
}

fn salvage_debt(obj: &Map<String, Value>) -> DebtRecord {
    let amount = |keys: &[&str]| first(obj, keys).map(parse_currency).unwrap_or_default();
    let category = match obj.get("category") {
        Some(Value::String(s)) => DebtCategory::parse(s),
        Some(Value::Null) | None => CategoryTag::default(),
        Some(other) => CategoryTag::Unrecognized(other.to_string()),
    };
    DebtRecord {
        category,
        monthly_payment: amount(&["monthlyPayment", "monthly_payment"]),
        original_loan_amount: amount(&[
            "originalLoanAmount",
            "original_loan_amount",
            "originalAmount",
        ]),
        outstanding_balance: amount(&["outstandingBalance", "outstanding_balance", "balance"]),
        creditor: obj.get("creditor").and_then(|v| v.as_str()).map(str::to_string),
    }
}

fn parse_timestamp(value: &Value, warnings: &mut Vec<String>) -> Option<DateTime<Utc>> {
    let text = value.as_str()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    warnings.push(format!("Unreadable timestamp '{text}' ignored."));
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn defaults() -> LoanDefaults {
        LoanDefaults::default()
    }

    fn sample_raw() -> Value {
        json!({
            "id": "app-42",
            "created_at": "2025-03-14T09:30:00+00:00",
            "desired_loan_amount": "$120,000",
            "loan_term": 1,
            "interest_rate": 0,
            "financial_data": {
                "year2023": {"summary": {"ebitda": "$50,000"}},
                "year2024": {"summary": {"ebitda": "$144,000"}},
            },
            "debts": {"entries": [
                {"category": "CREDIT_CARD", "outstandingBalance": "$500",
                 "originalLoanAmount": "$1000", "monthlyPayment": "$50"},
                {"category": "REAL_ESTATE", "monthlyPayment": "$950"},
            ]},
        })
    }

    #[test]
    fn test_full_reconstruction() {
        let rec = reconstruct_record("ignored", &sample_raw(), &defaults());
        assert_eq!(rec.id, "app-42");
        assert!(rec.created_at.is_some());
        assert_eq!(rec.loan.desired_amount, dec!(120000));
        assert_eq!(rec.financials.len(), 2);
        assert_eq!(rec.debts.records().len(), 2);
        // existing 1000 * 12 = 12000, new 120000 / 12 * 12 = 120000
        assert_eq!(rec.existing_annual_debt_service(), dec!(12000));
        assert_eq!(rec.dscr_year, Some(YearLabel::Full(2024)));
        assert_eq!(rec.dscr, Some(dec!(144000) / dec!(132000)));
        assert!(rec.warnings.is_empty(), "{:?}", rec.warnings);
    }

    #[test]
    fn test_wrapped_and_bare_agree() {
        let wrapped = sample_raw();
        let mut bare = sample_raw();
        bare["debts"] = wrapped["debts"]["entries"].clone();
        assert_eq!(
            reconstruct_record("x", &wrapped, &defaults()),
            reconstruct_record("x", &bare, &defaults())
        );
    }

    #[test]
    fn test_encoded_financials_agree() {
        let structured = sample_raw();
        let mut encoded = sample_raw();
        encoded["financial_data"] = Value::String(structured["financial_data"].to_string());
        assert_eq!(
            reconstruct_record("x", &structured, &defaults()),
            reconstruct_record("x", &encoded, &defaults())
        );
    }

    #[test]
    fn test_opaque_debts_pass_through() {
        let mut raw = sample_raw();
        raw["debts"] = json!("call borrower");
        let rec = reconstruct_record("x", &raw, &defaults());
        assert_eq!(rec.debts, DebtEntries::Unrecognized(json!("call borrower")));
        assert!(rec.warnings.iter().any(|w| w.contains("unrecognized shape")));
    }

    #[test]
    fn test_stored_dscr_preferred() {
        let mut raw = sample_raw();
        raw["dscr"] = json!("1.75");
        let rec = reconstruct_record("x", &raw, &defaults());
        assert_eq!(rec.dscr, Some(dec!(1.75)));
        assert_eq!(rec.dscr_year, None);
    }

    #[test]
    fn test_stored_summary_backs_opaque_debts() {
        let raw = json!({
            "debts": {"note": "legacy"},
            "debtSummary": {"monthlyDebtService": "$2,000"},
            "financialData": {"year2024": {"summary": {"ebitda": 48000}}},
            "loanAmount": 0,
        });
        let rec = reconstruct_record("legacy-1", &raw, &defaults());
        assert_eq!(rec.id, "legacy-1");
        assert_eq!(rec.existing_annual_debt_service(), dec!(24000));
        assert_eq!(rec.dscr, Some(dec!(2)));
    }

    #[test]
    fn test_year_to_date_dscr_is_flagged() {
        let mut raw = sample_raw();
        raw["financial_data"]["year2025Ytd"] = json!({"summary": {"ebitda": "$66,000"}});
        let rec = reconstruct_record("x", &raw, &defaults());
        assert_eq!(rec.dscr_year, Some(YearLabel::YearToDate(2025)));
        assert_eq!(rec.dscr, Some(dec!(0.5)));
        assert!(rec.warnings.iter().any(|w| w.contains("2025 YTD")));
    }

    #[test]
    fn test_not_an_object() {
        let rec = reconstruct_record("x", &json!([1, 2, 3]), &defaults());
        assert_eq!(rec.id, "x");
        assert!(rec.financials.is_empty());
        assert_eq!(rec.dscr, None);
        assert_eq!(rec.warnings.len(), 1);
    }

    #[test]
    fn test_non_object_debt_entry_is_skipped() {
        let raw = json!({"debts": [42, {"category": "OTHER", "monthlyPayment": 10}]});
        let rec = reconstruct_record("x", &raw, &defaults());
        let summary = rec.debt_summary();
        assert_eq!(rec.debts.records().len(), 1);
        assert_eq!(summary.monthly_debt_service, dec!(10));
        assert_eq!(summary.excluded_records, 0);
        assert_eq!(
            rec.debts.records()[0].category.known(),
            Some(DebtCategory::Other)
        );
        assert!(rec.warnings.iter().any(|w| w.contains("Debt #1 is not an object")));
    }

    #[test]
    fn test_numeric_creditor_keeps_debt_in_totals() {
        let raw = json!({"debts": [{
            "category": "CREDIT_CARD", "monthlyPayment": "$50",
            "originalLoanAmount": "$1000", "outstandingBalance": "$500",
            "creditor": 1234,
        }]});
        let rec = reconstruct_record("x", &raw, &defaults());
        let summary = rec.debt_summary();
        assert_eq!(summary.monthly_debt_service, dec!(50));
        assert_eq!(summary.credit_utilization_rate, Some(dec!(0.5)));
        assert_eq!(summary.excluded_records, 0);
        assert_eq!(rec.debts.records()[0].creditor.as_deref(), Some("1234"));
        assert!(rec.warnings.is_empty(), "{:?}", rec.warnings);
    }

    #[test]
    fn test_conflicting_aliases_read_field_by_field() {
        let raw = json!({"debts": [{
            "category": "line of credit", "monthlyPayment": "$200",
            "outstandingBalance": "$4,000", "balance": "$3,000",
            "originalLoanAmount": "$10,000",
        }]});
        let rec = reconstruct_record("x", &raw, &defaults());
        let debt = &rec.debts.records()[0];
        assert_eq!(debt.category.known(), Some(DebtCategory::LineOfCredit));
        assert_eq!(debt.outstanding_balance, dec!(4000));
        assert_eq!(rec.debt_summary().monthly_debt_service, dec!(200));
        assert_eq!(rec.warnings.len(), 1);
    }

    #[test]
    fn test_huge_amounts_do_not_panic() {
        let mut raw = sample_raw();
        raw["debts"] = json!([
            {"category": "OTHER", "monthlyPayment": "$10,000,000,000,000,000,000,000,000,000"},
            {"category": "OTHER", "monthlyPayment": "$70,000,000,000,000,000,000,000,000,000"},
        ]);
        let rec = reconstruct_record("x", &raw, &defaults());
        assert_eq!(rec.existing_annual_debt_service(), Decimal::MAX);
        assert!(rec.warnings.iter().any(|w| w.contains("capped")));
        // ebitda is tiny against a capped denominator
        assert_eq!(rec.dscr_year, Some(YearLabel::Full(2024)));
    }

    #[test]
    fn test_absurd_loan_term_has_no_payment() {
        let mut raw = sample_raw();
        raw["loan_term"] = json!("10000000000000000000000000000");
        let rec = reconstruct_record("x", &raw, &defaults());
        assert_eq!(rec.loan.annual_payment(), Decimal::ZERO);
        assert_eq!(rec.dscr, Some(dec!(144000) / dec!(12000)));
    }

    #[test]
    fn test_naive_timestamp() {
        let raw = json!({"created_at": "2024-01-02 03:04:05.678"});
        let rec = reconstruct_record("x", &raw, &defaults());
        assert_eq!(
            rec.created_at.unwrap().to_rfc3339(),
            "2024-01-02T03:04:05.678+00:00"
        );
    }

    #[test]
    fn test_reconstruction_is_idempotent() {
        let a = reconstruct_record("x", &sample_raw(), &defaults());
        let b = reconstruct_record("x", &sample_raw(), &defaults());
        assert_eq!(a, b);
    }
}
