use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;
use serde_json::Value;

use advisory_core::loan::LoanDefaults;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a JSON-encoded value (number, formatted string, null) into a decimal
/// string. Never fails on content; only on malformed JSON.
#[napi]
pub fn parse_currency(value_json: String) -> NapiResult<String> {
    let value: Value = serde_json::from_str(&value_json).map_err(to_napi_error)?;
    Ok(advisory_core::currency::parse_currency(&value).to_string())
}

// ---------------------------------------------------------------------------
// Debt & coverage
// ---------------------------------------------------------------------------

#[napi]
pub fn summarize_debts(input_json: String) -> NapiResult<String> {
    let input: advisory_core::debt::DebtAnalysisInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = advisory_core::debt::analyze_debts(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_dscr(input_json: String) -> NapiResult<String> {
    let input: advisory_core::dscr::DscrInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = advisory_core::dscr::analyze_dscr(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Raw record as fetched by the web app from the hosted backend.
#[derive(Deserialize)]
struct RecordRequest {
    id: String,
    /// `null` when the backend found nothing.
    record: Value,
    #[serde(default)]
    loan_defaults: LoanDefaults,
}

fn normalize(input_json: &str) -> NapiResult<Option<advisory_core::record::NormalizedRecord>> {
    let req: RecordRequest = serde_json::from_str(input_json).map_err(to_napi_error)?;
    if req.record.is_null() {
        return Ok(None);
    }
    Ok(Some(advisory_core::record::reconstruct_record(
        &req.id,
        &req.record,
        &req.loan_defaults,
    )))
}

/// Returns `"null"` when the request carries no record.
#[napi]
pub fn reconstruct_record(input_json: String) -> NapiResult<String> {
    let record = normalize(&input_json)?;
    serde_json::to_string(&record).map_err(to_napi_error)
}

#[napi]
pub fn build_report(input_json: String) -> NapiResult<String> {
    let report = normalize(&input_json)?.map(|r| advisory_core::report::build_report(&r));
    serde_json::to_string(&report).map_err(to_napi_error)
}
