use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

use crate::amortization;
use crate::currency::lenient_opt_money;
use crate::debt::{summarize_debts, DebtRecord};
use crate::financials::{normalize_financials, FinancialYears, YearLabel};
use crate::types::*;
use crate::{AdvisoryError, AdvisoryResult};

// ---------------------------------------------------------------------------
// Core calculation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DscrResult {
    pub ratio: Multiple,
    /// Period whose EBITDA produced the ratio.
    pub year: YearLabel,
    pub ebitda: Money,
    pub total_debt_service: Money,
}

/// Periods in the order they are tried: most recent year-to-date first,
/// then full years newest to oldest.
pub fn candidate_years(years: &FinancialYears) -> Vec<YearLabel> {
    years.labels()
}

/// EBITDA / (existing + new annual debt service) for the first period, in
/// priority order, with positive EBITDA and a positive denominator.
///
/// The first qualifying period wins even when it is a partial year; later
/// periods are not consulted.
pub fn calculate_dscr(
    years: &FinancialYears,
    existing_annual_debt_service: Money,
    new_loan_annual_payment: Money,
) -> Option<DscrResult> {
    let total_debt_service = existing_annual_debt_service.saturating_add(new_loan_annual_payment);
    if total_debt_service <= Decimal::ZERO {
        return None;
    }

    let (label, snapshot) = years
        .iter()
        .find(|(_, snapshot)| snapshot.ebitda() > Decimal::ZERO)?;
    let Some(ratio) = snapshot.ebitda().checked_div(total_debt_service) else {
        debug!(year = %label, "DSCR exceeds the decimal range, left undefined");
        return None;
    };
    Some(DscrResult {
        ratio,
        year: *label,
        ebitda: snapshot.ebitda(),
        total_debt_service,
    })
}

/// Just the ratio.
pub fn dscr_ratio(
    years: &FinancialYears,
    existing_annual_debt_service: Money,
    new_loan_annual_payment: Money,
) -> Option<Multiple> {
    calculate_dscr(years, existing_annual_debt_service, new_loan_annual_payment).map(|r| r.ratio)
}

// ---------------------------------------------------------------------------
// Enveloped analysis
// ---------------------------------------------------------------------------

/// Proposed loan terms, used to derive the new-loan payment when it is not
/// supplied directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedLoan {
    pub amount: Money,
    /// Whole-number percentage.
    pub interest_rate_percent: Decimal,
    pub term_years: Decimal,
    #[serde(default)]
    pub down_payment: Money,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DscrInput {
    /// Period snapshots as persisted: prefixed keys, object or JSON text.
    #[serde(default)]
    pub financials: Value,
    #[serde(default, deserialize_with = "lenient_opt_money")]
    pub existing_annual_debt_service: Option<Money>,
    #[serde(default, deserialize_with = "lenient_opt_money")]
    pub new_loan_annual_payment: Option<Money>,
    /// Used when `existing_annual_debt_service` is absent.
    #[serde(default)]
    pub debts: Option<Vec<DebtRecord>>,
    /// Used when `new_loan_annual_payment` is absent.
    #[serde(default)]
    pub loan: Option<ProposedLoan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DscrOutput {
    pub dscr: Option<Multiple>,
    pub year: Option<YearLabel>,
    pub ebitda: Option<Money>,
    pub existing_annual_debt_service: Money,
    pub new_loan_annual_payment: Money,
    pub total_debt_service: Money,
    pub years_considered: Vec<YearLabel>,
}

/// DSCR with provenance: which period was used, what went into the
/// denominator, and why nothing qualified when the ratio is absent.
pub fn analyze_dscr(input: &DscrInput) -> AdvisoryResult<ComputationOutput<DscrOutput>> {
    let start = Instant::now();
    validate_input(input)?;

    let (years, mut warnings) = normalize_financials(&input.financials);

    let existing = match (input.existing_annual_debt_service, &input.debts) {
        (Some(v), _) => v,
        (None, Some(debts)) => summarize_debts(debts).annual_debt_service,
        (None, None) => {
            warnings.push("No existing debt service supplied; assumed zero.".into());
            Decimal::ZERO
        }
    };

    let new_payment = match (input.new_loan_annual_payment, &input.loan) {
        (Some(v), _) => v,
        (None, Some(loan)) => amortization::annual_payment(
            loan.amount
                .saturating_sub(loan.down_payment)
                .max(Decimal::ZERO),
            percent_to_rate(loan.interest_rate_percent),
            loan.term_years,
        ),
        (None, None) => {
            warnings.push("No new loan payment supplied; assumed zero.".into());
            Decimal::ZERO
        }
    };

    let total_debt_service = existing.saturating_add(new_payment);
    let result = calculate_dscr(&years, existing, new_payment);

    match &result {
        Some(r) if r.year.is_year_to_date() => warnings.push(format!(
            "DSCR uses partial-year EBITDA from {}; it is not annualized.",
            r.year
        )),
        Some(_) => {}
        None if total_debt_service <= Decimal::ZERO => {
            warnings.push("Total debt service is zero; DSCR undefined.".into())
        }
        None if years.iter().any(|(_, s)| s.ebitda() > Decimal::ZERO) => {
            warnings.push("DSCR is out of range; left undefined.".into())
        }
        None => warnings.push("No period has positive EBITDA; DSCR undefined.".into()),
    }

    let output = DscrOutput {
        dscr: result.as_ref().map(|r| r.ratio),
        year: result.as_ref().map(|r| r.year),
        ebitda: result.as_ref().map(|r| r.ebitda),
        existing_annual_debt_service: existing,
        new_loan_annual_payment: new_payment,
        total_debt_service,
        years_considered: candidate_years(&years),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "period_priority": "year-to-date, then full years newest first",
        "selection": "first period with positive EBITDA",
        "new_loan_payment": "level monthly amortization x 12",
    });

    Ok(with_metadata(
        "Debt Service Coverage Ratio (EBITDA / total annual debt service)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &DscrInput) -> AdvisoryResult<()> {
    if input.existing_annual_debt_service.is_some_and(|v| v < Decimal::ZERO) {
        return Err(AdvisoryError::InvalidInput {
            field: "existing_annual_debt_service".into(),
            reason: "Debt service cannot be negative.".into(),
        });
    }
    if input.new_loan_annual_payment.is_some_and(|v| v < Decimal::ZERO) {
        return Err(AdvisoryError::InvalidInput {
            field: "new_loan_annual_payment".into(),
            reason: "Loan payment cannot be negative.".into(),
        });
    }
    if let Some(loan) = &input.loan {
        if loan.term_years <= Decimal::ZERO {
            return Err(AdvisoryError::InvalidInput {
                field: "loan.term_years".into(),
                reason: "Loan term must be positive.".into(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
