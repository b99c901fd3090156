use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::category::{CategoryTag, DebtCategory, DebtRecord};
use crate::types::*;

/// Utilization above this level is flagged in the analysis warnings.
const HIGH_UTILIZATION: Rate = dec!(0.30);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebtAnalysisInput {
    #[serde(default)]
    pub debts: Vec<DebtRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySubtotal {
    pub category: DebtCategory,
    pub count: usize,
    pub monthly_payment: Money,
    pub original_loan_amount: Money,
    pub outstanding_balance: Money,
}

impl CategorySubtotal {
    fn empty(category: DebtCategory) -> Self {
        CategorySubtotal {
            category,
            count: 0,
            monthly_payment: Decimal::ZERO,
            original_loan_amount: Decimal::ZERO,
            outstanding_balance: Decimal::ZERO,
        }
    }
}

/// Derived view over a debt schedule. Recomputed on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtSummary {
    pub monthly_debt_service: Money,
    pub annual_debt_service: Money,
    pub total_outstanding_balance: Money,
    pub total_original_amount: Money,
    /// Outstanding balance on revolving facilities.
    pub total_credit_balance: Money,
    /// Original amount (limit) of revolving facilities.
    pub total_credit_limit: Money,
    pub credit_utilization_rate: Option<Rate>,
    /// One entry per category, in `DebtCategory::ALL` order.
    pub by_category: Vec<CategorySubtotal>,
    #[serde(default)]
    pub excluded_records: usize,
}

impl Default for DebtSummary {
    fn default() -> Self {
        summarize_debts(&[])
    }
}

impl DebtSummary {
    pub fn category(&self, category: DebtCategory) -> Option<&CategorySubtotal> {
        self.by_category.iter().find(|s| s.category == category)
    }

    /// Whether any total hit the edge of the decimal range.
    pub fn is_capped(&self) -> bool {
        [
            self.annual_debt_service,
            self.total_outstanding_balance,
            self.total_original_amount,
            self.total_credit_balance,
            self.total_credit_limit,
        ]
        .into_iter()
        .any(is_saturated)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Aggregate a debt schedule into per-category subtotals and totals.
///
/// Records whose category is not one of the five known categories are left
/// out of every total and only counted in `excluded_records`.
pub fn summarize_debts(debts: &[DebtRecord]) -> DebtSummary {
    let mut by_category: Vec<CategorySubtotal> = DebtCategory::ALL
        .iter()
        .map(|c| CategorySubtotal::empty(*c))
        .collect();
    let mut excluded_records = 0;

    for debt in debts {
        let Some(category) = debt.category.known() else {
            excluded_records += 1;
            continue;
        };
        // ALL is indexed in declaration order
        let slot = &mut by_category[category as usize];
        slot.count += 1;
        // sums cap at the decimal range instead of overflowing
        slot.monthly_payment = slot.monthly_payment.saturating_add(debt.monthly_payment);
        slot.original_loan_amount = slot
            .original_loan_amount
            .saturating_add(debt.original_loan_amount);
        slot.outstanding_balance = slot
            .outstanding_balance
            .saturating_add(debt.outstanding_balance);
    }

    let monthly_debt_service = total(by_category.iter().map(|s| s.monthly_payment));
    let total_outstanding_balance = total(by_category.iter().map(|s| s.outstanding_balance));
    let total_original_amount = total(by_category.iter().map(|s| s.original_loan_amount));

    let revolving: Vec<&CategorySubtotal> = by_category
        .iter()
        .filter(|s| s.category.is_revolving())
        .collect();
    let total_credit_balance = total(revolving.iter().map(|s| s.outstanding_balance));
    let total_credit_limit = total(revolving.iter().map(|s| s.original_loan_amount));

    // a tiny limit against a huge balance has no representable ratio
    let credit_utilization_rate = if total_credit_limit.is_zero() {
        None
    } else {
        total_credit_balance.checked_div(total_credit_limit)
    };

    DebtSummary {
        monthly_debt_service,
        annual_debt_service: annualize(monthly_debt_service),
        total_outstanding_balance,
        total_original_amount,
        total_credit_balance,
        total_credit_limit,
        credit_utilization_rate,
        by_category,
        excluded_records,
    }
}

fn total(amounts: impl Iterator<Item = Money>) -> Money {
    amounts.fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}

/// Summarize a debt schedule and report anything that was silently dropped
/// or looks off.
pub fn analyze_debts(input: &DebtAnalysisInput) -> ComputationOutput<DebtSummary> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    for (i, debt) in input.debts.iter().enumerate() {
        if let CategoryTag::Unrecognized(raw) = &debt.category {
            warnings.push(format!(
                "Debt #{} has unrecognized category '{raw}'; excluded from totals.",
                i + 1
            ));
        }
        if debt.monthly_payment < Decimal::ZERO
            || debt.outstanding_balance < Decimal::ZERO
            || debt.original_loan_amount < Decimal::ZERO
        {
            warnings.push(format!("Debt #{} carries a negative amount.", i + 1));
        }
    }

    let summary = summarize_debts(&input.debts);

    match summary.credit_utilization_rate {
        Some(rate) if rate > HIGH_UTILIZATION => warnings.push(format!(
            "Credit utilization of {} exceeds 30%.",
            rate.round_dp(4)
        )),
        None if !summary.total_credit_limit.is_zero() => {
            warnings.push("Credit utilization is out of range; left undefined.".into())
        }
        _ => {}
    }

    if summary.is_capped() {
        warnings.push("Debt totals exceed the representable range; capped.".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "annualization": "monthly x 12",
        "revolving_categories": ["CREDIT_CARD", "LINE_OF_CREDIT"],
        "credit_limit_proxy": "original loan amount of revolving debts",
        "unknown_categories": "excluded",
    });

    with_metadata(
        "Debt schedule aggregation",
        &assumptions,
        warnings,
        elapsed,
        summary,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
