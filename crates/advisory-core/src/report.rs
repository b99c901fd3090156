//! The payload handed to the PDF rendering service.
//!
//! The renderer does no parsing of its own, so every amount here is a JSON
//! number and every label is final display text.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::debt::{summarize_debts, DebtCategory};
use crate::record::{DebtEntries, NormalizedRecord};
use crate::types::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLoan {
    #[serde(with = "rust_decimal::serde::float")]
    pub desired_amount: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub proposed_amount: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub down_payment: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub financed_amount: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub term_years: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub interest_rate: Rate,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_payment: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub annual_payment: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCategory {
    pub category: DebtCategory,
    pub label: String,
    pub count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_payment: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub original_loan_amount: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub outstanding_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDebtLine {
    pub category: String,
    pub label: String,
    /// False for lines whose category is not recognised.
    pub included: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creditor: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_payment: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub original_loan_amount: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub outstanding_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDebt {
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_debt_service: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub annual_debt_service: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_outstanding_balance: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_credit_balance: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_credit_limit: Money,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub credit_utilization_rate: Option<Rate>,
    pub categories: Vec<ReportCategory>,
    pub lines: Vec<ReportDebtLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportYear {
    pub label: String,
    pub year_to_date: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub ebitda: Money,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub revenue: Option<Money>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub net_income: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub record_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub loan: ReportLoan,
    pub debt: ReportDebt,
    /// Most relevant period first.
    pub years: Vec<ReportYear>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub dscr: Option<Multiple>,
    pub dscr_year: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_annual_debt_service: Money,
    pub warnings: Vec<String>,
}

/// Flatten a normalized record into the renderer's payload.
pub fn build_report(record: &NormalizedRecord) -> ReportPayload {
    let mut warnings = record.warnings.clone();

    let loan = ReportLoan {
        desired_amount: record.loan.desired_amount,
        proposed_amount: record.loan.proposed_amount,
        down_payment: record.loan.down_payment,
        financed_amount: record.loan.financed_amount(),
        term_years: record.loan.term_years,
        interest_rate: record.loan.interest_rate,
        monthly_payment: record.loan.monthly_payment(),
        annual_payment: record.loan.annual_payment(),
    };

    let debt = match &record.debts {
        DebtEntries::Records(records) => {
            let summary = summarize_debts(records);
            ReportDebt {
                monthly_debt_service: summary.monthly_debt_service,
                annual_debt_service: summary.annual_debt_service,
                total_outstanding_balance: summary.total_outstanding_balance,
                total_credit_balance: summary.total_credit_balance,
                total_credit_limit: summary.total_credit_limit,
                credit_utilization_rate: summary.credit_utilization_rate,
                categories: summary
                    .by_category
                    .iter()
                    .map(|s| ReportCategory {
                        category: s.category,
                        label: s.category.label().to_string(),
                        count: s.count,
                        monthly_payment: s.monthly_payment,
                        original_loan_amount: s.original_loan_amount,
                        outstanding_balance: s.outstanding_balance,
                    })
                    .collect(),
                lines: records
                    .iter()
                    .map(|r| ReportDebtLine {
                        category: r.category.to_string(),
                        label: r
                            .category
                            .known()
                            .map(|c| c.label().to_string())
                            .unwrap_or_else(|| "Unrecognized".to_string()),
                        included: r.category.known().is_some(),
                        creditor: r.creditor.clone(),
                        monthly_payment: r.monthly_payment,
                        original_loan_amount: r.original_loan_amount,
                        outstanding_balance: r.outstanding_balance,
                    })
                    .collect(),
            }
        }
        DebtEntries::Unrecognized(_) => {
            warnings.push("Debt lines unavailable; totals taken from the stored summary.".into());
            let stored = record.summary.clone().unwrap_or_default();
            ReportDebt {
                monthly_debt_service: stored.monthly_debt_service,
                annual_debt_service: stored.annual(),
                total_outstanding_balance: Decimal::ZERO,
                total_credit_balance: stored.total_credit_balance,
                total_credit_limit: stored.total_credit_limit,
                credit_utilization_rate: stored.credit_utilization_rate,
                categories: Vec::new(),
                lines: Vec::new(),
            }
        }
    };

    let years = record
        .financials
        .iter()
        .map(|(label, snap)| ReportYear {
            label: label.to_string(),
            year_to_date: label.is_year_to_date(),
            ebitda: snap.ebitda(),
            revenue: snap.summary.revenue,
            net_income: snap.summary.net_income,
        })
        .collect();

    ReportPayload {
        record_id: record.id.clone(),
        created_at: record.created_at,
        total_annual_debt_service: debt.annual_debt_service.saturating_add(loan.annual_payment),
        loan,
        debt,
        years,
        dscr: record.dscr,
        dscr_year: record.dscr_year.map(|y| y.to_string()),
        warnings,
    }
}
