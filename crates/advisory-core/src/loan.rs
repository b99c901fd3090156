use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::amortization;
use crate::currency::parse_currency_opt;
use crate::types::*;

const DESIRED_AMOUNT_KEYS: &[&str] = &[
    "desired_loan_amount",
    "desiredLoanAmount",
    "loan_amount",
    "loanAmount",
];
const TERM_KEYS: &[&str] = &["loan_term", "loanTerm", "term_years", "termYears", "term"];
const RATE_KEYS: &[&str] = &["interest_rate", "interestRate"];
const PROPOSED_AMOUNT_KEYS: &[&str] = &["proposed_loan_amount", "proposedLoanAmount"];
const DOWN_PAYMENT_KEYS: &[&str] = &["down_payment", "downPayment"];

/// Terms assumed when an application left them blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanDefaults {
    pub term_years: Decimal,
    /// Whole-number percentage, as the forms collect it.
    pub interest_rate_percent: Decimal,
}

impl Default for LoanDefaults {
    fn default() -> Self {
        LoanDefaults {
            term_years: dec!(10),
            interest_rate_percent: dec!(10),
        }
    }
}

/// Requested financing, with every figure resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInfo {
    pub desired_amount: Money,
    pub term_years: Decimal,
    /// Fraction, not percent.
    pub interest_rate: Rate,
    pub proposed_amount: Money,
    pub down_payment: Money,
}

impl LoanInfo {
    /// Resolve loan terms from a persisted record.
    ///
    /// Loan fields may sit at the top level or under `loan_info`/`loanInfo`;
    /// the nested object wins. Missing or unreadable figures fall back to
    /// `defaults`, the proposed amount falls back to the desired amount.
    pub fn from_record(record: &Map<String, Value>, defaults: &LoanDefaults) -> LoanInfo {
        let nested = ["loan_info", "loanInfo"]
            .iter()
            .find_map(|k| record.get(*k).and_then(Value::as_object));
        let lookup = |keys: &[&str]| -> Option<Money> {
            nested
                .and_then(|n| first_amount(n, keys))
                .or_else(|| first_amount(record, keys))
        };

        let desired_amount = lookup(DESIRED_AMOUNT_KEYS).unwrap_or(Decimal::ZERO);
        let term_years = lookup(TERM_KEYS)
            .filter(|t| *t > Decimal::ZERO)
            .unwrap_or_else(|| {
                debug!(default = %defaults.term_years, "loan term missing, using default");
                defaults.term_years
            });
        let rate_percent = lookup(RATE_KEYS).unwrap_or_else(|| {
            debug!(
                default = %defaults.interest_rate_percent,
                "interest rate missing, using default"
            );
            defaults.interest_rate_percent
        });
        let proposed_amount = lookup(PROPOSED_AMOUNT_KEYS)
            .filter(|p| !p.is_zero())
            .unwrap_or(desired_amount);
        let down_payment = lookup(DOWN_PAYMENT_KEYS).unwrap_or(Decimal::ZERO);

        LoanInfo {
            desired_amount,
            term_years,
            interest_rate: percent_to_rate(rate_percent),
            proposed_amount,
            down_payment,
        }
    }

    /// Principal actually borrowed: proposed amount net of the down payment.
    pub fn financed_amount(&self) -> Money {
        self.proposed_amount
            .saturating_sub(self.down_payment)
            .max(Decimal::ZERO)
    }

    pub fn monthly_payment(&self) -> Money {
        amortization::monthly_payment(self.financed_amount(), self.interest_rate, self.term_years)
    }

    /// Annualized payment on the new loan, the second leg of the DSCR
    /// denominator.
    pub fn annual_payment(&self) -> Money {
        annualize(self.monthly_payment())
    }
}

fn first_amount(obj: &Map<String, Value>, keys: &[&str]) -> Option<Money> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(parse_currency_opt)
}
