use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::types::{annualize, Money, Rate, MONTHS_PER_YEAR};

/// Level monthly payment on a fully amortizing loan.
///
/// `annual_rate` is a fraction (0.075 = 7.5%), compounded monthly. A zero
/// rate spreads principal evenly; a zero term or non-positive principal has
/// no payment.
pub fn monthly_payment(principal: Money, annual_rate: Rate, term_years: Decimal) -> Money {
    let Some(periods) = term_years.checked_mul(MONTHS_PER_YEAR).map(|p| p.round()) else {
        return Decimal::ZERO;
    };
    if principal <= Decimal::ZERO || periods <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let rate = annual_rate / MONTHS_PER_YEAR;
    if rate.is_zero() {
        return principal / periods;
    }

    // absurd terms or rates overflow 96-bit decimals; treat as no payment
    let Some(factor) = (Decimal::ONE + rate).checked_powd(periods) else {
        return Decimal::ZERO;
    };
    let Some(annuity_factor) = factor
        .checked_sub(Decimal::ONE)
        .and_then(|v| v.checked_div(rate))
        .filter(|v| !v.is_zero())
    else {
        return Decimal::ZERO;
    };

    principal
        .checked_mul(factor)
        .and_then(|v| v.checked_div(annuity_factor))
        .unwrap_or(Decimal::ZERO)
}

/// Twelve monthly payments.
pub fn annual_payment(principal: Money, annual_rate: Rate, term_years: Decimal) -> Money {
    annualize(monthly_payment(principal, annual_rate, term_years))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_standard_mortgage_payment() {
        // 200k at 6% over 30 years ~ 1199.10
        let pmt = monthly_payment(dec!(200_000), dec!(0.06), dec!(30));
        assert!((pmt - dec!(1199.10)).abs() < dec!(0.01));
    }

    #[test]
    fn test_term_beyond_decimal_range() {
        let term = Decimal::from_scientific("1e28").unwrap();
        assert_eq!(monthly_payment(dec!(100_000), dec!(0.05), term), Decimal::ZERO);
        assert_eq!(annual_payment(dec!(100_000), Decimal::ZERO, term), Decimal::ZERO);
    }

    #[test]
    fn test_huge_principal_annualizes_without_panic() {
        let annual = annual_payment(Decimal::MAX, Decimal::ZERO, dec!(1));
        assert!(annual > Decimal::ZERO);
        assert_eq!(annual_payment(Decimal::MAX, dec!(0.10), dec!(30)), Decimal::ZERO);
    }

    #[test]
    fn test_ten_year_business_loan() {
        // 500k at 10% over 10 years ~ 6607.54
        let pmt = monthly_payment(dec!(500_000), dec!(0.10), dec!(10));
        assert!((pmt - dec!(6607.54)).abs() < dec!(0.01));
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        assert_eq!(monthly_payment(dec!(12_000), dec!(0), dec!(1)), dec!(1000));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(monthly_payment(dec!(0), dec!(0.05), dec!(10)), Decimal::ZERO);
        assert_eq!(monthly_payment(dec!(-5), dec!(0.05), dec!(10)), Decimal::ZERO);
        assert_eq!(monthly_payment(dec!(1000), dec!(0.05), dec!(0)), Decimal::ZERO);
    }

    #[test]
    fn test_annual_is_twelve_months() {
        let m = monthly_payment(dec!(100_000), dec!(0.08), dec!(5));
        assert_eq!(annual_payment(dec!(100_000), dec!(0.08), dec!(5)), m * dec!(12));
    }
}
