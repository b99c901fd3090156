use advisory_core::currency::{parse_currency, parse_currency_str};
use advisory_core::debt::{
    analyze_debts, summarize_debts, CategoryTag, DebtAnalysisInput, DebtCategory, DebtRecord,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

// ===========================================================================
// Currency parsing
// ===========================================================================

#[test]
fn test_currency_reference_values() {
    assert_eq!(parse_currency(&json!("$1,234.50")), dec!(1234.5));
    assert_eq!(parse_currency(&json!("")), Decimal::ZERO);
    assert_eq!(parse_currency(&Value::Null), Decimal::ZERO);
    assert_eq!(parse_currency(&json!(42)), dec!(42));
}

#[test]
fn test_currency_odd_text() {
    for raw in ["$", "--", "..", "💵"] {
        assert_eq!(parse_currency_str(raw), Decimal::ZERO, "{raw}");
    }
    assert_eq!(parse_currency_str("€ 1.000,50"), dec!(1.0005));
    assert_eq!(parse_currency_str("(300)"), dec!(300));
    assert_eq!(parse_currency_str("1e5"), dec!(15));
}

#[test]
fn test_currency_extreme_magnitudes() {
    let forty_digits = format!("1{}", "0".repeat(40));
    assert_eq!(parse_currency_str(&forty_digits), Decimal::ZERO);
    assert_eq!(parse_currency(&json!(1e40)), Decimal::ZERO);
    assert_eq!(
        parse_currency_str("79,228,162,514,264,337,593,543,950,335"),
        Decimal::MAX
    );
    assert_eq!(parse_currency(&json!(1e28)), big("1e28"));

    let tiny = parse_currency(&json!(1e-40));
    assert!(tiny >= Decimal::ZERO && tiny < dec!(0.0001));
    assert_eq!(
        parse_currency_str("0.00000000000000000000000000000001"),
        Decimal::ZERO
    );
}

fn big(text: &str) -> Decimal {
    Decimal::from_scientific(text).unwrap()
}

// ===========================================================================
// Debt aggregation
// ===========================================================================

fn intake_schedule() -> Vec<DebtRecord> {
    serde_json::from_value(json!([
        {"category": "REAL_ESTATE", "monthlyPayment": "$4,100.00",
         "originalLoanAmount": "$650,000", "outstandingBalance": "$512,340.18"},
        {"category": "VEHICLE_EQUIPMENT", "monthlyPayment": "$1,250",
         "originalLoanAmount": "$72,000", "outstandingBalance": "$38,900"},
        {"category": "CREDIT_CARD", "monthlyPayment": "$300",
         "originalLoanAmount": "$15,000", "outstandingBalance": "$6,000"},
        {"category": "LINE_OF_CREDIT", "monthlyPayment": "$750",
         "originalLoanAmount": "$100,000", "outstandingBalance": "$34,000"},
        {"category": "OTHER", "monthlyPayment": "", "originalLoanAmount": null},
    ]))
    .unwrap()
}

#[test]
fn test_credit_card_scenario() {
    let debts: Vec<DebtRecord> = serde_json::from_value(json!([{
        "category": "CREDIT_CARD",
        "outstandingBalance": "$500",
        "originalLoanAmount": "$1000",
        "monthlyPayment": "$50"
    }]))
    .unwrap();
    let s = summarize_debts(&debts);
    assert_eq!(s.monthly_debt_service, dec!(50));
    assert_eq!(s.annual_debt_service, dec!(600));
    assert_eq!(s.credit_utilization_rate, Some(dec!(0.5)));
}

#[test]
fn test_intake_schedule_totals() {
    let s = summarize_debts(&intake_schedule());
    assert_eq!(s.monthly_debt_service, dec!(6400));
    assert_eq!(s.annual_debt_service, dec!(76800));
    assert_eq!(s.total_credit_balance, dec!(40000));
    assert_eq!(s.total_credit_limit, dec!(115000));
    assert_eq!(s.credit_utilization_rate, Some(dec!(40000) / dec!(115000)));
    assert_eq!(s.excluded_records, 0);
    let other = s.category(DebtCategory::Other).unwrap();
    assert_eq!(other.count, 1);
    assert_eq!(other.monthly_payment, Decimal::ZERO);
}

#[test]
fn test_subtotals_always_sum_to_total() {
    let mut debts = intake_schedule();
    debts.extend(intake_schedule());
    debts.push(DebtRecord {
        category: CategoryTag::Unrecognized("PAYDAY".into()),
        monthly_payment: dec!(10_000),
        ..DebtRecord::default()
    });
    let s = summarize_debts(&debts);
    let sum: Decimal = s.by_category.iter().map(|c| c.monthly_payment).sum();
    assert_eq!(sum, s.monthly_debt_service);
    assert_eq!(s.annual_debt_service, s.monthly_debt_service * dec!(12));
    assert_eq!(s.excluded_records, 1);
}

#[test]
fn test_utilization_none_iff_zero_limit() {
    let debts = vec![
        DebtRecord::new(DebtCategory::CreditCard, dec!(25), dec!(0), dec!(400)),
        DebtRecord::new(DebtCategory::RealEstate, dec!(900), dec!(10_000), dec!(5_000)),
    ];
    let s = summarize_debts(&debts);
    assert_eq!(s.total_credit_limit, Decimal::ZERO);
    assert_eq!(s.credit_utilization_rate, None);
}

#[test]
fn test_typo_category_is_not_counted() {
    let debts: Vec<DebtRecord> = serde_json::from_value(json!([
        {"category": "CREDIT_CRAD", "monthlyPayment": 100},
        {"category": "credit_card", "monthlyPayment": 40},
    ]))
    .unwrap();
    let out = analyze_debts(&DebtAnalysisInput { debts });
    assert_eq!(out.result.monthly_debt_service, dec!(40));
    assert_eq!(out.result.excluded_records, 1);
    assert!(out.warnings.iter().any(|w| w.contains("CREDIT_CRAD")));
}

#[test]
fn test_summary_serializes_fixed_category_order() {
    let s = summarize_debts(&intake_schedule());
    let v = serde_json::to_value(&s).unwrap();
    let codes: Vec<&str> = v["by_category"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["category"].as_str().unwrap())
        .collect();
    assert_eq!(
        codes,
        vec!["REAL_ESTATE", "VEHICLE_EQUIPMENT", "CREDIT_CARD", "LINE_OF_CREDIT", "OTHER"]
    );
}

// ===========================================================================
// Range limits
// ===========================================================================

#[test]
fn test_annualizing_huge_payment_is_capped() {
    let debts: Vec<DebtRecord> =
        serde_json::from_value(json!([{"category": "OTHER", "monthlyPayment": 1e28}])).unwrap();
    let s = summarize_debts(&debts);
    assert_eq!(s.monthly_debt_service, big("1e28"));
    assert_eq!(s.annual_debt_service, Decimal::MAX);
    assert!(s.is_capped());

    let out = analyze_debts(&DebtAnalysisInput { debts });
    assert!(out.warnings.iter().any(|w| w.contains("capped")));
}

#[test]
fn test_summing_huge_records_is_capped() {
    let debts = vec![
        DebtRecord::new(DebtCategory::RealEstate, big("5e28"), big("5e28"), big("5e28")),
        DebtRecord::new(DebtCategory::RealEstate, big("5e28"), big("5e28"), big("5e28")),
    ];
    let s = summarize_debts(&debts);
    assert_eq!(s.monthly_debt_service, Decimal::MAX);
    assert_eq!(s.total_outstanding_balance, Decimal::MAX);
    assert_eq!(s.category(DebtCategory::RealEstate).unwrap().count, 2);
}

#[test]
fn test_utilization_against_tiny_limit_is_undefined() {
    let debts = vec![DebtRecord::new(
        DebtCategory::CreditCard,
        dec!(100),
        dec!(0.0000001),
        big("7e28"),
    )];
    let s = summarize_debts(&debts);
    assert_eq!(s.credit_utilization_rate, None);
    assert_eq!(s.total_credit_limit, dec!(0.0000001));

    let out = analyze_debts(&DebtAnalysisInput { debts });
    assert!(out.warnings.iter().any(|w| w.contains("out of range")));
}
