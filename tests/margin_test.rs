//! Margin calculator properties.

use margin_monitor::services::{health_percentage, HealthLevel, MarginCalculator};
use margin_monitor::types::{MarginStatus, Position};
use proptest::prelude::*;

fn demo_positions() -> Vec<Position> {
    vec![
        Position::new(1, "AAPL", 100.0, 150.0, 175.0),
        Position::new(2, "GOOGL", 50.0, 2_800.0, 2_900.0),
    ]
}

#[test]
fn test_demo_portfolio_status() {
    let calculator = MarginCalculator::new(0.25);
    let status = calculator.calculate_for_positions(&demo_positions(), 50_000.0);

    assert_eq!(status.portfolio_market_value(), 162_500.0);
    assert_eq!(status.net_equity(), 112_500.0);
    assert_eq!(status.margin_requirement(), 40_625.0);
    assert_eq!(status.margin_shortfall(), -71_875.0);
    assert!(!status.margin_call_triggered());
    assert_eq!(status.positions().len(), 2);
    assert_eq!(status.positions()[1].position_value, 145_000.0);
}

#[test]
fn test_empty_positions_with_loan() {
    let calculator = MarginCalculator::default();
    let status = calculator.calculate_for_positions(&[], 10_000.0);

    assert_eq!(status.net_equity(), -10_000.0);
    assert_eq!(status.margin_requirement(), 0.0);
    assert_eq!(status.margin_shortfall(), 10_000.0);
    assert!(status.margin_call_triggered());
    assert_eq!(HealthLevel::classify(&status), HealthLevel::MarginCall);
    assert_eq!(health_percentage(&status), 0.0);
}

#[test]
fn test_exact_boundary_is_not_a_call() {
    // loan = (1 - 0.25) * pmv puts shortfall at exactly zero
    let status = MarginCalculator::compute(100_000.0, 75_000.0, 0.25);
    assert_eq!(status.margin_shortfall(), 0.0);
    assert!(!status.margin_call_triggered());
}

#[test]
fn test_wire_flag_is_rederived() {
    let json = r#"{
        "portfolio_market_value": 162500.0,
        "loan_amount": 50000.0,
        "net_equity": 112500.0,
        "margin_requirement": 40625.0,
        "margin_shortfall": -71875.0,
        "margin_call_triggered": true
    }"#;
    let status: MarginStatus = serde_json::from_str(json).unwrap();
    assert!(!status.margin_call_triggered());
    assert!(status.positions().is_empty());
}

proptest! {
    #[test]
    fn test_trigger_iff_positive_shortfall(
        pmv in 0.0f64..1e9,
        loan in 0.0f64..1e9,
        rate in 0.01f64..0.99
    ) {
        let status = MarginCalculator::compute(pmv, loan, rate);
        let expected = rate * pmv - (pmv - loan) > 0.0;

        prop_assert_eq!(status.margin_call_triggered(), expected);
        prop_assert_eq!(status.net_equity(), pmv - loan);
        prop_assert_eq!(status.margin_requirement(), rate * pmv);
        prop_assert_eq!(status.margin_shortfall(), status.margin_requirement() - status.net_equity());
    }

    #[test]
    fn test_health_percentage_in_range(
        pmv in 0.0f64..1e7,
        loan in 0.0f64..1e7
    ) {
        let status = MarginCalculator::compute(pmv, loan, 0.25);
        let health = health_percentage(&status);
        prop_assert!((0.0..=100.0).contains(&health));
        if status.margin_call_triggered() {
            prop_assert_eq!(health, 0.0);
        }
    }
}
