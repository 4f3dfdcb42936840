use super::*;
use serde_json::json;

#[test]
fn range_scores_take_upper_bound() {
    assert_eq!(parse_score_text("90-100"), Some(100.0));
    assert_eq!(parse_score_text(" 70 - 89 "), Some(89.0));
}

#[test]
fn plain_numeric_strings_parse() {
    assert_eq!(parse_score_text("85"), Some(85.0));
    assert_eq!(parse_score_text("42.5"), Some(42.5));
    assert_eq!(parse_score_text("great"), None);
}

#[test]
fn leading_minus_is_not_treated_as_range() {
    assert_eq!(parse_score_text("-5"), Some(-5.0));
    assert_eq!(score_from_value(&json!("-5")), 0.0);
}

#[test]
fn out_of_range_scores_are_clamped() {
    assert_eq!(score_from_value(&json!(140)), 100.0);
    assert_eq!(score_from_value(&json!(-3)), 0.0);
    assert_eq!(clamp_score(f64::NAN), 0.0);
}

#[test]
fn unusable_values_become_zero() {
    assert_eq!(score_from_value(&json!(null)), 0.0);
    assert_eq!(score_from_value(&json!(["90"])), 0.0);
}

#[test]
fn exponent_minus_is_not_treated_as_range() {
    assert_eq!(parse_score_text("1e-5"), Some(0.00001));
    assert_eq!(parse_score_text("8.5e-1"), Some(0.85));
    assert_eq!(parse_score_text("1e1-2e1"), Some(20.0));
    assert_eq!(parse_score_text("abc-90"), None);
}
