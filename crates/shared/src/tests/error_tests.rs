use super::*;
use serde_json::json;

#[test]
fn constructors_serialize_snake_case_codes() {
    assert_eq!(
        serde_json::to_value(ApiError::not_found("unknown session s1")).expect("json"),
        json!({ "code": "not_found", "message": "unknown session s1" })
    );
    assert_eq!(
        serde_json::to_value(ApiError::validation("answer cannot be empty")).expect("json"),
        json!({ "code": "validation", "message": "answer cannot be empty" })
    );
}

#[test]
fn unknown_codes_are_rejected() {
    let parsed = serde_json::from_value::<ApiError>(json!({ "code": "conflict", "message": "x" }));
    assert!(parsed.is_err());
}
