//! Scalar type inference for raw command-line strings
//!
//! Rules are tried in order and the first match wins:
//!
//! 1. `None` is the null value
//! 2. `True` / `False` are booleans
//! 3. anything that parses as a float; it narrows to an integer when the text
//!    has no `.` and no exponent
//! 4. a JSON document (`[1, 2]`, `{"a": 1}`, `"quoted"`, `true`, `null`),
//!    including the non-finite constants `Infinity`, `-Infinity` and `NaN`
//! 5. otherwise the original string, unchanged
//!
//! Lowercase `inf` and `nan` match neither rule 3 nor rule 4 and stay strings.
//!
//! Inference never fails.

use crate::values::Value;

pub fn infer_value(raw: &str) -> Value {
    match raw {
        "None" => return Value::None,
        "True" => return Value::Bool(true),
        "False" => return Value::Bool(false),
        _ => {}
    }

    if let Some(number) = infer_number(raw) {
        return number;
    }

    if let Some(constant) = infer_non_finite(raw) {
        return constant;
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(raw) {
        return Value::from_json(json);
    }

    Value::Str(raw.to_string())
}

/// JSON's non-finite extensions, which `serde_json` does not accept
fn infer_non_finite(raw: &str) -> Option<Value> {
    match raw {
        "Infinity" => Some(Value::Float(f64::INFINITY)),
        "-Infinity" => Some(Value::Float(f64::NEG_INFINITY)),
        "NaN" => Some(Value::Float(f64::NAN)),
        _ => None,
    }
}

/// Float-style numeric parse with `_` digit separators and surrounding whitespace
fn infer_number(raw: &str) -> Option<Value> {
    let cleaned = strip_digit_separators(raw.trim())?;
    let float: f64 = cleaned.parse().ok()?;

    if raw.contains('.') || raw.contains('e') || raw.contains('E') {
        return Some(Value::Float(float));
    }

    match cleaned.parse::<i64>() {
        Ok(int) => Some(Value::Int(int)),
        // Out of i64 range: keep the float
        Err(_) if is_integer_literal(&cleaned) => Some(Value::Float(float)),
        // inf, nan and friends
        Err(_) => None,
    }
}

/// Removes `_` separators, rejecting any `_` not placed between two digits
fn strip_digit_separators(text: &str) -> Option<String> {
    if !text.contains('_') {
        return Some(text.to_string());
    }

    let bytes = text.as_bytes();
    for (index, byte) in bytes.iter().enumerate() {
        if *byte == b'_' {
            let before = index.checked_sub(1).map(|i| bytes[i]);
            let after = bytes.get(index + 1).copied();
            let between_digits = matches!(before, Some(b) if b.is_ascii_digit())
                && matches!(after, Some(a) if a.is_ascii_digit());
            if !between_digits {
                return None;
            }
        }
    }

    Some(text.replace('_', ""))
}

fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix(&['+', '-'][..]).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keywords() {
        assert_eq!(infer_value("None"), Value::None);
        assert_eq!(infer_value("True"), Value::Bool(true));
        assert_eq!(infer_value("False"), Value::Bool(false));
    }

    #[test]
    fn test_integers() {
        assert_eq!(infer_value("7"), Value::Int(7));
        assert_eq!(infer_value("-12"), Value::Int(-12));
        assert_eq!(infer_value("+3"), Value::Int(3));
        assert_eq!(infer_value(" 42 "), Value::Int(42));
        assert_eq!(infer_value("1_000"), Value::Int(1000));
    }

    #[test]
    fn test_floats() {
        assert_eq!(infer_value("7.0"), Value::Float(7.0));
        assert_eq!(infer_value("0.001"), Value::Float(0.001));
        assert_eq!(infer_value("1e-3"), Value::Float(0.001));
        assert_eq!(infer_value("2E3"), Value::Float(2000.0));
        assert_eq!(infer_value(".5"), Value::Float(0.5));
        assert_eq!(infer_value("1_000.5"), Value::Float(1000.5));
    }

    #[test]
    fn test_integer_overflow_keeps_float() {
        assert_eq!(
            infer_value("100000000000000000000"),
            Value::Float(1e20)
        );
    }

    #[test]
    fn test_misplaced_separators_are_strings() {
        assert_eq!(infer_value("_1"), Value::Str("_1".into()));
        assert_eq!(infer_value("1_"), Value::Str("1_".into()));
        assert_eq!(infer_value("1__0"), Value::Str("1__0".into()));
    }

    #[test]
    fn test_non_finite_constants() {
        assert_eq!(infer_value("Infinity"), Value::Float(f64::INFINITY));
        assert_eq!(infer_value("-Infinity"), Value::Float(f64::NEG_INFINITY));
        assert!(matches!(infer_value("NaN"), Value::Float(x) if x.is_nan()));

        assert_eq!(infer_value("inf"), Value::Str("inf".into()));
        assert_eq!(infer_value("nan"), Value::Str("nan".into()));
        assert_eq!(infer_value("-inf"), Value::Str("-inf".into()));

        for raw in ["Infinity", "-Infinity", "NaN"] {
            assert_eq!(infer_value(raw).to_string(), raw);
        }
    }

    #[test]
    fn test_json_documents() {
        assert_eq!(
            infer_value(r#"{"seq": [1, 2]}"#),
            Value::Json(json!({"seq": [1, 2]}))
        );
        assert_eq!(infer_value("[1, 2, 3]"), Value::Json(json!([1, 2, 3])));
        assert_eq!(infer_value(r#""quoted""#), Value::Str("quoted".into()));
        assert_eq!(infer_value("true"), Value::Bool(true));
        assert_eq!(infer_value("null"), Value::None);
    }

    #[test]
    fn test_fallback_strings() {
        assert_eq!(infer_value("xavier"), Value::Str("xavier".into()));
        assert_eq!(infer_value(""), Value::Str(String::new()));
        assert_eq!(
            infer_value("mymodule.Trainer"),
            Value::Str("mymodule.Trainer".into())
        );
        assert_eq!(infer_value("{not json"), Value::Str("{not json".into()));
    }

    #[test]
    fn test_canonical_forms_round_trip() {
        let values = [
            Value::None,
            Value::Bool(true),
            Value::Int(-5),
            Value::Float(7.0),
            Value::Float(0.25),
            Value::Str("uniform".into()),
            Value::Json(json!({"a": [1, {"b": null}]})),
        ];

        for value in values {
            assert_eq!(infer_value(&value.to_string()), value);
        }
    }
}
