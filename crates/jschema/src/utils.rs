use serde_json::{Number, Value};

/// Integral numbers, including floats with a zero fractional part.
pub fn is_integer(n: &Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

/// Numbers written as JSON integers (no fraction or exponent).
pub fn is_integer_literal(n: &Number) -> bool {
    n.is_i64() || n.is_u64()
}

pub fn number_as_f64(n: &Number) -> f64 {
    n.as_f64().unwrap_or(f64::NAN)
}

/// Non-negative integral value of a schema keyword such as `minLength` (`2.0` counts).
pub fn as_non_negative_integer(value: &Value) -> Option<u64> {
    let n = value.as_number()?;
    if let Some(u) = n.as_u64() {
        return Some(u);
    }
    let f = n.as_f64()?;
    (f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

/// JSON equality with numbers compared by mathematical value (`1 == 1.0`).
pub fn json_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| json_equal(x, y)))
        }
        _ => left == right,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    number_as_f64(a) == number_as_f64(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_equal_numbers() {
        assert!(json_equal(&json!(1), &json!(1.0)));
        assert!(json_equal(&json!(-3), &json!(-3.0)));
        assert!(!json_equal(&json!(1), &json!(1.5)));
        assert!(!json_equal(&json!(1), &json!(true)));
    }

    #[test]
    fn test_json_equal_nested() {
        assert!(json_equal(&json!({"a": [1, {"b": 2.0}]}), &json!({"a": [1.0, {"b": 2}]})));
        assert!(!json_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(!json_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!json_equal(&json!(false), &json!(0)));
    }

    #[test]
    fn test_non_negative_integer() {
        assert_eq!(as_non_negative_integer(&json!(3)), Some(3));
        assert_eq!(as_non_negative_integer(&json!(2.0)), Some(2));
        assert_eq!(as_non_negative_integer(&json!(2.5)), None);
        assert_eq!(as_non_negative_integer(&json!(-1)), None);
        assert_eq!(as_non_negative_integer(&json!("1")), None);
    }
}
