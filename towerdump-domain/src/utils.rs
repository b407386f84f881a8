// Cell coercion helpers shared by the load pipeline and registry

use serde_json::Value;

/// String view of a cell. Nulls and blank strings yield None; numbers are
/// rendered without a trailing fraction when they are whole, so numeric
/// identifier columns survive the round trip through a typed parser.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else {
                n.as_f64().map(|f| {
                    if f.fract() == 0.0 && f.abs() < 1e15 {
                        format!("{}", f as i64)
                    } else {
                        f.to_string()
                    }
                })
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric view of a cell; numeric-looking strings are accepted.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(
            value_to_string(&json!(123456789012345.0)),
            Some("123456789012345".to_string())
        );
        assert_eq!(value_to_string(&json!(42)), Some("42".to_string()));
    }

    #[test]
    fn blank_and_null_cells_are_none() {
        assert_eq!(value_to_string(&json!("   ")), None);
        assert_eq!(value_to_string(&Value::Null), None);
    }

    #[test]
    fn numeric_strings_coerce_to_f64() {
        assert_eq!(value_as_f64(&json!("45000")), Some(45000.0));
        assert_eq!(value_as_f64(&json!("12.75")), Some(12.75));
        assert_eq!(value_as_f64(&json!("2023-03-15")), None);
    }

    #[test]
    fn digit_check_requires_exact_length() {
        assert!(is_digits("9876543210", 10));
        assert!(!is_digits("98765", 10));
        assert!(!is_digits("98765432a0", 10));
    }
}
