//! Field checks shared by the plot and cadastra services.

use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct FieldError(pub String);

pub type FieldResult<T> = Result<T, FieldError>;

pub fn required(value: Option<String>, field: &str, max_len: usize) -> FieldResult<String> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| FieldError(format!("{} is required", field)))?;

    check_len(&value, field, max_len)?;
    Ok(value)
}

/// Blank optional text is stored as NULL.
pub fn optional(
    value: Option<String>,
    field: &str,
    max_len: Option<usize>,
) -> FieldResult<Option<String>> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    if let (Some(v), Some(max)) = (&value, max_len) {
        check_len(v, field, max)?;
    }
    Ok(value)
}

pub fn area_from_text(value: Option<&str>) -> FieldResult<f64> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| FieldError("area_sqm is required".to_string()))?;

    let area = raw
        .parse::<f64>()
        .map_err(|_| FieldError(format!("area_sqm must be a number, got '{}'", raw)))?;

    check_area(area)
}

/// The map client posts `area_sqm` as either a JSON number or a string.
pub fn area_from_json(value: &JsonValue) -> FieldResult<f64> {
    match value {
        JsonValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| FieldError("area_sqm must be a number".to_string()))
            .and_then(check_area),
        JsonValue::String(s) => area_from_text(Some(s)),
        JsonValue::Null => Err(FieldError("area_sqm is required".to_string())),
        _ => Err(FieldError("area_sqm must be a number".to_string())),
    }
}

fn check_area(area: f64) -> FieldResult<f64> {
    if !area.is_finite() || area < 0.0 {
        return Err(FieldError(
            "area_sqm must be a non-negative number".to_string(),
        ));
    }
    Ok(area)
}

fn check_len(value: &str, field: &str, max_len: usize) -> FieldResult<()> {
    if value.chars().count() > max_len {
        return Err(FieldError(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(
            required(Some("  Ama Mensah ".to_string()), "owner_name", 100),
            Ok("Ama Mensah".to_string())
        );
        assert!(required(Some("   ".to_string()), "owner_name", 100).is_err());
        assert!(required(None, "owner_name", 100).is_err());
    }

    #[test]
    fn test_length_limits() {
        assert!(required(Some("x".repeat(51)), "compliance_status", 50).is_err());
        assert!(optional(Some("x".repeat(101)), "land_use", Some(100)).is_err());
        assert_eq!(optional(Some("x".repeat(500)), "additional_info", None).unwrap().unwrap().len(), 500);
    }

    #[test]
    fn test_optional_blank_becomes_none() {
        assert_eq!(optional(Some(String::new()), "land_use", Some(100)), Ok(None));
    }

    #[test]
    fn test_area_parsing() {
        assert_eq!(area_from_text(Some("150.5")), Ok(150.5));
        assert!(area_from_text(Some("-1")).is_err());
        assert!(area_from_text(Some("NaN")).is_err());
        assert!(area_from_text(Some("big")).is_err());
        assert_eq!(area_from_json(&json!("42")), Ok(42.0));
        assert_eq!(area_from_json(&json!(12.25)), Ok(12.25));
        assert!(area_from_json(&json!(true)).is_err());
        assert!(area_from_json(&JsonValue::Null).is_err());
    }
}
