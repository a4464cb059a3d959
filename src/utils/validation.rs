use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 檢查鍵值不重複，回報第一個重複的鍵
pub fn validate_unique_keys<'a, I>(field_name: &str, keys: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: key.to_string(),
                reason: "Duplicate key".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("request_timeout", 5, 1).is_ok());
        assert!(validate_positive_number("request_timeout", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("port", 28015u32, 1, 65535).is_ok());
        assert!(validate_range("port", 0u32, 1, 65535).is_err());
        assert!(validate_range("port", 70000u32, 1, 65535).is_err());
    }

    #[test]
    fn test_validate_unique_keys() {
        assert!(validate_unique_keys("entities.key", ["a", "b"]).is_ok());

        let err = validate_unique_keys("entities.key", ["a", "b", "a"]).unwrap_err();
        match err {
            EtlError::InvalidConfigValueError { value, .. } => assert_eq!(value, "a"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("name", "orders").is_ok());
        assert!(validate_non_empty_string("name", "   ").is_err());
    }
}
