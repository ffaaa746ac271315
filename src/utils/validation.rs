//! Input validation primitives.
//!
//! Replace verbose `ok_or_else` + `Error::validation_invalid_argument` chains
//! and check config values before they reach a remote shell.

use crate::error::{Error, Result};

/// Require a string to be non-empty after trimming.
///
/// Returns a reference to the trimmed string on success.
pub fn require_non_empty<'a>(value: &'a str, field: &str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::validation_invalid_argument(field, message, None, None))
    } else {
        Ok(trimmed)
    }
}

/// Require an octal permission mode such as `755` or `0644`.
pub fn require_octal_mode<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let valid = (3..=4).contains(&value.len()) && value.chars().all(|c| ('0'..='7').contains(&c));
    if valid {
        Ok(value)
    } else {
        Err(Error::config_invalid_value(
            field,
            Some(value.to_string()),
            "Expected an octal mode like 755",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_non_empty_trims_whitespace() {
        let result = require_non_empty("  hello  ", "field", "msg");
        assert_eq!(result.unwrap(), "hello");
    }

    #[test]
    fn require_non_empty_fails_for_whitespace_only() {
        let result = require_non_empty("   ", "field", "Cannot be empty");
        assert!(result.is_err());
    }

    #[test]
    fn octal_modes() {
        assert!(require_octal_mode("755", "dir_mode").is_ok());
        assert!(require_octal_mode("0600", "config_mode").is_ok());
        assert!(require_octal_mode("u+rw", "file_mode").is_err());
        assert!(require_octal_mode("888", "file_mode").is_err());
        assert!(require_octal_mode("7;rm", "file_mode").is_err());
    }
}
