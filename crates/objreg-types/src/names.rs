//! Object name validation.
//!
//! Valid object names:
//! - Must be non-empty
//! - Must not start or end with whitespace
//! - Must not contain control characters (including newlines and tabs)

use crate::error::TypeError;

/// Validate a registry key, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use objreg_types::validate_object_name;
///
/// assert!(validate_object_name("curve.usd").is_ok());
/// assert!(validate_object_name("my matrix").is_ok());
/// assert!(validate_object_name("").is_err());
/// assert!(validate_object_name(" padded").is_err());
/// ```
pub fn validate_object_name(name: &str) -> Result<(), TypeError> {
    if name.is_empty() {
        return Err(invalid(name, "name must not be empty"));
    }

    if name.starts_with(char::is_whitespace) || name.ends_with(char::is_whitespace) {
        return Err(invalid(name, "must not start or end with whitespace"));
    }

    if let Some(ch) = name.chars().find(|c| c.is_control()) {
        return Err(invalid(
            name,
            &format!("contains control character: {ch:?}"),
        ));
    }

    Ok(())
}

fn invalid(name: &str, reason: &str) -> TypeError {
    TypeError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
