//! Argument guards shared by the transport and the bridges.
//!
//! Every guard fails with [`BridgeError::Validation`] so callers can tell a
//! malformed request apart from a service failure.

use url::Url;

use crate::errors::{BridgeError, Result};

#[must_use]
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// # Errors
///
/// Returns a validation error if `value` is missing, empty or whitespace.
pub fn verify_not_blank(value: Option<&str>, name: &str) -> Result<()> {
    match value {
        Some(v) if !is_blank(v) => Ok(()),
        _ => Err(BridgeError::Validation(format!(
            "{name} should not be null or empty"
        ))),
    }
}

/// # Errors
///
/// Returns a validation error unless `url` parses as an absolute URL with a host.
pub fn verify_valid_url(url: &str) -> Result<Url> {
    verify_not_blank(Some(url), "url")?;
    let parsed =
        Url::parse(url).map_err(|e| BridgeError::Validation(format!("Invalid Url: {url} ({e})")))?;
    if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
        return Err(BridgeError::Validation(format!("Invalid Url: {url}")));
    }
    Ok(parsed)
}

/// # Errors
///
/// Returns a validation error if `value` is negative.
pub fn verify_non_negative(value: i32, name: &str) -> Result<()> {
    if value < 0 {
        return Err(BridgeError::Validation(format!(
            "{name} should not be negative"
        )));
    }
    Ok(())
}

/// # Errors
///
/// Returns a validation error if `value` falls outside `low..=high`.
pub fn verify_in_range(value: i32, low: i32, high: i32, name: &str) -> Result<()> {
    if value < low || value > high {
        return Err(BridgeError::Validation(format!(
            "{name} with value {value} must be in range {low}..{high}"
        )));
    }
    Ok(())
}
