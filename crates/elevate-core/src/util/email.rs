//! Email address normalization.
//!
//! ## Summary
//! Addresses are compared case-insensitively by the identity provider, so the
//! profile store keeps them trimmed and lowercased. The check here is a
//! plausibility filter, not RFC 5322 validation; the provider is the final
//! judge of deliverability.

use crate::error::{CoreError, CoreResult};

const MAX_EMAIL_LEN: usize = 254;

/// Normalize an email address for storage and uniqueness checks.
///
/// Examples:
/// - " Taro@Example.com " -> "taro@example.com"
/// - "taro@localhost" -> error (no dot in domain)
///
/// ## Errors
/// Returns `ValidationError` if the address is empty or not of the form
/// `local@domain.tld`.
pub fn normalize_email(input: &str) -> CoreResult<String> {
    let email = input.trim().to_lowercase();

    if email.is_empty() {
        return Err(CoreError::ValidationError("Email is required".to_string()));
    }
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(invalid(&email));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid(&email));
    };

    let domain_ok = !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..");

    if local.is_empty() || !domain_ok {
        return Err(invalid(&email));
    }

    Ok(email)
}

fn invalid(email: &str) -> CoreError {
    CoreError::ValidationError(format!("Invalid email address: {email}"))
}
