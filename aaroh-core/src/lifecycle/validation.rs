use super::LifecycleError;

/// Trimmed value of a required text field.
pub(crate) fn required(field: &str, value: &str) -> Result<String, LifecycleError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LifecycleError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Normalised email with a local part and a dotted domain.
pub fn email(value: &str) -> Result<String, LifecycleError> {
    let normalized = crate::utils::otp::normalize_email(value);
    match normalized.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(normalized),
        _ => Err(LifecycleError::Validation("a valid email is required".into())),
    }
}

/// An absolute http(s) URL for uploaded media.
pub(crate) fn media_url(field: &str, value: &str) -> Result<String, LifecycleError> {
    let value = required(field, value)?;
    match url::Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(value),
        _ => Err(LifecycleError::Validation(format!(
            "{field} must be an http(s) URL"
        ))),
    }
}

pub(crate) fn positive_price(field: &str, value: rust_decimal::Decimal) -> Result<(), LifecycleError> {
    if value <= rust_decimal::Decimal::ZERO {
        return Err(LifecycleError::Validation(format!("{field} must be positive")));
    }
    Ok(())
}
