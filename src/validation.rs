use crate::models::Address;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    #[error("Invalid identifier: {0}. Expected a 0x address or a name such as vitalik.eth")]
    InvalidIdentifier(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// What a user-supplied identifier looks like before any lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Address(Address),
    Name(String),
}

/// Parse `0x` + 40 hex digits (any case) into its canonical lowercase form.
pub fn validate_evm_address(address: &str) -> Result<Address, ValidationError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| ValidationError::InvalidAddress(trimmed.to_string()))?;

    let decoded = hex::decode(digits)
        .map_err(|_| ValidationError::InvalidAddress(trimmed.to_string()))?;

    // Ethereum-style addresses are 20 bytes
    if decoded.len() != 20 {
        return Err(ValidationError::InvalidAddress(trimmed.to_string()));
    }

    Ok(Address::from_canonical(format!("0x{}", hex::encode(decoded))))
}

pub fn parse_identifier(identifier: &str) -> Result<Identifier, ValidationError> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    if let Ok(address) = validate_evm_address(trimmed) {
        return Ok(Identifier::Address(address));
    }

    let looks_like_name = trimmed.contains('.')
        && !trimmed.starts_with('.')
        && !trimmed.ends_with('.')
        && !trimmed.chars().any(char::is_whitespace);
    if looks_like_name {
        return Ok(Identifier::Name(trimmed.to_lowercase()));
    }

    Err(ValidationError::InvalidIdentifier(trimmed.to_string()))
}

/// Requested window in days; absent means the full history horizon.
pub fn validate_window_days(days: Option<&str>, max_days: u32) -> Result<u32, ValidationError> {
    let Some(raw) = days.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(max_days);
    };

    match raw.parse::<u32>() {
        Ok(days) if (1..=max_days).contains(&days) => Ok(days),
        _ => Err(ValidationError::InvalidParameter(format!(
            "days must be an integer between 1 and {}",
            max_days
        ))),
    }
}
