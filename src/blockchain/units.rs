//! Exact integer handling of native-token quantities

/// Parse an unsigned quantity given either as decimal digits or as `0x` hex.
pub fn parse_quantity(raw: &str) -> Option<u128> {
    let raw = raw.trim();
    if let Some(hex_digits) = raw.strip_prefix("0x") {
        return u128::from_str_radix(hex_digits, 16).ok();
    }
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// `gas_used * gas_price` in the smallest native unit. `None` only on overflow.
pub fn fee_from_components(gas_used: u64, gas_price: u128) -> Option<u128> {
    u128::from(gas_used).checked_mul(gas_price)
}

/// Scale a decimal string in whole units (`"0.00105"`) to the smallest unit.
///
/// Digits below the smallest unit are truncated. Signs, exponents and
/// anything else that is not `digits[.digits]` are rejected.
pub fn parse_decimal_units(raw: &str, decimals: u32) -> Option<u128> {
    let raw = raw.trim();
    let (whole, fraction) = match raw.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (raw, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return None;
    }

    let scale = 10u128.checked_pow(decimals)?;
    let whole_units = if whole.is_empty() { 0 } else { whole.parse::<u128>().ok()? };

    let kept = &fraction[..fraction.len().min(decimals as usize)];
    let fraction_units = if kept.is_empty() {
        0
    } else {
        let padding = 10u128.checked_pow(decimals - kept.len() as u32)?;
        kept.parse::<u128>().ok()?.checked_mul(padding)?
    };

    whole_units.checked_mul(scale)?.checked_add(fraction_units)
}

/// Convert a smallest-unit quantity to whole units for display and pricing.
pub fn to_whole_units(amount: u128, decimals: u32) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}
