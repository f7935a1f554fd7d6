//! Decimal text <-> integer minor units. No floating point anywhere.

/// Parse a decimal amount into minor units with `digits` fractional places.
///
/// Accepts thousands separators (`1,500.00`), a leading sign, and accounting
/// negatives (`(250.50)`). Fractional digits beyond `digits` are accepted only
/// when they are zeros; anything else would need rounding, which is refused.
pub fn parse_minor_units(input: &str, digits: u32) -> Option<i64> {
    let mut s: String = input
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();
    if s.is_empty() {
        return None;
    }

    let mut negative = false;
    let mut parenthesized = false;
    if s.starts_with('(') && s.ends_with(')') && s.len() > 2 {
        parenthesized = true;
        s = s[1..s.len() - 1].to_string();
    }
    let body = if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        rest
    } else if let Some(rest) = s.strip_prefix('+') {
        rest
    } else {
        s.as_str()
    };
    if parenthesized {
        // "(-5)" and "(+5)" have no single reading
        if body.len() != s.len() {
            return None;
        }
        negative = true;
    }

    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let digits = digits as usize;
    let (kept, dropped) = if frac_part.len() > digits {
        frac_part.split_at(digits)
    } else {
        (frac_part, "")
    };
    if dropped.chars().any(|c| c != '0') {
        return None;
    }

    let scale = 10i64.checked_pow(digits as u32)?;
    let int_value: i64 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
    let mut frac_value: i64 = if kept.is_empty() { 0 } else { kept.parse().ok()? };
    for _ in kept.len()..digits {
        frac_value = frac_value.checked_mul(10)?;
    }

    let magnitude = int_value.checked_mul(scale)?.checked_add(frac_value)?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Render minor units as a plain decimal string (`-1000.00`).
pub fn format_minor_units(value: i64, digits: u32) -> String {
    format_minor_units_wide(i128::from(value), digits)
}

/// Same as [`format_minor_units`] for run totals, which can exceed `i64`.
pub fn format_minor_units_wide(value: i128, digits: u32) -> String {
    if digits == 0 {
        return value.to_string();
    }
    let scale = 10u128.pow(digits);
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs();
    format!(
        "{sign}{}.{:0width$}",
        magnitude / scale,
        magnitude % scale,
        width = digits as usize
    )
}
