pub const DEFAULT_REGION: &str = "US";

/// Canonicalizes a phone number to "+<country code><national digits>" so the
/// same number recorded with different punctuation or an implicit country
/// code still produces one map key. Anything that does not parse comes back
/// unchanged; normalization failure degrades to exact-string matching and is
/// never fatal.
pub fn normalize_phone(raw: &str, default_region: &str) -> String {
    match parse(raw, default_region) {
        Some(normalized) => normalized,
        None => raw.to_string(),
    }
}

fn parse(raw: &str, default_region: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut digits = String::new();
    let mut has_plus = false;
    for (idx, ch) in trimmed.chars().enumerate() {
        match ch {
            '+' if idx == 0 => has_plus = true,
            '0'..='9' => digits.push(ch),
            ' ' | '-' | '(' | ')' | '.' | '/' => {}
            _ => return None,
        }
    }
    if has_plus {
        return plausible(&digits).then(|| format!("+{}", digits));
    }
    let code = calling_code(default_region)?;
    let candidate = if code == "1" {
        // NANP: ten national digits (area code 2-9) or eleven with the
        // country code spelled out.
        match digits.len() {
            10 if !digits.starts_with('0') && !digits.starts_with('1') => format!("1{}", digits),
            11 if digits.starts_with('1') => digits.clone(),
            _ => return None,
        }
    } else {
        let national = digits.strip_prefix('0').unwrap_or(&digits);
        format!("{}{}", code, national)
    };
    plausible(&candidate).then(|| format!("+{}", candidate))
}

// E.164 is 8 to 15 digits and never starts with zero.
fn plausible(digits: &str) -> bool {
    (8..=15).contains(&digits.len()) && !digits.starts_with('0')
}

fn calling_code(region: &str) -> Option<&'static str> {
    match region {
        "US" | "CA" => Some("1"),
        "GB" => Some("44"),
        "IE" => Some("353"),
        "DE" => Some("49"),
        "FR" => Some("33"),
        "AU" => Some("61"),
        "NZ" => Some("64"),
        _ => None,
    }
}
