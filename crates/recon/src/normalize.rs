// Identifier canonicalization shared by the importer and the gateway.
//
// Both sources must agree on the textual form of numeric ids: a spreadsheet
// cell holding 30.0 and a ledger field holding " 30" both join as "30".

/// Canonical form of a textual identifier.
///
/// Integer-looking text is re-rendered in plain decimal (`"030"` → `"30"`,
/// `"+7"` → `"7"`); everything else is only trimmed. Case is preserved.
pub fn canonical_id(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(n) => n.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

/// Canonical form of a numeric spreadsheet cell.
///
/// Integral values drop their fractional part (`30.0` → `"30"`); other values
/// keep Rust's shortest round-trip rendering (`30.5` → `"30.5"`).
pub fn canonical_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
