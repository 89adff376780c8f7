/// Markers sources use instead of a number ("Price on Application" and friends)
const NON_NUMERIC_MARKERS: [&str; 4] = ["POA", "N/A", "ASKING", ""];

/// Parse a free-form price such as `"€450,000"` into a number.
///
/// Currency symbols and thousands separators are stripped. Missing input,
/// sentinel markers and anything else that does not parse come back as `None`.
pub fn normalize_price(text: Option<&str>) -> Option<f64> {
    let cleaned: String = text?
        .chars()
        .filter(|c| !matches!(c, '€' | '£' | '$' | ','))
        .collect();
    let cleaned = cleaned.trim();

    if NON_NUMERIC_MARKERS
        .iter()
        .any(|marker| cleaned.eq_ignore_ascii_case(marker))
    {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}
