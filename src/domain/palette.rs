/// Built-in palette. Synthesized on first read of the palette document and
/// used by the taxonomy migration to color legacy feature names by position.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#4F46E5", "#0EA5E9", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899", "#14B8A6",
    "#F97316", "#64748B",
];

pub fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|color| color.to_string()).collect()
}

/// `#` followed by exactly six hex digits.
pub fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|ch| ch.is_ascii_hexdigit())
}

/// All-or-nothing: one malformed entry rejects the whole batch.
pub fn validate_palette(colors: &[String]) -> Result<(), String> {
    let invalid: Vec<&str> = colors
        .iter()
        .map(String::as_str)
        .filter(|color| !is_hex_color(color))
        .collect();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "invalid palette color(s): {}; expected #RRGGBB",
            invalid.join(", ")
        ))
    }
}

/// Cyclic position-based pick.
pub fn color_at(palette: &[&str], index: usize) -> String {
    if palette.is_empty() {
        return DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()].to_string();
    }
    palette[index % palette.len()].to_string()
}
