const FALLBACK_ID: &str = "project";

/// Lowercases `raw` and collapses every run of characters outside `[a-z0-9]`
/// into one `-`, with no leading or trailing `-`. Not unique on its own.
pub fn sanitize_id(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.chars().map(|ch| ch.to_ascii_lowercase()) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Sanitizes `name` and probes `base`, `base-1`, `base-2`, ... until `exists`
/// reports a free candidate. Sequential, so the result is deterministic for a
/// given on-disk state.
pub fn unique_id<F>(name: &str, mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let mut base = sanitize_id(name);
    if base.is_empty() {
        base = FALLBACK_ID.to_string();
    }
    if !exists(&base) {
        return base;
    }

    let mut suffix = 1u64;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !exists(&candidate) {
            tracing::debug!(base = %base, id = %candidate, "resolved id collision");
            return candidate;
        }
        suffix += 1;
    }
}
