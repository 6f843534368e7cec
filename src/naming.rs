//! Name normalization rules shared by slot resolution, combination
//! filtering, and download filename derivation.

/// Normalized ordering key for matching variants across component sets:
/// lowercased, alphanumeric only. `None` when nothing survives, so callers
/// can treat unparseable names as "no key" instead of matching on `""`.
pub fn variant_key(name: &str) -> Option<String> {
    let key: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if key.is_empty() { None } else { Some(key) }
}

/// Layer name with a trailing `" (<digits>)"` duplicate suffix removed,
/// trimmed on both ends.
pub fn clean_layer_name(name: &str) -> String {
    if name.ends_with(')')
        && let Some(open) = name.rfind('(')
    {
        let digits = &name[open + 1..name.len() - 1];
        let before = &name[..open];
        if !digits.is_empty()
            && digits.chars().all(|c| c.is_ascii_digit())
            && before.ends_with(char::is_whitespace)
        {
            return before.trim().to_string();
        }
    }
    name.trim().to_string()
}

/// First `/`-segment of the cleaned layer name. Layers named after their
/// set ("Disclaimer/Legal (2)") resolve to the set name ("Disclaimer").
pub fn base_set_name(name: &str) -> String {
    clean_layer_name(name)
        .split('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Layers named exactly "hero" are the background-image slot.
pub fn is_hero_name(name: &str) -> bool {
    name.trim().to_lowercase() == "hero"
}

/// Download filename for a generated record: `<template>_<variant>_<image>.png`
/// with empty parts omitted. The variant part comes from the first component
/// name carrying a `Property`/`Offer` marker, with the marker (and its
/// numeric counter) stripped.
pub fn export_filename(
    template_name: &str,
    component_names: &[String],
    image_name: Option<&str>,
) -> String {
    let safe_template = retain_name_chars(&collapse_whitespace(template_name, '_'), false);

    let variant_part = component_names
        .iter()
        .find(|n| n.contains("Property") || n.contains("Offer"))
        .map(|n| {
            let stripped = strip_variant_markers(n)
                .replace('=', " ")
                .replace('_', " ");
            collapse_whitespace(stripped.trim(), '_')
        })
        .unwrap_or_default();
    let safe_variant = retain_name_chars(&variant_part, true);

    let safe_image = image_name
        .map(|n| strip_extension(&retain_name_chars(&collapse_whitespace(n, '_'), true)))
        .unwrap_or_default();

    let parts: Vec<&str> = [safe_template.as_str(), safe_variant.as_str(), safe_image.as_str()]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    format!("{}.png", parts.join("_"))
}

/// Removes every `Property`/`Offer` occurrence (case-insensitive), together
/// with a following ` <digits>` counter when present.
fn strip_variant_markers(s: &str) -> String {
    const MARKERS: [&str; 2] = ["property", "offer"];
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let marker = MARKERS.iter().find(|m| {
            bytes.len() - i >= m.len() && bytes[i..i + m.len()].eq_ignore_ascii_case(m.as_bytes())
        });
        let Some(marker) = marker else {
            out.push(bytes[i]);
            i += 1;
            continue;
        };
        i += marker.len();

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let ws_end = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if ws_end > i && j > ws_end {
            i = j;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn collapse_whitespace(s: &str, sep: char) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push(sep);
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

fn retain_name_chars(s: &str, allow_dot: bool) -> String {
    s.chars()
        .filter(|c| {
            c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || (allow_dot && *c == '.')
        })
        .collect()
}

fn strip_extension(s: &str) -> String {
    if let Some(pos) = s.rfind('.') {
        let rest = &s[pos + 1..];
        if !rest.is_empty() && !rest.contains('/') {
            return s[..pos].to_string();
        }
    }
    s.to_string()
}
