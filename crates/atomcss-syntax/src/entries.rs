//! Flat CSS declaration lists.
//!
//! The engine never builds a CSS tree. Every utility produces an ordered
//! list of `property: value` pairs which is serialized into a declaration
//! body such as `margin:0.5rem;padding:1px;`.

/// A single `property: value` declaration.
pub type CssEntry = (String, String);

/// An ordered list of declarations.
pub type CssEntries = Vec<CssEntry>;

/// Builds an owned entry list from string slices.
///
/// ```
/// use atomcss_syntax::entries::entries;
///
/// let e = entries(&[("display", "flex"), ("gap", "1rem")]);
/// assert_eq!(e[1], ("gap".to_string(), "1rem".to_string()));
/// ```
pub fn entries(pairs: &[(&str, &str)]) -> CssEntries {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Removes declarations with empty properties or values and collapses
/// exact duplicates, keeping the last occurrence's position.
pub fn normalize_entries(input: &[CssEntry]) -> CssEntries {
    let mut out: CssEntries = Vec::with_capacity(input.len());
    for (prop, value) in input {
        let prop = prop.trim();
        let value = value.trim();
        if prop.is_empty() || value.is_empty() {
            continue;
        }
        out.retain(|(p, v)| !(p == prop && v == value));
        out.push((prop.to_string(), value.to_string()));
    }
    out
}

/// Serializes entries into a declaration body.
///
/// Returns `None` when nothing is left after normalization, so callers can
/// drop the utility entirely.
///
/// ```
/// use atomcss_syntax::entries::{entries, entries_to_css};
///
/// let body = entries_to_css(&entries(&[("margin", "4px"), ("color", "red")]));
/// assert_eq!(body.as_deref(), Some("margin:4px;color:red;"));
/// ```
pub fn entries_to_css(input: &[CssEntry]) -> Option<String> {
    let normalized = normalize_entries(input);
    if normalized.is_empty() {
        return None;
    }
    let mut body = String::new();
    for (prop, value) in &normalized {
        body.push_str(prop);
        body.push(':');
        body.push_str(value);
        body.push(';');
    }
    Some(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_are_dropped() {
        let e = entries(&[("margin", ""), ("", "red"), ("color", "red")]);
        assert_eq!(entries_to_css(&e).as_deref(), Some("color:red;"));
    }

    #[test]
    fn nothing_left_is_none() {
        assert_eq!(entries_to_css(&entries(&[("margin", " ")])), None);
        assert_eq!(entries_to_css(&[]), None);
    }

    #[test]
    fn duplicates_keep_last_position() {
        let e = entries(&[("a", "1"), ("b", "2"), ("a", "1")]);
        assert_eq!(entries_to_css(&e).as_deref(), Some("b:2;a:1;"));
    }

    #[test]
    fn same_property_different_value_kept() {
        let e = entries(&[("display", "-webkit-box"), ("display", "flex")]);
        assert_eq!(
            entries_to_css(&e).as_deref(),
            Some("display:-webkit-box;display:flex;")
        );
    }
}
