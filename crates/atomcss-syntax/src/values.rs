//! Value handlers.
//!
//! Utility rules turn the value part of a token (`2` in `p-2`, `[12px]` in
//! `w-[12px]`) into a CSS value. Each handler is a pure function that either
//! recognizes its input and returns a CSS value, or returns `None`. Handlers
//! are tried in an explicit order and the first `Some` wins:
//!
//! ```
//! use atomcss_syntax::values::{handle, bracket, rem, fraction};
//!
//! let chain = [bracket, fraction, rem];
//! assert_eq!(handle("2", &chain).as_deref(), Some("0.5rem"));
//! assert_eq!(handle("1/2", &chain).as_deref(), Some("50%"));
//! assert_eq!(handle("[calc(100%_-_1px)]", &chain).as_deref(), Some("calc(100% - 1px)"));
//! assert_eq!(handle("huge", &chain), None);
//! ```
//!
//! [`ValueKinds`] names handler sets with bitflags, for rules that want to
//! declare what they accept instead of spelling out a slice.

use bitflags::bitflags;

use crate::units::{dimension, format_number, number as parse_number};

/// A value handler: recognizes one value shape.
pub type ValueHandler = fn(&str) -> Option<String>;

/// Runs handlers in order and returns the first recognized value.
pub fn handle(value: &str, handlers: &[ValueHandler]) -> Option<String> {
    handlers.iter().find_map(|h| h(value))
}

const GLOBAL_KEYWORDS: &[&str] = &["inherit", "initial", "revert", "revert-layer", "unset"];

/// `[arbitrary_value]` with `_` meaning a space (`\_` keeps a literal `_`).
pub fn bracket(value: &str) -> Option<String> {
    let inner = value.strip_prefix('[')?.strip_suffix(']')?;
    if inner.is_empty() {
        return None;
    }
    let mut depth = 0i32;
    for c in inner.chars() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'_') => {
                chars.next();
                out.push('_');
            }
            '_' => out.push(' '),
            _ => out.push(c),
        }
    }
    Some(out)
}

/// `$name` becomes `var(--name)`.
pub fn css_var(value: &str) -> Option<String> {
    let name = value.strip_prefix('$')?;
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    Some(format!("var(--{})", name))
}

/// CSS-wide keywords such as `inherit` and `unset`.
pub fn global(value: &str) -> Option<String> {
    GLOBAL_KEYWORDS
        .contains(&value)
        .then(|| value.to_string())
}

/// The `auto` keyword.
pub fn auto(value: &str) -> Option<String> {
    (value == "auto").then(|| "auto".to_string())
}

/// Unitless numbers map onto a quarter-rem scale (`4` is `1rem`); numbers
/// that already carry a unit are passed through.
pub fn rem(value: &str) -> Option<String> {
    let dim = dimension(value)?;
    if dim.value == 0.0 {
        return Some("0".to_string());
    }
    match dim.unit {
        Some(unit) => Some(format!("{}{}", format_number(dim.value), unit)),
        None => Some(format!("{}rem", format_number(dim.value / 4.0))),
    }
}

/// Unitless numbers become pixels.
pub fn px(value: &str) -> Option<String> {
    let dim = dimension(value)?;
    if dim.value == 0.0 {
        return Some("0".to_string());
    }
    Some(format!(
        "{}{}",
        format_number(dim.value),
        dim.unit.as_deref().unwrap_or("px")
    ))
}

/// A plain number, without unit.
pub fn number(value: &str) -> Option<String> {
    parse_number(value).map(format_number)
}

/// A number with any known unit, or none.
pub fn number_with_unit(value: &str) -> Option<String> {
    dimension(value).map(|d| d.to_string())
}

/// `50` or `50%` become `50%`.
pub fn percent(value: &str) -> Option<String> {
    let raw = value.strip_suffix('%').unwrap_or(value);
    parse_number(raw).map(|n| format!("{}%", format_number(n)))
}

/// `a/b` becomes a percentage; `full` is `100%`.
pub fn fraction(value: &str) -> Option<String> {
    if value == "full" {
        return Some("100%".to_string());
    }
    let (num, den) = value.split_once('/')?;
    let num = parse_number(num)?;
    let den = parse_number(den)?;
    if den == 0.0 {
        return None;
    }
    Some(format!("{}%", format_number(num / den * 100.0)))
}

/// Unitless numbers become milliseconds.
pub fn time(value: &str) -> Option<String> {
    let dim = dimension(value)?;
    match dim.unit.as_deref() {
        None => Some(format!("{}ms", format_number(dim.value))),
        Some("s") | Some("ms") => Some(dim.to_string()),
        _ => None,
    }
}

/// Unitless numbers become degrees.
pub fn degree(value: &str) -> Option<String> {
    let dim = dimension(value)?;
    match dim.unit.as_deref() {
        None => Some(format!("{}deg", format_number(dim.value))),
        Some("deg") | Some("rad") | Some("turn") => Some(dim.to_string()),
        _ => None,
    }
}

bitflags! {
    /// Named sets of value handlers.
    ///
    /// [`ValueKinds::handlers`] expands a set into the ordered handler list;
    /// the order is fixed (bracket first, plain numbers last) regardless of
    /// the order flags were combined in.
    ///
    /// ```
    /// use atomcss_syntax::values::ValueKinds;
    ///
    /// let kinds = ValueKinds::BRACKET | ValueKinds::PX;
    /// assert_eq!(kinds.resolve("3").as_deref(), Some("3px"));
    /// assert_eq!(kinds.resolve("[1em]").as_deref(), Some("1em"));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ValueKinds: u16 {
        const BRACKET  = 0b0000_0000_0001;
        const CSS_VAR  = 0b0000_0000_0010;
        const GLOBAL   = 0b0000_0000_0100;
        const AUTO     = 0b0000_0000_1000;
        const FRACTION = 0b0000_0001_0000;
        const REM      = 0b0000_0010_0000;
        const PX       = 0b0000_0100_0000;
        const PERCENT  = 0b0000_1000_0000;
        const TIME     = 0b0001_0000_0000;
        const DEGREE   = 0b0010_0000_0000;
        const NUMBER   = 0b0100_0000_0000;

        /// The usual chain for spacing scales.
        const SPACING = Self::BRACKET.bits()
            | Self::CSS_VAR.bits()
            | Self::GLOBAL.bits()
            | Self::AUTO.bits()
            | Self::FRACTION.bits()
            | Self::REM.bits();
    }
}

impl ValueKinds {
    /// Expands the set into handlers, in evaluation order.
    pub fn handlers(self) -> Vec<ValueHandler> {
        let table: [(ValueKinds, ValueHandler); 11] = [
            (ValueKinds::BRACKET, bracket),
            (ValueKinds::CSS_VAR, css_var),
            (ValueKinds::GLOBAL, global),
            (ValueKinds::AUTO, auto),
            (ValueKinds::FRACTION, fraction),
            (ValueKinds::TIME, time),
            (ValueKinds::DEGREE, degree),
            (ValueKinds::PERCENT, percent),
            (ValueKinds::REM, rem),
            (ValueKinds::PX, px),
            (ValueKinds::NUMBER, number),
        ];
        table
            .into_iter()
            .filter(|(kind, _)| self.contains(*kind))
            .map(|(_, h)| h)
            .collect()
    }

    /// Resolves a value against this set.
    pub fn resolve(self, value: &str) -> Option<String> {
        handle(value, &self.handlers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_unescapes() {
        assert_eq!(bracket("[1px_solid_red]").as_deref(), Some("1px solid red"));
        assert_eq!(bracket("[a\\_b]").as_deref(), Some("a_b"));
        assert_eq!(bracket("[]"), None);
        assert_eq!(bracket("[a]]"), None);
        assert_eq!(bracket("12px"), None);
    }

    #[test]
    fn rem_scale() {
        assert_eq!(rem("4").as_deref(), Some("1rem"));
        assert_eq!(rem("1.5").as_deref(), Some("0.375rem"));
        assert_eq!(rem("0").as_deref(), Some("0"));
        assert_eq!(rem("3px").as_deref(), Some("3px"));
        assert_eq!(rem("x"), None);
    }

    #[test]
    fn fractions() {
        assert_eq!(fraction("1/3").as_deref(), Some("33.333333%"));
        assert_eq!(fraction("1/0"), None);
        assert_eq!(fraction("full").as_deref(), Some("100%"));
    }

    #[test]
    fn keywords() {
        assert_eq!(global("unset").as_deref(), Some("unset"));
        assert_eq!(global("none"), None);
        assert_eq!(auto("auto").as_deref(), Some("auto"));
    }

    #[test]
    fn css_vars() {
        assert_eq!(css_var("$gap").as_deref(), Some("var(--gap)"));
        assert_eq!(css_var("$"), None);
        assert_eq!(css_var("$a b"), None);
    }

    #[test]
    fn time_and_degree() {
        assert_eq!(time("150").as_deref(), Some("150ms"));
        assert_eq!(time("1s").as_deref(), Some("1s"));
        assert_eq!(time("1px"), None);
        assert_eq!(degree("45").as_deref(), Some("45deg"));
    }

    #[test]
    fn spacing_set_order() {
        let kinds = ValueKinds::SPACING;
        assert_eq!(kinds.resolve("auto").as_deref(), Some("auto"));
        assert_eq!(kinds.resolve("1/2").as_deref(), Some("50%"));
        assert_eq!(kinds.resolve("8").as_deref(), Some("2rem"));
        assert_eq!(kinds.resolve("$x").as_deref(), Some("var(--x)"));
    }
}
