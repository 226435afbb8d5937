//! Numeric value and unit parsing.
//!
//! Parses the small numeric grammar utility tokens use for sizes:
//! an optional sign, an integer or decimal, and an optional unit
//! (`2`, `-1.5`, `.25`, `12px`, `50%`, `100vh`).

use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, char, digit0, digit1},
    combinator::{all_consuming, map_res, opt, recognize},
    sequence::tuple,
};

/// Units accepted after a number.
pub const KNOWN_UNITS: &[&str] = &[
    "px", "pt", "pc", "%", "em", "rem", "ex", "rex", "lh", "rlh", "cap", "ch", "rch", "ic", "vw",
    "vh", "vi", "vb", "vmin", "vmax", "svw", "svh", "lvw", "lvh", "dvw", "dvh", "cqw", "cqh",
    "cqi", "cqb", "cqmin", "cqmax", "in", "cm", "mm", "q", "rpx", "fr", "deg", "rad", "turn", "s",
    "ms",
];

/// A parsed number with an optional unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub value: f64,
    pub unit: Option<String>,
}

impl Dimension {
    /// Returns true if this dimension carries no unit.
    pub fn is_unitless(&self) -> bool {
        self.unit.is_none()
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            format_number(self.value),
            self.unit.as_deref().unwrap_or("")
        )
    }
}

/// Parses a signed integer or decimal number.
pub fn parse_number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            alt((recognize(tuple((digit0, char('.'), digit1))), digit1)),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

fn parse_unit(input: &str) -> IResult<&str, &str> {
    alt((tag("%"), alpha1))(input)
}

/// Parses a number followed by an optional unit.
pub fn parse_dimension(input: &str) -> IResult<&str, Dimension> {
    let (input, value) = parse_number(input)?;
    let (input, unit) = opt(parse_unit)(input)?;
    Ok((
        input,
        Dimension {
            value,
            unit: unit.map(|u| u.to_ascii_lowercase()),
        },
    ))
}

/// Parses a complete dimension, rejecting trailing input and unknown units.
///
/// ```
/// use atomcss_syntax::units::dimension;
///
/// let d = dimension("1.5rem").unwrap();
/// assert_eq!(d.value, 1.5);
/// assert_eq!(d.unit.as_deref(), Some("rem"));
/// assert!(dimension("3parsecs").is_none());
/// ```
pub fn dimension(input: &str) -> Option<Dimension> {
    let (_, dim) = all_consuming(parse_dimension)(input).ok()?;
    match &dim.unit {
        Some(unit) if !KNOWN_UNITS.contains(&unit.as_str()) => None,
        _ => Some(dim),
    }
}

/// Parses a complete unitless number.
pub fn number(input: &str) -> Option<f64> {
    all_consuming(parse_number)(input).ok().map(|(_, n)| n)
}

/// Formats a number the way it should appear in CSS output: rounded to six
/// decimal places, without a trailing `.0`, and with `-0` normalized to `0`.
pub fn format_number(value: f64) -> String {
    let rounded = (value * 1_000_000.0).round() / 1_000_000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{}", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_and_decimals() {
        assert_eq!(number("12"), Some(12.0));
        assert_eq!(number("-3"), Some(-3.0));
        assert_eq!(number("1.25"), Some(1.25));
        assert_eq!(number(".5"), Some(0.5));
        assert_eq!(number("1."), None);
        assert_eq!(number("abc"), None);
    }

    #[test]
    fn dimensions_with_units() {
        assert_eq!(
            dimension("50%"),
            Some(Dimension {
                value: 50.0,
                unit: Some("%".into())
            })
        );
        assert_eq!(dimension("10PX").unwrap().unit.as_deref(), Some("px"));
        assert!(dimension("4").unwrap().is_unitless());
        assert_eq!(dimension("4zz"), None);
    }

    #[test]
    fn formatting_trims_noise() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.125), "0.125");
    }

    #[test]
    fn dimension_display() {
        assert_eq!(dimension("1.50rem").unwrap().to_string(), "1.5rem");
    }
}
