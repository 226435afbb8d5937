//! Token splitting for arbitrary source text.
//!
//! The default extraction strategy does not understand any template
//! language: it cuts source text on whitespace, quotes, semicolons and
//! braces and keeps every fragment that could plausibly be a utility token.
//! Fragments that match nothing are simply reported as misses later.

use nom::{
    IResult,
    bytes::complete::{take_while, take_while1},
    multi::many0,
    sequence::preceded,
};

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\'' | '"' | '`' | ';' | '{' | '}' | '\\')
}

fn fragments(input: &str) -> IResult<&str, Vec<&str>> {
    many0(preceded(
        take_while(is_separator),
        take_while1(|c: char| !is_separator(c)),
    ))(input)
}

/// Returns true if a fragment is worth trying as a token.
///
/// A candidate needs at least one ASCII alphanumeric character and must not
/// look like a custom property (`--x`) or a bare number.
pub fn is_candidate(fragment: &str) -> bool {
    if fragment.starts_with("--") || fragment.len() > 256 {
        return false;
    }
    if fragment.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-') {
        return false;
    }
    fragment.chars().any(|c| c.is_ascii_alphanumeric())
}

/// Splits source text into candidate tokens, in order of appearance.
///
/// ```
/// use atomcss_syntax::split::split_code;
///
/// let tokens = split_code(r#"<div class="p-2 hover:m-1">{x}</div>"#);
/// assert!(tokens.contains(&"p-2"));
/// assert!(tokens.contains(&"hover:m-1"));
/// ```
pub fn split_code(code: &str) -> Vec<&str> {
    match fragments(code) {
        Ok((_, parts)) => parts.into_iter().filter(|p| is_candidate(p)).collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_quotes_and_braces() {
        assert_eq!(
            split_code("a 'b' \"c\";{d}`e`"),
            vec!["a", "b", "c", "d", "e"]
        );
    }

    #[test]
    fn filters_noise() {
        assert_eq!(split_code("-- --x 12 1.5 -3 ok"), vec!["ok"]);
    }

    #[test]
    fn trailing_separators_are_fine() {
        assert_eq!(split_code("flex   "), vec!["flex"]);
        assert!(split_code("").is_empty());
        assert!(split_code("   ").is_empty());
    }
}
