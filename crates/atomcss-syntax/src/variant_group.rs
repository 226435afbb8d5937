//! Variant group expansion.
//!
//! Variant groups are a shorthand for applying one prefix to several
//! tokens at once:
//!
//! ```text
//! hover:(bg-red text-white)   ->  hover:bg-red hover:text-white
//! sm:(p-2 hover:(m-1 m-2))    ->  sm:p-2 sm:hover:m-1 sm:hover:m-2
//! text-(lg center)            ->  text-lg text-center
//! ```
//!
//! A group opens when `(` directly follows a prefix ending in `:` or `-`
//! (or starts a word on its own). Parentheses inside `[...]` brackets and
//! after any other character are ordinary token text, so arbitrary values
//! such as `w-[calc(100%-1px)]` pass through untouched.

use nom::{
    IResult,
    character::complete::{char, multispace0},
    error::{Error, ErrorKind},
};

use crate::error::SyntaxError;

/// Maximum group nesting depth.
pub const MAX_GROUP_DEPTH: usize = 8;

/// Expands variant groups into a flat token list.
///
/// Malformed input (unbalanced parentheses, nesting too deep) falls back to
/// splitting on whitespace, so callers always get tokens back.
///
/// ```
/// use atomcss_syntax::variant_group::expand_variant_group;
///
/// assert_eq!(
///     expand_variant_group("hover:(p-2 m-1) flex"),
///     vec!["hover:p-2", "hover:m-1", "flex"]
/// );
/// ```
pub fn expand_variant_group(input: &str) -> Vec<String> {
    try_expand_variant_group(input)
        .unwrap_or_else(|_| input.split_whitespace().map(str::to_string).collect())
}

/// Expands variant groups, reporting malformed input.
pub fn try_expand_variant_group(input: &str) -> Result<Vec<String>, SyntaxError> {
    validate(input)?;
    match items(input, 0) {
        Ok((rest, tokens)) if rest.trim().is_empty() => Ok(tokens),
        Ok((rest, _)) => Err(SyntaxError::UnexpectedClose(input.len() - rest.len())),
        Err(_) => Err(SyntaxError::UnclosedGroup(0)),
    }
}

/// Checks parenthesis balance and depth, skipping bracketed values.
fn validate(input: &str) -> Result<(), SyntaxError> {
    let mut stack: Vec<usize> = Vec::new();
    let mut brackets = 0usize;
    for (pos, c) in input.char_indices() {
        match c {
            '[' => brackets += 1,
            ']' => brackets = brackets.saturating_sub(1),
            '(' if brackets == 0 => {
                stack.push(pos);
                if stack.len() > MAX_GROUP_DEPTH {
                    return Err(SyntaxError::TooDeep(MAX_GROUP_DEPTH));
                }
            }
            ')' if brackets == 0 => {
                if stack.pop().is_none() {
                    return Err(SyntaxError::UnexpectedClose(pos));
                }
            }
            _ => {}
        }
    }
    match stack.first() {
        Some(&pos) => Err(SyntaxError::UnclosedGroup(pos)),
        None => Ok(()),
    }
}

fn items(mut input: &str, depth: usize) -> IResult<&str, Vec<String>> {
    let mut out = Vec::new();
    loop {
        let (rest, _) = multispace0(input)?;
        input = rest;
        if input.is_empty() || input.starts_with(')') {
            return Ok((input, out));
        }
        let (rest, expanded) = item(input, depth)?;
        out.extend(expanded);
        input = rest;
    }
}

fn item(input: &str, depth: usize) -> IResult<&str, Vec<String>> {
    let (rest, prefix) = word(input)?;
    let opens_group = rest.starts_with('(')
        && (prefix.is_empty() || prefix.ends_with(':') || prefix.ends_with('-'));

    if !opens_group {
        if prefix.is_empty() {
            return Err(nom::Err::Error(Error::new(input, ErrorKind::TakeWhile1)));
        }
        return Ok((rest, vec![prefix.to_string()]));
    }

    if depth >= MAX_GROUP_DEPTH {
        return Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)));
    }

    let (rest, _) = char('(')(rest)?;
    let (rest, inner) = items(rest, depth + 1)?;
    let (rest, _) = char(')')(rest)?;

    let expanded = inner
        .into_iter()
        .map(|token| match token.strip_prefix('!') {
            Some(stripped) => format!("!{}{}", prefix, stripped),
            None => format!("{}{}", prefix, token),
        })
        .collect();
    Ok((rest, expanded))
}

/// Takes token text up to whitespace or a group parenthesis.
///
/// Bracketed sections are consumed whole. A `(` that cannot open a group
/// (the text before it does not end in a separator) is swallowed together
/// with its balanced contents.
fn word(input: &str) -> IResult<&str, &str> {
    let mut brackets = 0usize;
    let mut parens = 0usize;
    let mut end = input.len();

    for (pos, c) in input.char_indices() {
        if brackets > 0 {
            match c {
                '[' => brackets += 1,
                ']' => brackets -= 1,
                _ => {}
            }
            continue;
        }
        match c {
            '[' => brackets += 1,
            '(' if parens > 0 => parens += 1,
            '(' => {
                let before = &input[..pos];
                if before.is_empty() || before.ends_with(':') || before.ends_with('-') {
                    end = pos;
                    break;
                }
                parens += 1;
            }
            ')' if parens > 0 => parens -= 1,
            ')' => {
                end = pos;
                break;
            }
            c if c.is_whitespace() && parens == 0 => {
                end = pos;
                break;
            }
            _ => {}
        }
    }

    Ok((&input[end..], &input[..end]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_tokens_split_on_whitespace() {
        assert_eq!(
            expand_variant_group("  a  b\tc\n"),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn nested_groups() {
        assert_eq!(
            expand_variant_group("sm:(p-2 hover:(m-1 m-2))"),
            vec!["sm:p-2", "sm:hover:m-1", "sm:hover:m-2"]
        );
    }

    #[test]
    fn dash_prefix_groups() {
        assert_eq!(
            expand_variant_group("text-(lg center)"),
            vec!["text-lg", "text-center"]
        );
    }

    #[test]
    fn important_moves_to_front() {
        assert_eq!(
            expand_variant_group("hover:(!p-2 m-1)"),
            vec!["!hover:p-2", "hover:m-1"]
        );
    }

    #[test]
    fn brackets_are_opaque() {
        assert_eq!(
            expand_variant_group("w-[calc(100%_-_1px)] hover:(w-[calc(1px)])"),
            vec!["w-[calc(100%_-_1px)]", "hover:w-[calc(1px)]"]
        );
    }

    #[test]
    fn function_like_text_is_one_token() {
        assert_eq!(expand_variant_group("fn(a b) x"), vec!["fn(a b)", "x"]);
    }

    #[test]
    fn malformed_input_is_reported() {
        assert_eq!(
            try_expand_variant_group("hover:(a b"),
            Err(SyntaxError::UnclosedGroup(6))
        );
        assert_eq!(
            try_expand_variant_group("a)"),
            Err(SyntaxError::UnexpectedClose(1))
        );
        assert_eq!(expand_variant_group("hover:(a b"), vec!["hover:(a", "b"]);
    }

    #[test]
    fn depth_is_capped() {
        let deep = format!("{}x{}", "a:(".repeat(9), ")".repeat(9));
        assert_eq!(
            try_expand_variant_group(&deep),
            Err(SyntaxError::TooDeep(MAX_GROUP_DEPTH))
        );
    }
}
