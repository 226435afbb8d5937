//! Selector escaping.
//!
//! Tokens may contain characters that are meaningful in CSS selectors
//! (`:`, `/`, `[`, `!`, ...). Before a token can be used as a class
//! selector it has to be escaped following the CSSOM `CSS.escape()`
//! algorithm, with `,` written as a hex escape so that merged selector
//! lists stay unambiguous.

/// Escapes a raw token so it can be used as a CSS identifier.
///
/// # Examples
///
/// ```
/// use atomcss_syntax::escape::escape_selector;
///
/// assert_eq!(escape_selector("hover:p-2"), "hover\\:p-2");
/// assert_eq!(escape_selector("w-1/2"), "w-1\\/2");
/// assert_eq!(escape_selector("2xl"), "\\32 xl");
/// ```
pub fn escape_selector(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let first = chars.first().copied();
    let mut out = String::with_capacity(raw.len() + 8);

    for (index, &c) in chars.iter().enumerate() {
        let code = c as u32;

        if code == 0 {
            out.push('\u{FFFD}');
            continue;
        }
        if c == ',' {
            out.push_str("\\2c ");
            continue;
        }

        let leading_digit = index == 0 && c.is_ascii_digit();
        let digit_after_dash = index == 1 && c.is_ascii_digit() && first == Some('-');
        if (0x01..=0x1f).contains(&code) || code == 0x7f || leading_digit || digit_after_dash {
            out.push_str(&format!("\\{:x} ", code));
            continue;
        }

        if index == 0 && chars.len() == 1 && c == '-' {
            out.push_str("\\-");
            continue;
        }

        if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() {
            out.push(c);
            continue;
        }

        out.push('\\');
        out.push(c);
    }

    out
}

/// Escapes a raw token and turns it into a class selector.
pub fn to_class_selector(raw: &str) -> String {
    format!(".{}", escape_selector(raw))
}
