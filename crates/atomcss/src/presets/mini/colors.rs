use atomcss_syntax::units::{format_number, number};
use atomcss_syntax::values::bracket;

use crate::theme::Theme;

/// Parses `#rgb` or `#rrggbb`.
fn hex_to_rgb(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match digits.len() {
        3 => {
            let mut out = [0u8; 3];
            for (slot, c) in out.iter_mut().zip(digits.chars()) {
                let v = c.to_digit(16)? as u8;
                *slot = v * 16 + v;
            }
            Some(out)
        }
        6 => Some([
            channel(digits.get(0..2)?)?,
            channel(digits.get(2..4)?)?,
            channel(digits.get(4..6)?)?,
        ]),
        _ => None,
    }
}

/// Resolves a color token body such as `red-500`, `red-500/50` or
/// `[#0af]` to a CSS color.
pub(super) fn parse_color(body: &str, theme: &Theme) -> Option<String> {
    let (name, opacity) = match body.rsplit_once('/') {
        Some((name, tail)) if number(tail).is_some() && !tail.ends_with(']') => {
            (name, number(tail))
        }
        _ => (body, None),
    };

    let color = match bracket(name) {
        Some(value) => value,
        None => theme.lookup("colors", name)?.as_str()?.to_string(),
    };

    let Some(opacity) = opacity else {
        return Some(color);
    };
    let alpha = format_number((opacity / 100.0).clamp(0.0, 1.0));
    match hex_to_rgb(&color) {
        Some([r, g, b]) => Some(format!("rgb({} {} {} / {})", r, g, b, alpha)),
        None => Some(format!(
            "color-mix(in srgb, {} {}%, transparent)",
            color,
            format_number(opacity)
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::mini::THEME;

    #[test]
    fn theme_colors_and_opacity() {
        let theme = Theme::from_value(THEME.clone()).unwrap();
        assert_eq!(parse_color("red-500", &theme).as_deref(), Some("#ef4444"));
        assert_eq!(parse_color("red", &theme).as_deref(), Some("#ef4444"));
        assert_eq!(
            parse_color("red-500/50", &theme).as_deref(),
            Some("rgb(239 68 68 / 0.5)")
        );
        assert_eq!(parse_color("light-blue-500", &theme).as_deref(), Some("#0ea5e9"));
        assert_eq!(parse_color("nope-500", &theme), None);
    }

    #[test]
    fn arbitrary_colors() {
        let theme = Theme::new();
        assert_eq!(parse_color("[#0af]", &theme).as_deref(), Some("#0af"));
        assert_eq!(
            parse_color("[#0af]/25", &theme).as_deref(),
            Some("rgb(0 170 255 / 0.25)")
        );
        assert_eq!(
            parse_color("current/10", &Theme::from_value(THEME.clone()).unwrap()).as_deref(),
            Some("color-mix(in srgb, currentColor 10%, transparent)")
        );
    }
}
