use crate::config::Preflight;

/// Box-model reset plus a body font color taken from the theme.
pub(super) fn reset() -> Preflight {
    Preflight::from_theme(|theme| {
        let mut css = String::from(
            "*,::before,::after{box-sizing:border-box;border-width:0;border-style:solid;}",
        );
        if let Some(color) = theme.lookup("colors", "gray-900").and_then(|v| v.as_str()) {
            css.push_str(&format!("body{{margin:0;color:{};}}", color));
        }
        Some(css)
    })
}
