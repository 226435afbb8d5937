use atomcss_syntax::entries::entries;
use atomcss_syntax::units::{dimension, format_number, number};
use atomcss_syntax::values::{ValueKinds, bracket};

use super::colors::parse_color;
use crate::rule::{CssBatch, Rule, RuleContext, RuleMatch};
use crate::theme::Theme;

const DISPLAYS: &[(&str, &str)] = &[
    ("block", "block"),
    ("inline", "inline"),
    ("inline-block", "inline-block"),
    ("flex", "flex"),
    ("inline-flex", "inline-flex"),
    ("grid", "grid"),
    ("contents", "contents"),
    ("hidden", "none"),
];

fn direction_suffixes(direction: Option<&str>) -> &'static [&'static str] {
    match direction {
        None => &[""],
        Some("x") => &["-left", "-right"],
        Some("y") => &["-top", "-bottom"],
        Some("t") => &["-top"],
        Some("r") => &["-right"],
        Some("b") => &["-bottom"],
        Some("l") => &["-left"],
        Some(_) => &[],
    }
}

fn spacing_value(value: &str, theme: &Theme) -> Option<String> {
    theme
        .lookup("spacing", value)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .or_else(|| ValueKinds::SPACING.resolve(value))
}

/// `m-2`, `px-4`, `mt-[3px]`, `m-auto`.
fn spacing(m: &RuleMatch, ctx: &RuleContext<'_>) -> Vec<CssBatch> {
    let property = match m.get(1) {
        Some("m") => "margin",
        Some("p") => "padding",
        _ => return Vec::new(),
    };
    let Some(value) = m.get(3).and_then(|v| spacing_value(v, ctx.theme)) else {
        return Vec::new();
    };
    let declarations: Vec<(String, String)> = direction_suffixes(m.get(2))
        .iter()
        .map(|suffix| (format!("{}{}", property, suffix), value.clone()))
        .collect();
    if declarations.is_empty() {
        return Vec::new();
    }
    vec![CssBatch::entries(declarations)]
}

/// `w-4`, `h-1/2`, `w-screen`.
fn size(m: &RuleMatch, ctx: &RuleContext<'_>) -> Vec<CssBatch> {
    let (property, screen) = match m.get(1) {
        Some("w") => ("width", "100vw"),
        Some("h") => ("height", "100vh"),
        _ => return Vec::new(),
    };
    let raw = m.get(2).unwrap_or_default();
    let value = match raw {
        "screen" => Some(screen.to_string()),
        "min" | "max" | "fit" => Some(format!("{}-content", raw)),
        _ => spacing_value(raw, ctx.theme),
    };
    match value {
        Some(value) => vec![CssBatch::from_pairs(&[(property, value.as_str())])],
        None => Vec::new(),
    }
}

/// `text-red-500`, `bg-blue/50`, `border-[#0af]`.
fn color(m: &RuleMatch, ctx: &RuleContext<'_>) -> Vec<CssBatch> {
    let property = match m.get(1) {
        Some("text") => "color",
        Some("bg") => "background-color",
        Some("border") => "border-color",
        _ => return Vec::new(),
    };
    match m.get(2).and_then(|body| parse_color(body, ctx.theme)) {
        Some(value) => vec![CssBatch::from_pairs(&[(property, value.as_str())])],
        None => Vec::new(),
    }
}

/// `border`, `border-2`, `border-[3px]`.
fn border_width(m: &RuleMatch, _ctx: &RuleContext<'_>) -> Vec<CssBatch> {
    let value = match m.get(1) {
        None => Some("1px".to_string()),
        Some(v) => (ValueKinds::BRACKET | ValueKinds::PX).resolve(v),
    };
    match value {
        Some(value) => vec![CssBatch::from_pairs(&[
            ("border-width", value.as_str()),
            ("border-style", "solid"),
        ])],
        None => Vec::new(),
    }
}

/// `op-50`, `opacity-[.3]`.
fn opacity(m: &RuleMatch, _ctx: &RuleContext<'_>) -> Vec<CssBatch> {
    let raw = m.get(1).unwrap_or_default();
    let value = bracket(raw).or_else(|| number(raw).map(|n| format_number(n / 100.0)));
    match value {
        Some(value) => vec![CssBatch::from_pairs(&[("opacity", value.as_str())])],
        None => Vec::new(),
    }
}

/// `[prop:value]` and `[--custom:value]`.
fn arbitrary_property(m: &RuleMatch, _ctx: &RuleContext<'_>) -> Vec<CssBatch> {
    let (Some(property), Some(value)) = (m.get(1), m.get(2)) else {
        return Vec::new();
    };
    match bracket(&format!("[{}]", value)) {
        Some(value) => vec![CssBatch::from_pairs(&[(property, value.as_str())])],
        None => Vec::new(),
    }
}

/// Full width plus one max-width step per breakpoint.
fn container(_m: &RuleMatch, ctx: &RuleContext<'_>) -> Vec<CssBatch> {
    let mut batches = vec![CssBatch::from_pairs(&[("width", "100%")])];
    for (index, (_, size)) in breakpoints(ctx.theme).into_iter().enumerate() {
        batches.push(
            CssBatch::from_pairs(&[("max-width", size.as_str())])
                .with_parent_order(format!("@media (min-width: {})", size), 101 + index as i32),
        );
    }
    batches
}

/// Breakpoints from the theme, smallest first.
pub(super) fn breakpoints(theme: &Theme) -> Vec<(String, String)> {
    let Some(map) = theme.get("breakpoints").and_then(|v| v.as_object()) else {
        return Vec::new();
    };
    let mut points: Vec<(f64, String, String)> = map
        .iter()
        .filter_map(|(name, value)| {
            let value = value.as_str()?;
            let size = dimension(value).map(|d| d.value).unwrap_or(f64::MAX);
            Some((size, name.clone(), value.to_string()))
        })
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    points.into_iter().map(|(_, name, value)| (name, value)).collect()
}

pub(super) fn rules() -> Vec<Rule> {
    let mut rules: Vec<Rule> = DISPLAYS
        .iter()
        .map(|&(name, value)| Rule::literal(name, entries(&[("display", value)])).named("display"))
        .collect();

    rules.extend([
        Rule::dynamic("^container$", container).named("container"),
        Rule::dynamic(r"^([mp])([xytrbl])?-(.+)$", spacing).named("spacing"),
        Rule::dynamic(r"^([wh])-(.+)$", size).named("size"),
        Rule::dynamic(r"^(text|bg|border)-(.+)$", color).named("color"),
        Rule::dynamic(r"^border(?:-(.+))?$", border_width).named("border-width"),
        Rule::dynamic(r"^op(?:acity)?-(.+)$", opacity).named("opacity"),
        Rule::dynamic(r"^z-(-?\d+|auto)$", |m, _| {
            vec![CssBatch::from_pairs(&[("z-index", m.get(1).unwrap_or("auto"))])]
        })
        .named("z-index"),
        Rule::dynamic(r"^\[(--[\w-]+|[a-z][a-z-]*):(.+)\]$", arbitrary_property)
            .named("arbitrary-property"),
    ]);
    rules
}
