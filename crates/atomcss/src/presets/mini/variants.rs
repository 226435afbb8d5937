use phf::phf_map;

use super::rules::breakpoints;
use crate::variant::{Variant, VariantContext, VariantHandler, at_rule, important, negative};

/// Pseudo-class and pseudo-element names understood as variants.
static PSEUDO_CLASSES: phf::Map<&'static str, &'static str> = phf_map! {
    "hover" => ":hover",
    "focus" => ":focus",
    "focus-within" => ":focus-within",
    "focus-visible" => ":focus-visible",
    "active" => ":active",
    "visited" => ":visited",
    "disabled" => ":disabled",
    "checked" => ":checked",
    "first" => ":first-child",
    "last" => ":last-child",
    "odd" => ":nth-child(odd)",
    "even" => ":nth-child(even)",
    "before" => "::before",
    "after" => "::after",
    "placeholder" => "::placeholder",
};

/// `hover:`, `focus-within:`, `group-hover:`. Reentrant, so
/// `hover:focus:` stacks both pseudo-classes.
fn pseudo_classes() -> Variant {
    Variant::new("pseudo", |input: &str, ctx: &VariantContext<'_>| {
        ctx.separators.iter().find_map(|sep| {
            let (head, rest) = input.split_once(sep.as_str())?;
            if rest.is_empty() {
                return None;
            }
            if let Some(pseudo) = PSEUDO_CLASSES.get(head) {
                let pseudo = *pseudo;
                return Some(
                    VariantHandler::new(rest).with_selector(move |s| format!("{}{}", s, pseudo)),
                );
            }
            let pseudo = *PSEUDO_CLASSES.get(head.strip_prefix("group-")?)?;
            Some(
                VariantHandler::new(rest)
                    .with_selector(move |s| format!(".group{} {}", pseudo, s)),
            )
        })
    })
    .reentrant()
}

/// `md:` applies from the breakpoint up, `lt-md:` below it.
fn breakpoint_media() -> Variant {
    Variant::new("breakpoints", |input: &str, ctx: &VariantContext<'_>| {
        for (index, (name, size)) in breakpoints(ctx.theme).into_iter().enumerate() {
            let order = index as i32 + 1;
            if let Some(rest) = ctx.strip(input, &name) {
                return Some(
                    VariantHandler::new(rest)
                        .with_parent(format!("@media (min-width: {})", size), 100 + order),
                );
            }
            if let Some(rest) = ctx.strip(input, &format!("lt-{}", name)) {
                return Some(VariantHandler::new(rest).with_parent(
                    format!("@media (max-width: calc({} - 0.1px))", size),
                    100 - order,
                ));
            }
        }
        None
    })
}

/// `@sm:` container queries, sized from the theme's `containers`.
fn container_query() -> Variant {
    Variant::new("container", |input: &str, ctx: &VariantContext<'_>| {
        let rest = input.strip_prefix('@')?;
        let (name, rest) = ctx
            .separators
            .iter()
            .find_map(|sep| rest.split_once(sep.as_str()))?;
        if rest.is_empty() {
            return None;
        }
        let size = ctx.theme.lookup("containers", name)?.as_str()?;
        Some(VariantHandler::new(rest).with_parent(format!("@container (min-width: {})", size), 200))
    })
}

/// Class-based dark mode.
fn dark() -> Variant {
    Variant::new("dark", |input: &str, ctx: &VariantContext<'_>| {
        let rest = ctx.strip(input, "dark")?;
        Some(VariantHandler::new(rest).with_selector(|s| format!(".dark {}", s)))
    })
}

pub(super) fn variants() -> Vec<Variant> {
    vec![
        important(),
        negative(),
        breakpoint_media(),
        container_query(),
        dark(),
        at_rule("print", "@media print", 300),
        pseudo_classes(),
    ]
}
