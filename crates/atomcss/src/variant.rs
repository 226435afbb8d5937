//! Variant pipeline types.
//!
//! A [`Variant`] recognizes a modifier on the current token text (a
//! `hover:` prefix, a trailing `!`) and returns a [`VariantHandler`]
//! describing the remaining text and how to wrap the eventual utility:
//! a selector rewrite, a parent at-rule, a declaration rewrite, a layer.
//!
//! Peeling runs in passes. Each pass tries variants in declared order and
//! applies the first match. A variant applies at most once per token
//! unless it is [reentrant](Variant::reentrant), in which case it may match
//! again on later passes (up to [`MAX_REENTRANT_PASSES`] times).
//!
//! The important (`!`) and negative (`-`) markers are ordinary variants,
//! see [`important`] and [`negative`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use atomcss_syntax::entries::CssEntries;

use crate::error::HandlerError;
use crate::rule::SelectorFn;
use crate::theme::Theme;

/// Maximum number of times a reentrant variant applies to one token.
pub const MAX_REENTRANT_PASSES: usize = 4;

/// Maximum number of variants peeled from one token.
pub const MAX_VARIANT_PEELS: usize = 32;

/// Rewrites declarations in place.
pub type BodyFn = Arc<dyn Fn(&mut CssEntries) + Send + Sync>;

/// A parent at-rule (`@media …`, `@supports …`) wrapping a utility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParentWrapper {
    pub at_rule: String,
    /// Sort position of blocks under this parent, lower first.
    pub order: i32,
}

/// The result of a variant matching the current token text.
#[derive(Clone, Default)]
pub struct VariantHandler {
    /// Token text left after removing the modifier.
    pub remainder: String,
    pub selector: Option<SelectorFn>,
    pub parent: Option<ParentWrapper>,
    pub layer: Option<String>,
    pub sort: Option<i32>,
    /// Added to the utility's rank. Negative bumps count as zero, so a
    /// wrapped utility never sorts ahead of its plain form.
    pub order_bump: i64,
    pub body: Option<BodyFn>,
    pub no_merge: bool,
}

impl VariantHandler {
    pub fn new(remainder: impl Into<String>) -> Self {
        Self {
            remainder: remainder.into(),
            ..Default::default()
        }
    }

    pub fn with_selector(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.selector = Some(Arc::new(f));
        self
    }

    pub fn with_parent(mut self, at_rule: impl Into<String>, order: i32) -> Self {
        self.parent = Some(ParentWrapper {
            at_rule: at_rule.into(),
            order,
        });
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn with_sort(mut self, sort: i32) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_order_bump(mut self, bump: i64) -> Self {
        self.order_bump = bump;
        self
    }

    pub fn with_body(mut self, f: impl Fn(&mut CssEntries) + Send + Sync + 'static) -> Self {
        self.body = Some(Arc::new(f));
        self
    }

    pub fn no_merge(mut self) -> Self {
        self.no_merge = true;
        self
    }
}

impl fmt::Debug for VariantHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantHandler")
            .field("remainder", &self.remainder)
            .field("selector", &self.selector.as_ref().map(|_| "<fn>"))
            .field("parent", &self.parent)
            .field("layer", &self.layer)
            .field("sort", &self.sort)
            .field("order_bump", &self.order_bump)
            .field("body", &self.body.as_ref().map(|_| "<fn>"))
            .field("no_merge", &self.no_merge)
            .finish()
    }
}

/// What a variant matcher can see.
#[derive(Debug, Clone, Copy)]
pub struct VariantContext<'a> {
    /// The full token, before any peeling.
    pub raw: &'a str,
    pub theme: &'a Theme,
    /// Separators that may follow a variant name (`:` and `-` by default).
    pub separators: &'a [String],
}

impl VariantContext<'_> {
    /// Strips `name` followed by one of the separators from `input`.
    ///
    /// Returns the rest only when it is non-empty.
    pub fn strip<'i>(&self, input: &'i str, name: &str) -> Option<&'i str> {
        let rest = input.strip_prefix(name)?;
        self.separators
            .iter()
            .find_map(|sep| rest.strip_prefix(sep.as_str()))
            .filter(|rest| !rest.is_empty())
    }
}

/// Recognizes a modifier on the current token text.
#[async_trait]
pub trait VariantMatcher: Send + Sync {
    async fn match_variant(
        &self,
        input: &str,
        ctx: &VariantContext<'_>,
    ) -> Result<Option<VariantHandler>, HandlerError>;
}

struct FnVariant<F>(F);

#[async_trait]
impl<F> VariantMatcher for FnVariant<F>
where
    F: Fn(&str, &VariantContext<'_>) -> Option<VariantHandler> + Send + Sync,
{
    async fn match_variant(
        &self,
        input: &str,
        ctx: &VariantContext<'_>,
    ) -> Result<Option<VariantHandler>, HandlerError> {
        Ok((self.0)(input, ctx))
    }
}

/// A named modifier matcher.
#[derive(Clone)]
pub struct Variant {
    pub name: String,
    /// May match again after other variants changed the remainder.
    pub reentrant: bool,
    /// Variants are stable-sorted by this value when the generator is built.
    pub order: i32,
    matcher: Arc<dyn VariantMatcher>,
}

impl Variant {
    /// A variant backed by a synchronous closure.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&str, &VariantContext<'_>) -> Option<VariantHandler> + Send + Sync + 'static,
    {
        Self::with_matcher(name, FnVariant(f))
    }

    /// A variant backed by any matcher, including asynchronous ones.
    pub fn with_matcher(name: impl Into<String>, matcher: impl VariantMatcher + 'static) -> Self {
        Self {
            name: name.into(),
            reentrant: false,
            order: 0,
            matcher: Arc::new(matcher),
        }
    }

    pub fn reentrant(mut self) -> Self {
        self.reentrant = true;
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub(crate) fn matcher(&self) -> &Arc<dyn VariantMatcher> {
        &self.matcher
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variant")
            .field("name", &self.name)
            .field("reentrant", &self.reentrant)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

/// `name:` appends a pseudo-class or pseudo-element to the selector.
pub fn pseudo(name: &str, pseudo: &str) -> Variant {
    let prefix = name.to_string();
    let pseudo = pseudo.to_string();
    Variant::new(name, move |input, ctx| {
        let rest = ctx.strip(input, &prefix)?;
        let pseudo = pseudo.clone();
        Some(VariantHandler::new(rest).with_selector(move |s| format!("{}{}", s, pseudo)))
    })
}

/// `name:` wraps the utility in an at-rule.
pub fn at_rule(name: &str, at_rule: &str, order: i32) -> Variant {
    let prefix = name.to_string();
    let at_rule = at_rule.to_string();
    Variant::new(name, move |input, ctx| {
        let rest = ctx.strip(input, &prefix)?;
        Some(VariantHandler::new(rest).with_parent(at_rule.clone(), order))
    })
}

fn mark_important(entries: &mut CssEntries) {
    for (_, value) in entries.iter_mut() {
        if !value.ends_with("!important") {
            value.push_str(" !important");
        }
    }
}

/// The important marker: a leading or trailing `!` adds `!important` to
/// every declaration.
pub fn important() -> Variant {
    Variant::new("important", |input, _ctx| {
        let rest = input
            .strip_prefix('!')
            .or_else(|| input.strip_suffix('!'))
            .filter(|rest| !rest.is_empty())?;
        Some(VariantHandler::new(rest).with_body(mark_important))
    })
}

/// Negates a value if it is numeric. Returns false when it could not.
fn negate_value(value: &mut String) -> bool {
    let trimmed = value.trim();
    if trimmed == "0" || trimmed.is_empty() {
        return false;
    }
    if trimmed.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        *value = format!("-{}", trimmed);
        return true;
    }
    if let Some(positive) = trimmed.strip_prefix('-') {
        if positive.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            *value = positive.to_string();
            return true;
        }
    }
    if trimmed.starts_with("var(") || trimmed.starts_with("calc(") {
        *value = format!("calc({} * -1)", trimmed);
        return true;
    }
    false
}

/// The negative marker: a leading `-` negates numeric declaration values.
///
/// Custom properties are left untouched. When no declaration could be
/// negated the utility is dropped, so `-flex` does not silently produce
/// `display:flex`.
pub fn negative() -> Variant {
    Variant::new("negative", |input, _ctx| {
        let rest = input.strip_prefix('-')?;
        if rest.is_empty() || !rest.contains(|c: char| c.is_ascii_digit()) {
            return None;
        }
        Some(VariantHandler::new(rest).with_body(|entries| {
            let mut changed = false;
            for (prop, value) in entries.iter_mut() {
                if prop.starts_with("--") {
                    continue;
                }
                changed |= negate_value(value);
            }
            if !changed {
                entries.clear();
            }
        }))
    })
}
