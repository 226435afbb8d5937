//! Rule table types.
//!
//! A [`Rule`] pairs a [`Matcher`] with a handler producing CSS. Rules are
//! tried in declared order and, unlike variants and shortcuts, **every**
//! matching rule contributes declarations to the token. A rule flagged
//! [`RuleFlags::EXCLUSIVE`] stops the search once it has produced output.
//!
//! ```
//! use atomcss::rule::{CssBatch, Rule};
//! use atomcss_syntax::entries::entries;
//!
//! let flex = Rule::literal("flex", entries(&[("display", "flex")]));
//! let margin = Rule::dynamic(r"^m-(\d+)$", |m, _ctx| {
//!     let value = format!("{}px", m.get(1).unwrap_or("0"));
//!     vec![CssBatch::from_pairs(&[("margin", value.as_str())])]
//! });
//! assert_eq!(margin.display_name(), r"^m-(\d+)$");
//! assert_eq!(flex.display_name(), "flex");
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use atomcss_syntax::entries::CssEntries;
use bitflags::bitflags;
use regex::Regex;

use crate::error::{AtomError, HandlerError, Result};
use crate::theme::Theme;
use crate::variant::ParentWrapper;

bitflags! {
    /// Behavior switches of a rule.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RuleFlags: u8 {
        /// Output is never merged with other utilities sharing its selector.
        const NO_MERGE        = 0b0000_0001;
        /// The rule only matches tokens carrying the configured prefix.
        const PREFIX_REQUIRED = 0b0000_0010;
        /// Once this rule produces output, later rules are not tried.
        const EXCLUSIVE       = 0b0000_0100;
        /// The rule only matches inside shortcut expansions.
        const INTERNAL        = 0b0000_1000;
    }
}

/// How a rule or shortcut recognizes a token body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Exact string equality.
    Literal(String),
    /// A regular expression, compiled when the generator is built.
    Pattern(String),
}

impl Matcher {
    pub fn literal(text: impl Into<String>) -> Self {
        Matcher::Literal(text.into())
    }

    pub fn pattern(source: impl Into<String>) -> Self {
        Matcher::Pattern(source.into())
    }

    /// The literal text or pattern source.
    pub fn source(&self) -> &str {
        match self {
            Matcher::Literal(text) | Matcher::Pattern(text) => text,
        }
    }

    pub(crate) fn compile(&self) -> Result<CompiledMatcher> {
        match self {
            Matcher::Literal(text) => Ok(CompiledMatcher::Literal(text.clone())),
            Matcher::Pattern(source) => Regex::new(source)
                .map(CompiledMatcher::Pattern)
                .map_err(|source_err| AtomError::InvalidPattern {
                    pattern: source.clone(),
                    source: source_err,
                }),
        }
    }
}

/// A matcher ready for use.
#[derive(Debug, Clone)]
pub(crate) enum CompiledMatcher {
    Literal(String),
    Pattern(Regex),
}

impl CompiledMatcher {
    /// Matches `input`, returning owned capture groups.
    pub(crate) fn captures(&self, input: &str) -> Option<RuleMatch> {
        match self {
            CompiledMatcher::Literal(text) => (text == input).then(|| RuleMatch {
                groups: vec![Some(input.to_string())],
            }),
            CompiledMatcher::Pattern(regex) => {
                let caps = regex.captures(input)?;
                Some(RuleMatch {
                    groups: caps
                        .iter()
                        .map(|group| group.map(|g| g.as_str().to_string()))
                        .collect(),
                })
            }
        }
    }
}

/// Capture groups of a successful match. Group 0 is the whole match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    groups: Vec<Option<String>>,
}

impl RuleMatch {
    /// Builds a match from explicit groups, mostly useful in tests.
    pub fn from_groups(groups: Vec<Option<String>>) -> Self {
        Self { groups }
    }

    /// Returns a capture group, if it participated in the match.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }

    /// The whole matched text.
    pub fn full(&self) -> &str {
        self.get(0).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Rewrites a selector.
pub type SelectorFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Body of one produced block.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchBody {
    /// Declarations, serialized under the token's selector.
    Entries(CssEntries),
    /// Raw CSS emitted as-is, without a selector.
    Raw(String),
}

/// One block of CSS produced by a rule.
///
/// A rule may return several batches for a single token; each becomes its
/// own utility sharing the token's selector and rank, and may declare its
/// own layer.
#[derive(Clone)]
pub struct CssBatch {
    pub body: BatchBody,
    pub selector: Option<SelectorFn>,
    pub parent: Option<ParentWrapper>,
    pub layer: Option<String>,
    pub sort: Option<i32>,
    pub no_merge: bool,
}

impl CssBatch {
    pub fn entries(entries: CssEntries) -> Self {
        Self {
            body: BatchBody::Entries(entries),
            selector: None,
            parent: None,
            layer: None,
            sort: None,
            no_merge: false,
        }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::entries(atomcss_syntax::entries::entries(pairs))
    }

    pub fn raw(css: impl Into<String>) -> Self {
        Self {
            body: BatchBody::Raw(css.into()),
            ..Self::entries(Vec::new())
        }
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn with_sort(mut self, sort: i32) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Wraps the block in an at-rule with order 0.
    pub fn with_parent(self, at_rule: impl Into<String>) -> Self {
        self.with_parent_order(at_rule, 0)
    }

    pub fn with_parent_order(mut self, at_rule: impl Into<String>, order: i32) -> Self {
        self.parent = Some(ParentWrapper {
            at_rule: at_rule.into(),
            order,
        });
        self
    }

    pub fn with_selector(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.selector = Some(Arc::new(f));
        self
    }

    pub fn no_merge(mut self) -> Self {
        self.no_merge = true;
        self
    }
}

impl From<CssEntries> for CssBatch {
    fn from(entries: CssEntries) -> Self {
        CssBatch::entries(entries)
    }
}

impl fmt::Debug for CssBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CssBatch")
            .field("body", &self.body)
            .field("selector", &self.selector.as_ref().map(|_| "<fn>"))
            .field("parent", &self.parent)
            .field("layer", &self.layer)
            .field("sort", &self.sort)
            .field("no_merge", &self.no_merge)
            .finish()
    }
}

/// What a rule handler can see while producing CSS.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// The full token, before variant peeling.
    pub raw: &'a str,
    /// The text the matcher ran against (variants and prefix removed).
    pub body: &'a str,
    pub theme: &'a Theme,
    /// True while resolving a shortcut member.
    pub in_shortcut: bool,
}

/// Produces CSS for a matched token.
///
/// Implement this for handlers that need to suspend (fetch a value, wait
/// on another service). Plain closures go through [`Rule::dynamic`].
#[async_trait]
pub trait RuleHandler: Send + Sync {
    async fn produce(
        &self,
        matched: &RuleMatch,
        ctx: &RuleContext<'_>,
    ) -> std::result::Result<Vec<CssBatch>, HandlerError>;
}

struct StaticRule(Vec<CssBatch>);

#[async_trait]
impl RuleHandler for StaticRule {
    async fn produce(
        &self,
        _matched: &RuleMatch,
        _ctx: &RuleContext<'_>,
    ) -> std::result::Result<Vec<CssBatch>, HandlerError> {
        Ok(self.0.clone())
    }
}

struct FnRule<F>(F);

#[async_trait]
impl<F> RuleHandler for FnRule<F>
where
    F: Fn(&RuleMatch, &RuleContext<'_>) -> Vec<CssBatch> + Send + Sync,
{
    async fn produce(
        &self,
        matched: &RuleMatch,
        ctx: &RuleContext<'_>,
    ) -> std::result::Result<Vec<CssBatch>, HandlerError> {
        Ok((self.0)(matched, ctx))
    }
}

/// Metadata attached to a rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleMeta {
    pub layer: Option<String>,
    pub sort: Option<i32>,
    pub flags: RuleFlags,
    /// Display name used in extended match info.
    pub name: Option<String>,
    /// Name of the preset that contributed the rule, filled in when the
    /// generator is built.
    pub preset: Option<String>,
}

/// A matcher plus a CSS producer.
#[derive(Clone)]
pub struct Rule {
    pub matcher: Matcher,
    pub meta: RuleMeta,
    handler: Arc<dyn RuleHandler>,
}

impl Rule {
    /// A rule matching one exact token body with fixed declarations.
    pub fn literal(name: impl Into<String>, entries: CssEntries) -> Self {
        Self::with_handler(
            Matcher::literal(name),
            StaticRule(vec![CssBatch::entries(entries)]),
        )
    }

    /// A rule matching one exact token body with fixed batches.
    pub fn literal_batches(name: impl Into<String>, batches: Vec<CssBatch>) -> Self {
        Self::with_handler(Matcher::literal(name), StaticRule(batches))
    }

    /// A pattern rule with a synchronous producer. Returning an empty list
    /// means the rule does not apply.
    pub fn dynamic<F>(pattern: impl Into<String>, f: F) -> Self
    where
        F: Fn(&RuleMatch, &RuleContext<'_>) -> Vec<CssBatch> + Send + Sync + 'static,
    {
        Self::with_handler(Matcher::pattern(pattern), FnRule(f))
    }

    /// A rule with any handler, including asynchronous ones.
    pub fn with_handler(matcher: Matcher, handler: impl RuleHandler + 'static) -> Self {
        Self {
            matcher,
            meta: RuleMeta::default(),
            handler: Arc::new(handler),
        }
    }

    pub fn layer(mut self, layer: impl Into<String>) -> Self {
        self.meta.layer = Some(layer.into());
        self
    }

    pub fn sort(mut self, sort: i32) -> Self {
        self.meta.sort = Some(sort);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.meta.name = Some(name.into());
        self
    }

    pub fn flags(mut self, flags: RuleFlags) -> Self {
        self.meta.flags |= flags;
        self
    }

    pub fn no_merge(self) -> Self {
        self.flags(RuleFlags::NO_MERGE)
    }

    pub fn exclusive(self) -> Self {
        self.flags(RuleFlags::EXCLUSIVE)
    }

    pub fn internal(self) -> Self {
        self.flags(RuleFlags::INTERNAL)
    }

    pub fn prefix_required(self) -> Self {
        self.flags(RuleFlags::PREFIX_REQUIRED)
    }

    /// The rule's name, falling back to its matcher source.
    pub fn display_name(&self) -> String {
        self.meta
            .name
            .clone()
            .unwrap_or_else(|| self.matcher.source().to_string())
    }

    pub(crate) fn handler(&self) -> &Arc<dyn RuleHandler> {
        &self.handler
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("matcher", &self.matcher)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// A rule after its matcher has been compiled.
#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub(crate) index: usize,
    pub(crate) matcher: CompiledMatcher,
    pub(crate) rule: Rule,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_matcher_requires_equality() {
        let m = Matcher::literal("flex").compile().unwrap();
        assert_eq!(m.captures("flex").unwrap().full(), "flex");
        assert!(m.captures("flex-1").is_none());
    }

    #[test]
    fn pattern_matcher_owns_groups() {
        let m = Matcher::pattern(r"^m(x)?-(\d+)$").compile().unwrap();
        let caps = m.captures("m-4").unwrap();
        assert_eq!(caps.get(0), Some("m-4"));
        assert_eq!(caps.get(1), None);
        assert_eq!(caps.get(2), Some("4"));
        assert_eq!(caps.len(), 3);
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let err = Matcher::pattern("^(unclosed").compile().unwrap_err();
        assert!(matches!(err, AtomError::InvalidPattern { pattern, .. } if pattern == "^(unclosed"));
    }

    #[test]
    fn builder_flags_accumulate() {
        let rule = Rule::literal("x", Vec::new()).no_merge().internal();
        assert!(rule.meta.flags.contains(RuleFlags::NO_MERGE | RuleFlags::INTERNAL));
        assert!(!rule.meta.flags.contains(RuleFlags::EXCLUSIVE));
    }
}
