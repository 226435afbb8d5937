//! Shortcut expansion.
//!
//! A [`Shortcut`] is an alias: a token body that expands into one or more
//! other tokens (`btn` → `px-4 py-1 rounded`). Expansions may use variant
//! group syntax (`hover:(bg-blue text-white)`) and may name further
//! shortcuts. The first matching shortcut in declared order wins.
//!
//! Recursive expansion is guarded by an [`ExpansionPath`]: a token that
//! reappears on its own expansion path abandons that branch, and paths
//! deeper than [`MAX_SHORTCUT_DEPTH`] are cut off.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use atomcss_syntax::variant_group::expand_variant_group;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{HandlerError, Result};
use crate::rule::{CompiledMatcher, Matcher, RuleMatch};
use crate::theme::Theme;

/// Maximum length of a shortcut expansion path.
pub const MAX_SHORTCUT_DEPTH: usize = 5;

/// What a shortcut handler can see.
#[derive(Debug, Clone, Copy)]
pub struct ShortcutContext<'a> {
    /// The token being resolved, before variant peeling.
    pub raw: &'a str,
    pub theme: &'a Theme,
}

/// Produces the expansion of a dynamic shortcut.
///
/// Each returned string may hold several whitespace-separated tokens and
/// variant groups.
#[async_trait]
pub trait ShortcutHandler: Send + Sync {
    async fn expand(
        &self,
        matched: &RuleMatch,
        ctx: &ShortcutContext<'_>,
    ) -> std::result::Result<Vec<String>, HandlerError>;
}

struct StaticShortcut(Vec<String>);

#[async_trait]
impl ShortcutHandler for StaticShortcut {
    async fn expand(
        &self,
        _matched: &RuleMatch,
        _ctx: &ShortcutContext<'_>,
    ) -> std::result::Result<Vec<String>, HandlerError> {
        Ok(self.0.clone())
    }
}

struct FnShortcut<F>(F);

#[async_trait]
impl<F> ShortcutHandler for FnShortcut<F>
where
    F: Fn(&RuleMatch, &ShortcutContext<'_>) -> Vec<String> + Send + Sync,
{
    async fn expand(
        &self,
        matched: &RuleMatch,
        ctx: &ShortcutContext<'_>,
    ) -> std::result::Result<Vec<String>, HandlerError> {
        Ok((self.0)(matched, ctx))
    }
}

/// Metadata attached to a shortcut.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShortcutMeta {
    /// Layer for the expanded utilities, unless a member rule sets its own.
    pub layer: Option<String>,
    pub no_merge: bool,
    /// Filled in with the contributing preset when the generator is built.
    pub preset: Option<String>,
}

/// An alias expanding into other tokens.
#[derive(Clone)]
pub struct Shortcut {
    pub matcher: Matcher,
    pub meta: ShortcutMeta,
    handler: Arc<dyn ShortcutHandler>,
}

impl Shortcut {
    /// A literal shortcut: `name` expands to the tokens in `expansion`.
    pub fn literal(name: impl Into<String>, expansion: &str) -> Self {
        Self::with_handler(
            Matcher::literal(name),
            StaticShortcut(expand_variant_group(expansion)),
        )
    }

    /// A literal shortcut given as a list of expansion strings.
    pub fn list(name: impl Into<String>, expansion: &[&str]) -> Self {
        let tokens = expansion
            .iter()
            .flat_map(|part| expand_variant_group(part))
            .collect();
        Self::with_handler(Matcher::literal(name), StaticShortcut(tokens))
    }

    /// A pattern shortcut with a synchronous expansion function. Returning
    /// an empty list means the shortcut does not apply.
    pub fn dynamic<F>(pattern: impl Into<String>, f: F) -> Self
    where
        F: Fn(&RuleMatch, &ShortcutContext<'_>) -> Vec<String> + Send + Sync + 'static,
    {
        Self::with_handler(Matcher::pattern(pattern), FnShortcut(f))
    }

    /// A shortcut with any handler, including asynchronous ones.
    pub fn with_handler(matcher: Matcher, handler: impl ShortcutHandler + 'static) -> Self {
        Self {
            matcher,
            meta: ShortcutMeta::default(),
            handler: Arc::new(handler),
        }
    }

    pub fn layer(mut self, layer: impl Into<String>) -> Self {
        self.meta.layer = Some(layer.into());
        self
    }

    pub fn no_merge(mut self) -> Self {
        self.meta.no_merge = true;
        self
    }
}

impl fmt::Debug for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shortcut")
            .field("matcher", &self.matcher)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// A shortcut after its matcher has been compiled.
#[derive(Clone)]
pub(crate) struct CompiledShortcut {
    pub(crate) matcher: CompiledMatcher,
    pub(crate) shortcut: Shortcut,
}

impl CompiledShortcut {
    pub(crate) fn compile(shortcut: Shortcut) -> Result<Self> {
        Ok(Self {
            matcher: shortcut.matcher.compile()?,
            shortcut,
        })
    }
}

/// One level of expansion: the first shortcut matching `body`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Expansion {
    pub(crate) name: String,
    pub(crate) members: Vec<String>,
    pub(crate) meta: ShortcutMeta,
}

/// Expands `body` by one level, or returns `None` if no shortcut matches.
///
/// A failing handler is reported and skipped; the next shortcut is tried.
pub(crate) async fn expand_once(
    shortcuts: &[CompiledShortcut],
    body: &str,
    ctx: &ShortcutContext<'_>,
    diagnostics: &Diagnostics,
) -> Option<Expansion> {
    for compiled in shortcuts {
        let Some(matched) = compiled.matcher.captures(body) else {
            continue;
        };
        match compiled.shortcut.handler.expand(&matched, ctx).await {
            Ok(parts) => {
                let members: Vec<String> = parts
                    .iter()
                    .flat_map(|part| expand_variant_group(part))
                    .collect();
                if members.is_empty() {
                    continue;
                }
                return Some(Expansion {
                    name: compiled.shortcut.matcher.source().to_string(),
                    members,
                    meta: compiled.shortcut.meta.clone(),
                });
            }
            Err(err) => {
                diagnostics.report(
                    DiagnosticKind::HandlerFailed,
                    format!(
                        "shortcut `{}` failed for `{}`: {}",
                        compiled.shortcut.matcher.source(),
                        ctx.raw,
                        err
                    ),
                );
            }
        }
    }
    None
}

/// Why an expansion branch was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionAbort {
    /// The token already appears on the path; the message shows the loop.
    Cycle(String),
    /// The path reached [`MAX_SHORTCUT_DEPTH`].
    TooDeep(String),
}

/// The chain of shortcut bodies currently being expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionPath {
    chain: Vec<String>,
}

impl ExpansionPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    pub fn contains(&self, body: &str) -> bool {
        self.chain.iter().any(|visited| visited == body)
    }

    /// Returns the path extended by `body`, or why it cannot be.
    pub fn enter(&self, body: &str) -> std::result::Result<ExpansionPath, ExpansionAbort> {
        if self.contains(body) {
            let mut chain = self.chain.clone();
            chain.push(body.to_string());
            return Err(ExpansionAbort::Cycle(chain.join(" -> ")));
        }
        if self.depth() >= MAX_SHORTCUT_DEPTH {
            let mut chain = self.chain.clone();
            chain.push(body.to_string());
            return Err(ExpansionAbort::TooDeep(chain.join(" -> ")));
        }
        let mut chain = self.chain.clone();
        chain.push(body.to_string());
        Ok(ExpansionPath { chain })
    }
}

impl ExpansionAbort {
    /// Reports the abort to the diagnostics sink.
    pub(crate) fn report(&self, diagnostics: &Diagnostics) {
        match self {
            ExpansionAbort::Cycle(chain) => diagnostics.report(
                DiagnosticKind::ShortcutCycle,
                format!("shortcut cycle skipped: {}", chain),
            ),
            ExpansionAbort::TooDeep(chain) => diagnostics.report(
                DiagnosticKind::ShortcutTooDeep,
                format!(
                    "shortcut expansion deeper than {} skipped: {}",
                    MAX_SHORTCUT_DEPTH, chain
                ),
            ),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_detects_cycles() {
        let path = ExpansionPath::new().enter("a").unwrap().enter("b").unwrap();
        assert_eq!(
            path.enter("a"),
            Err(ExpansionAbort::Cycle("a -> b -> a".into()))
        );
        assert_eq!(path.depth(), 2);
    }

    #[test]
    fn path_depth_is_capped() {
        let mut path = ExpansionPath::new();
        for name in ["a", "b", "c", "d", "e"] {
            path = path.enter(name).unwrap();
        }
        assert!(matches!(path.enter("f"), Err(ExpansionAbort::TooDeep(_))));
    }

    #[tokio::test]
    async fn first_matching_shortcut_wins() {
        let shortcuts = vec![
            CompiledShortcut::compile(Shortcut::literal("btn", "px-4 hover:(a b)")).unwrap(),
            CompiledShortcut::compile(Shortcut::literal("btn", "ignored")).unwrap(),
        ];
        let theme = Theme::new();
        let ctx = ShortcutContext {
            raw: "btn",
            theme: &theme,
        };
        let diagnostics = Diagnostics::default();
        let expansion = expand_once(&shortcuts, "btn", &ctx, &diagnostics)
            .await
            .unwrap();
        assert_eq!(expansion.members, vec!["px-4", "hover:a", "hover:b"]);
        assert!(expand_once(&shortcuts, "card", &ctx, &diagnostics).await.is_none());
    }

    #[tokio::test]
    async fn dynamic_shortcuts_use_captures() {
        let shortcuts = vec![
            CompiledShortcut::compile(Shortcut::dynamic(r"^btn-(\w+)$", |m, _| {
                vec![format!("bg-{} text-white", m.get(1).unwrap_or(""))]
            }))
            .unwrap(),
        ];
        let theme = Theme::new();
        let ctx = ShortcutContext {
            raw: "btn-red",
            theme: &theme,
        };
        let expansion = expand_once(&shortcuts, "btn-red", &ctx, &Diagnostics::default())
            .await
            .unwrap();
        assert_eq!(expansion.members, vec!["bg-red", "text-white"]);
        assert_eq!(expansion.name, r"^btn-(\w+)$");
    }
}
