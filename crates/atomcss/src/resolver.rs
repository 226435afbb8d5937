//! Token resolution.
//!
//! The resolver turns one raw token into zero or more [`ResolvedUtil`]s:
//!
//! ```text
//! raw ─▶ preprocess ─▶ blocklist ─▶ variants ─▶ shortcut? ─▶ rules ─▶ postprocess ─▶ util
//!                                       ▲            │
//!                                       └── members ─┘
//! ```
//!
//! Shortcut members go back through variant peeling and rule matching; the
//! invocation's own variants are appended outside the members' variants so
//! `hover:btn` wraps every member of `btn` in `hover`. The selector of
//! every util is always derived from the raw token the user wrote.
//!
//! Results are memoized per token by the generator's cache.

use std::sync::Arc;

use atomcss_syntax::entries::entries_to_css;
use atomcss_syntax::escape::to_class_selector;
use futures::FutureExt;
use futures::future::BoxFuture;
use smallvec::SmallVec;

use crate::config::{DEFAULT_LAYER, ResolvedConfig, UtilObject};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::rule::{BatchBody, CssBatch, RuleContext, RuleFlags};
use crate::shortcut::{ExpansionPath, ShortcutContext, expand_once};
use crate::variant::{
    MAX_REENTRANT_PASSES, MAX_VARIANT_PEELS, ParentWrapper, VariantContext, VariantHandler,
};

/// Rank distance added per applied variant, so variant-wrapped utilities
/// sort after plain ones.
pub const VARIANT_RANK_STEP: i64 = 1_000_000;

/// Variant handlers of one token, innermost first.
pub type HandlerChain = SmallVec<[VariantHandler; 4]>;

/// A serialized utility ready for assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUtil {
    pub token: String,
    pub rank: i64,
    /// `None` for raw CSS blocks.
    pub selector: Option<String>,
    /// Parent at-rules, outermost first.
    pub parents: Vec<String>,
    /// Order of the outermost parent.
    pub parent_order: i32,
    pub body: String,
    pub layer: String,
    pub sort: i32,
    pub no_merge: bool,
}

/// What contributed to a matched token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenInfo {
    /// Display names of the rules that produced output.
    pub rules: Vec<String>,
    pub presets: Vec<String>,
    /// Applied variant names, in peeling order.
    pub variants: Vec<String>,
    /// The outermost shortcut the token expanded through.
    pub shortcut: Option<String>,
}

/// The memoized result of resolving one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome {
    Matched { utils: Vec<ResolvedUtil>, info: TokenInfo },
    Unmatched,
    /// Rejected by the blocklist, with the reason.
    Blocked(String),
    /// Dropped by a preprocess hook, or empty.
    Excluded,
}

impl TokenOutcome {
    pub fn utils(&self) -> &[ResolvedUtil] {
        match self {
            TokenOutcome::Matched { utils, .. } => utils,
            _ => &[],
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, TokenOutcome::Matched { .. })
    }
}

/// The result of variant peeling.
#[derive(Debug, Clone)]
pub struct VariantMatch {
    pub raw: String,
    /// Token text left after peeling.
    pub base: String,
    pub handlers: HandlerChain,
    /// Applied variant names, in peeling order.
    pub names: Vec<String>,
}

/// A rule batch with everything needed to serialize it.
struct ParsedUtil {
    rule_index: usize,
    batch: CssBatch,
    rule_layer: Option<String>,
    rule_sort: Option<i32>,
    no_merge: bool,
    handlers: HandlerChain,
    shortcut_layer: Option<String>,
    in_shortcut: bool,
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

/// Splits `token` into the text written before and after its peeled
/// `base`. Prefix variants leave `base` at the end, suffix variants at the
/// start; anything else uses the last occurrence.
fn variant_affixes<'t>(token: &'t str, base: &str) -> (&'t str, &'t str) {
    if let Some(leading) = token.strip_suffix(base) {
        return (leading, "");
    }
    if let Some(trailing) = token.strip_prefix(base) {
        return ("", trailing);
    }
    match token.rfind(base) {
        Some(pos) => (&token[..pos], &token[pos + base.len()..]),
        None => {
            log::debug!("`{}` no longer contains its base `{}`", token, base);
            ("", "")
        }
    }
}

/// Resolves tokens against a configuration.
#[derive(Clone)]
pub(crate) struct Resolver {
    config: Arc<ResolvedConfig>,
    diagnostics: Arc<Diagnostics>,
}

impl Resolver {
    pub(crate) fn new(config: Arc<ResolvedConfig>, diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            config,
            diagnostics,
        }
    }

    pub(crate) fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub(crate) fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn blocked(&self, token: &str) -> Option<String> {
        self.config
            .blocklist
            .iter()
            .find_map(|block| block.reason(token))
    }

    /// Resolves one token without consulting the cache.
    pub(crate) async fn resolve(&self, raw: &str) -> TokenOutcome {
        let mut token = raw.to_string();
        for hook in &self.config.preprocess {
            match hook(&token) {
                Some(next) => token = next,
                None => {
                    log::debug!("`{}` excluded by preprocess", raw);
                    return TokenOutcome::Excluded;
                }
            }
        }
        if token.trim().is_empty() {
            return TokenOutcome::Excluded;
        }
        if let Some(reason) = self.blocked(&token) {
            self.diagnostics.report(
                DiagnosticKind::Blocked,
                format!("`{}` blocked: {}", raw, reason),
            );
            return TokenOutcome::Blocked(reason);
        }

        let mut info = TokenInfo::default();
        let parsed = match self
            .parse(&token, false, &ExpansionPath::new(), &mut info)
            .await
        {
            Ok(parsed) => parsed,
            Err(reason) => {
                self.diagnostics.report(
                    DiagnosticKind::Blocked,
                    format!("`{}` blocked: {}", raw, reason),
                );
                return TokenOutcome::Blocked(reason);
            }
        };

        let mut utils = Vec::with_capacity(parsed.len());
        for util in parsed {
            if let Some(resolved) = self.stringify(raw, util).await {
                utils.push(resolved);
            }
        }

        if utils.is_empty() {
            if info.shortcut.is_none() {
                self.diagnostics.report(
                    DiagnosticKind::Unmatched,
                    format!("unmatched token `{}`", raw),
                );
            }
            return TokenOutcome::Unmatched;
        }

        log::debug!("resolved `{}` into {} utilities", raw, utils.len());
        TokenOutcome::Matched { utils, info }
    }

    /// Peels variants off `token`.
    pub(crate) async fn match_variants(&self, token: &str) -> VariantMatch {
        let config = &*self.config;
        let ctx = VariantContext {
            raw: token,
            theme: &config.theme,
            separators: &config.separators,
        };
        let mut current = token.to_string();
        let mut handlers = HandlerChain::new();
        let mut names = Vec::new();
        let mut applied = vec![0usize; config.variants.len()];

        'peel: loop {
            if handlers.len() >= MAX_VARIANT_PEELS {
                self.diagnostics.report(
                    DiagnosticKind::VariantOverflow,
                    format!(
                        "`{}` stopped after {} variants, remaining `{}`",
                        token, MAX_VARIANT_PEELS, current
                    ),
                );
                break;
            }
            for (index, variant) in config.variants.iter().enumerate() {
                let limit = if variant.reentrant {
                    MAX_REENTRANT_PASSES
                } else {
                    1
                };
                if applied[index] >= limit {
                    continue;
                }
                match variant.matcher().match_variant(&current, &ctx).await {
                    Ok(Some(handler))
                        if !handler.remainder.is_empty() && handler.remainder != current =>
                    {
                        applied[index] += 1;
                        current = handler.remainder.clone();
                        names.push(variant.name.clone());
                        handlers.insert(0, handler);
                        continue 'peel;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        self.diagnostics.report(
                            DiagnosticKind::HandlerFailed,
                            format!("variant `{}` failed for `{}`: {}", variant.name, token, err),
                        );
                    }
                }
            }
            break;
        }

        VariantMatch {
            raw: token.to_string(),
            base: current,
            handlers,
            names,
        }
    }

    /// Textual one-level expansion of a shortcut invocation, with the
    /// invocation's variant prefix distributed over the members.
    pub(crate) async fn expand_textual(&self, token: &str) -> Option<Vec<String>> {
        let matched = self.match_variants(token).await;
        let ctx = ShortcutContext {
            raw: token,
            theme: &self.config.theme,
        };
        let expansion =
            expand_once(&self.config.shortcuts, &matched.base, &ctx, &self.diagnostics).await?;
        let (leading, trailing) = variant_affixes(token, &matched.base);
        Some(
            expansion
                .members
                .into_iter()
                .map(|member| format!("{}{}{}", leading, member, trailing))
                .collect(),
        )
    }

    fn parse<'a>(
        &'a self,
        token: &'a str,
        in_shortcut: bool,
        path: &'a ExpansionPath,
        info: &'a mut TokenInfo,
    ) -> BoxFuture<'a, std::result::Result<Vec<ParsedUtil>, String>> {
        async move {
            let config = &*self.config;
            let matched = self.match_variants(token).await;
            if let Some(reason) = self.blocked(&matched.base) {
                return Err(reason);
            }
            info.variants.extend(matched.names.iter().cloned());

            let ctx = ShortcutContext {
                raw: token,
                theme: &config.theme,
            };
            if let Some(expansion) =
                expand_once(&config.shortcuts, &matched.base, &ctx, &self.diagnostics).await
            {
                let next = match path.enter(&matched.base) {
                    Ok(next) => next,
                    Err(abort) => {
                        abort.report(&self.diagnostics);
                        return Ok(Vec::new());
                    }
                };
                info.shortcut.get_or_insert_with(|| expansion.name.clone());
                if let Some(preset) = &expansion.meta.preset {
                    push_unique(&mut info.presets, preset);
                }

                let mut utils = Vec::new();
                for member in &expansion.members {
                    match self.parse(member, true, &next, &mut *info).await {
                        Ok(parsed) => {
                            for mut util in parsed {
                                util.handlers.extend(matched.handlers.iter().cloned());
                                if util.shortcut_layer.is_none() {
                                    util.shortcut_layer = expansion.meta.layer.clone();
                                }
                                util.no_merge |= expansion.meta.no_merge;
                                utils.push(util);
                            }
                        }
                        Err(reason) => {
                            self.diagnostics.report(
                                DiagnosticKind::Blocked,
                                format!(
                                    "shortcut member `{}` of `{}` blocked: {}",
                                    member, token, reason
                                ),
                            );
                        }
                    }
                }
                return Ok(utils);
            }

            Ok(self
                .match_rules(&matched, token, in_shortcut, info)
                .await)
        }
        .boxed()
    }

    /// Runs the rule table against the peeled body. Every matching rule
    /// contributes until an exclusive one produces output.
    async fn match_rules(
        &self,
        matched: &VariantMatch,
        raw: &str,
        in_shortcut: bool,
        info: &mut TokenInfo,
    ) -> Vec<ParsedUtil> {
        let config = &*self.config;
        let base = matched.base.as_str();
        let unprefixed = config
            .prefix
            .as_deref()
            .and_then(|prefix| base.strip_prefix(prefix))
            .filter(|rest| !rest.is_empty());

        let mut out = Vec::new();
        for compiled in &config.rules {
            let meta = &compiled.rule.meta;
            if meta.flags.contains(RuleFlags::INTERNAL) && !in_shortcut {
                continue;
            }
            let body = if meta.flags.contains(RuleFlags::PREFIX_REQUIRED) {
                match unprefixed {
                    Some(body) => body,
                    None => continue,
                }
            } else {
                unprefixed.unwrap_or(base)
            };
            let Some(captures) = compiled.matcher.captures(body) else {
                continue;
            };

            let ctx = RuleContext {
                raw,
                body,
                theme: &config.theme,
                in_shortcut,
            };
            let batches = match compiled.rule.handler().produce(&captures, &ctx).await {
                Ok(batches) => batches,
                Err(err) => {
                    self.diagnostics.report(
                        DiagnosticKind::HandlerFailed,
                        format!(
                            "rule `{}` failed for `{}`: {}",
                            compiled.rule.display_name(),
                            raw,
                            err
                        ),
                    );
                    continue;
                }
            };
            let batches: Vec<CssBatch> = batches
                .into_iter()
                .filter(|batch| match &batch.body {
                    BatchBody::Entries(entries) => !entries.is_empty(),
                    BatchBody::Raw(css) => !css.trim().is_empty(),
                })
                .collect();
            if batches.is_empty() {
                continue;
            }

            push_unique(&mut info.rules, &compiled.rule.display_name());
            if let Some(preset) = &meta.preset {
                push_unique(&mut info.presets, preset);
            }
            for batch in batches {
                out.push(ParsedUtil {
                    rule_index: compiled.index,
                    batch,
                    rule_layer: meta.layer.clone(),
                    rule_sort: meta.sort,
                    no_merge: meta.flags.contains(RuleFlags::NO_MERGE),
                    handlers: matched.handlers.clone(),
                    shortcut_layer: None,
                    in_shortcut,
                });
            }
            if meta.flags.contains(RuleFlags::EXCLUSIVE) {
                break;
            }
        }
        out
    }

    /// Applies variant transforms and postprocessors and serializes.
    async fn stringify(&self, raw: &str, parsed: ParsedUtil) -> Option<ResolvedUtil> {
        let config = &*self.config;
        let ParsedUtil {
            rule_index,
            batch,
            rule_layer,
            rule_sort,
            no_merge,
            handlers,
            shortcut_layer,
            in_shortcut,
        } = parsed;
        let CssBatch {
            body,
            selector: batch_selector,
            parent: batch_parent,
            layer: batch_layer,
            sort: batch_sort,
            no_merge: batch_no_merge,
        } = batch;

        let rank = rule_index as i64
            + handlers.len() as i64 * VARIANT_RANK_STEP
            + handlers.iter().map(|h| h.order_bump.max(0)).sum::<i64>();

        // Handlers are innermost first; the outermost variant decides.
        let layer = handlers
            .iter()
            .rev()
            .find_map(|h| h.layer.clone())
            .or(batch_layer)
            .or(rule_layer)
            .or(shortcut_layer)
            .or_else(|| in_shortcut.then(|| config.shortcuts_layer.clone()))
            .unwrap_or_else(|| DEFAULT_LAYER.to_string());
        let sort = handlers
            .iter()
            .rev()
            .find_map(|h| h.sort)
            .or(batch_sort)
            .or(rule_sort)
            .unwrap_or(0);
        let no_merge = no_merge || batch_no_merge || handlers.iter().any(|h| h.no_merge);

        let mut parents: Vec<ParentWrapper> = Vec::new();
        if let Some(parent) = batch_parent {
            parents.push(parent);
        }
        for handler in &handlers {
            if let Some(parent) = &handler.parent {
                parents.insert(0, parent.clone());
            }
        }
        let parent_order = parents.first().map(|p| p.order).unwrap_or(0);
        let parents: Vec<String> = parents.into_iter().map(|p| p.at_rule).collect();

        let mut entries = match body {
            BatchBody::Raw(css) => {
                return Some(ResolvedUtil {
                    token: raw.to_string(),
                    rank,
                    selector: None,
                    parents,
                    parent_order,
                    body: css.trim().to_string(),
                    layer,
                    sort,
                    no_merge: true,
                });
            }
            BatchBody::Entries(entries) => entries,
        };

        for handler in &handlers {
            if let Some(rewrite) = &handler.body {
                rewrite(&mut entries);
            }
        }

        let mut selector = to_class_selector(raw);
        if let Some(rewrite) = &batch_selector {
            selector = rewrite(&selector);
        }
        for handler in &handlers {
            if let Some(rewrite) = &handler.selector {
                selector = rewrite(&selector);
            }
        }

        let mut util = UtilObject {
            token: raw.to_string(),
            selector,
            entries,
            parents,
            layer,
            sort,
            no_merge,
        };
        for processor in &config.postprocess {
            if let Err(err) = processor.process(&mut util).await {
                self.diagnostics.report(
                    DiagnosticKind::HandlerFailed,
                    format!("postprocessor failed for `{}`: {}", raw, err),
                );
            }
        }

        let body = entries_to_css(&util.entries)?;
        Some(ResolvedUtil {
            token: util.token,
            rank,
            selector: Some(util.selector),
            parents: util.parents,
            parent_order,
            body,
            layer: util.layer,
            sort: util.sort,
            no_merge: util.no_merge,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlockRule, UserConfig, resolve_config};
    use crate::rule::Rule;
    use crate::shortcut::Shortcut;
    use crate::variant::{at_rule, important, pseudo};
    use atomcss_syntax::entries::entries;

    async fn resolver(config: UserConfig) -> Resolver {
        let config = resolve_config(config).await.unwrap();
        Resolver::new(Arc::new(config), Arc::new(Diagnostics::default()))
    }

    fn margin() -> Rule {
        Rule::dynamic(r"^m-(\d+)$", |m, _| {
            let value = format!("{}px", m.get(1).unwrap_or("0"));
            vec![CssBatch::from_pairs(&[("margin", value.as_str())])]
        })
    }

    #[tokio::test]
    async fn variant_rank_and_selector() {
        let r = resolver(
            UserConfig::new()
                .rule(margin())
                .variant(pseudo("hover", ":hover"))
                .variant(at_rule("md", "@media (min-width: 768px)", 10)),
        )
        .await;
        let outcome = r.resolve("md:hover:m-2").await;
        let util = &outcome.utils()[0];
        assert_eq!(util.selector.as_deref(), Some(".md\\:hover\\:m-2:hover"));
        assert_eq!(util.parents, vec!["@media (min-width: 768px)"]);
        assert_eq!(util.parent_order, 10);
        assert_eq!(util.rank, 2 * VARIANT_RANK_STEP);
        assert_eq!(util.body, "margin:2px;");
    }

    #[tokio::test]
    async fn leftmost_variant_is_outermost_parent() {
        let r = resolver(
            UserConfig::new()
                .rule(margin())
                .variant(at_rule("a", "@media a", 1))
                .variant(at_rule("b", "@supports b", 2)),
        )
        .await;
        let outcome = r.resolve("b:a:m-1").await;
        assert_eq!(outcome.utils()[0].parents, vec!["@supports b", "@media a"]);
        assert_eq!(outcome.utils()[0].parent_order, 2);
    }

    #[tokio::test]
    async fn non_reentrant_variants_apply_once() {
        let r = resolver(
            UserConfig::new()
                .rule(margin())
                .variant(pseudo("hover", ":hover")),
        )
        .await;
        let matched = r.match_variants("hover:hover:m-1").await;
        assert_eq!(matched.base, "hover:m-1");
        assert_eq!(r.resolve("hover:hover:m-1").await, TokenOutcome::Unmatched);
    }

    #[tokio::test]
    async fn reentrant_variants_are_capped() {
        let r = resolver(
            UserConfig::new()
                .rule(margin())
                .variant(pseudo("hover", ":hover").reentrant()),
        )
        .await;
        let matched = r.match_variants("hover:hover:hover:hover:hover:m-1").await;
        assert_eq!(matched.names.len(), MAX_REENTRANT_PASSES);
        assert_eq!(matched.base, "hover:m-1");
    }

    #[tokio::test]
    async fn every_matching_rule_contributes() {
        let r = resolver(
            UserConfig::new()
                .rule(Rule::literal("x", entries(&[("a", "1")])))
                .rule(Rule::literal("x", entries(&[("b", "2")])).exclusive())
                .rule(Rule::literal("x", entries(&[("c", "3")]))),
        )
        .await;
        let outcome = r.resolve("x").await;
        let bodies: Vec<_> = outcome.utils().iter().map(|u| u.body.as_str()).collect();
        assert_eq!(bodies, vec!["a:1;", "b:2;"]);
    }

    #[tokio::test]
    async fn important_marker_both_ends() {
        let r = resolver(UserConfig::new().rule(margin()).variant(important())).await;
        for token in ["!m-1", "m-1!"] {
            let outcome = r.resolve(token).await;
            assert_eq!(outcome.utils()[0].body, "margin:1px !important;");
        }
    }

    #[tokio::test]
    async fn shortcut_members_inherit_invocation_variants() {
        let r = resolver(
            UserConfig::new()
                .rule(margin())
                .rule(Rule::literal("flex", entries(&[("display", "flex")])))
                .variant(pseudo("hover", ":hover"))
                .shortcut(Shortcut::literal("box", "m-1 flex")),
        )
        .await;
        let outcome = r.resolve("hover:box").await;
        let utils = outcome.utils();
        assert_eq!(utils.len(), 2);
        for util in utils {
            assert_eq!(util.selector.as_deref(), Some(".hover\\:box:hover"));
            assert_eq!(util.layer, "shortcuts");
        }
        assert_eq!(
            r.expand_textual("hover:box").await,
            Some(vec!["hover:m-1".to_string(), "hover:flex".to_string()])
        );
    }

    #[tokio::test]
    async fn suffix_variant_affixes_are_kept() {
        assert_eq!(variant_affixes("hover:btn", "btn"), ("hover:", ""));
        assert_eq!(variant_affixes("btn!", "btn"), ("", "!"));
        assert_eq!(variant_affixes("hover:btn!", "btn"), ("hover:", "!"));

        let r = resolver(
            UserConfig::new()
                .rule(margin())
                .variant(important())
                .shortcut(Shortcut::literal("box", "m-1 m-2")),
        )
        .await;
        assert_eq!(
            r.expand_textual("box!").await,
            Some(vec!["m-1!".to_string(), "m-2!".to_string()])
        );
    }

    #[tokio::test]
    async fn negative_order_bump_never_outranks_plain_utils() {
        let r = resolver(
            UserConfig::new()
                .rule(margin())
                .variant(crate::variant::Variant::new("early", |input, ctx| {
                    let rest = ctx.strip(input, "early")?;
                    Some(VariantHandler::new(rest).with_order_bump(-5))
                })),
        )
        .await;
        let plain = r.resolve("m-1").await;
        let bumped = r.resolve("early:m-1").await;
        assert_eq!(bumped.utils()[0].rank, VARIANT_RANK_STEP);
        assert!(bumped.utils()[0].rank > plain.utils()[0].rank);
    }

    #[tokio::test]
    async fn blocked_tokens_record_reason() {
        let r = resolver(
            UserConfig::new()
                .rule(margin())
                .block(BlockRule::pattern(r"^m-9").with_message("no nines")),
        )
        .await;
        assert_eq!(
            r.resolve("m-9").await,
            TokenOutcome::Blocked("no nines".to_string())
        );
        assert!(r.resolve("m-1").await.is_matched());
    }

    #[tokio::test]
    async fn internal_rules_only_match_in_shortcuts() {
        let r = resolver(
            UserConfig::new()
                .rule(Rule::literal("secret", entries(&[("a", "b")])).internal())
                .shortcut(Shortcut::literal("open", "secret")),
        )
        .await;
        assert_eq!(r.resolve("secret").await, TokenOutcome::Unmatched);
        assert!(r.resolve("open").await.is_matched());
    }

    #[tokio::test]
    async fn prefix_required_rules() {
        let r = resolver(
            UserConfig::new()
                .prefix("u-")
                .rule(margin().prefix_required()),
        )
        .await;
        assert!(r.resolve("u-m-1").await.is_matched());
        assert_eq!(r.resolve("m-1").await, TokenOutcome::Unmatched);
    }

    #[tokio::test]
    async fn preprocess_can_exclude() {
        let r = resolver(
            UserConfig::new()
                .rule(margin())
                .preprocess(|t| (!t.starts_with("skip")).then(|| t.to_string())),
        )
        .await;
        assert_eq!(r.resolve("skip-me").await, TokenOutcome::Excluded);
        assert_eq!(r.resolve("  ").await, TokenOutcome::Excluded);
    }

    #[tokio::test]
    async fn postprocessors_rewrite_utils() {
        let r = resolver(UserConfig::new().rule(margin()).postprocess(|util| {
            for (_, value) in util.entries.iter_mut() {
                *value = value.replace("px", "rem");
            }
        }))
        .await;
        assert_eq!(r.resolve("m-3").await.utils()[0].body, "margin:3rem;");
    }
}
