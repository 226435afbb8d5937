//! Generator configuration.
//!
//! A host builds a [`UserConfig`] value and hands it to
//! [`create_generator`](crate::create_generator). The configuration is a
//! tree: the user config is itself a preset whose children are further
//! presets, any of which may still be loading. Resolution flattens that
//! tree depth-first (children before parents, the user config last) into a
//! single immutable [`ResolvedConfig`].
//!
//! ## Merge order
//!
//! | Field        | Combination                                       |
//! |--------------|---------------------------------------------------|
//! | theme        | deep merge in preset order, then extend hooks     |
//! | rules        | concatenated; rule index defines base rank        |
//! | variants     | concatenated, then stable-sorted by `order`       |
//! | shortcuts    | concatenated; first match wins                    |
//! | layers       | later priorities override earlier ones            |
//! | safelist     | union                                             |
//! | hooks        | concatenated, run in order                        |

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use atomcss_syntax::entries::CssEntries;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::{AtomError, HandlerError, Result};
use crate::extractor::{Extractor, SplitExtractor};
use crate::rule::{CompiledMatcher, CompiledRule, Matcher, Rule};
use crate::shortcut::{CompiledShortcut, Shortcut};
use crate::theme::{Theme, ThemeMerge, check_shape};
use crate::variant::Variant;

/// Maximum nesting depth of the preset tree.
pub const MAX_PRESET_DEPTH: usize = 32;

/// Name of the layer utilities land in when nothing else decides.
pub const DEFAULT_LAYER: &str = "default";

/// Default layer for preflights.
pub const PREFLIGHTS_LAYER: &str = "preflights";

/// Name given to the root preset built from the user config.
pub const USER_CONFIG_NAME: &str = "config";

/// Rewrites a token before resolution. `None` or an empty string excludes
/// the token.
pub type PreprocessFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Adjusts the merged theme once all presets are merged.
pub type ExtendThemeFn = Arc<dyn Fn(&mut Theme) + Send + Sync>;

/// A blocklist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRule {
    pub matcher: Matcher,
    /// Reason recorded for blocked tokens; defaults to a generic message.
    pub message: Option<String>,
}

impl BlockRule {
    pub fn literal(token: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::literal(token),
            message: None,
        }
    }

    pub fn pattern(source: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::pattern(source),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A compiled blocklist entry.
#[derive(Debug, Clone)]
pub(crate) struct CompiledBlock {
    pub(crate) matcher: CompiledMatcher,
    pub(crate) rule: BlockRule,
}

impl CompiledBlock {
    /// The reason `token` is blocked, if it is.
    pub(crate) fn reason(&self, token: &str) -> Option<String> {
        self.matcher.captures(token)?;
        Some(self.rule.message.clone().unwrap_or_else(|| {
            format!("blocked by `{}`", self.rule.matcher.source())
        }))
    }
}

/// What a preflight handler can see.
#[derive(Debug, Clone, Copy)]
pub struct PreflightContext<'a> {
    pub theme: &'a Theme,
}

/// Produces a global CSS snippet emitted ahead of utilities.
#[async_trait]
pub trait PreflightHandler: Send + Sync {
    async fn css(&self, ctx: &PreflightContext<'_>) -> std::result::Result<Option<String>, HandlerError>;
}

struct StaticPreflight(String);

#[async_trait]
impl PreflightHandler for StaticPreflight {
    async fn css(&self, _ctx: &PreflightContext<'_>) -> std::result::Result<Option<String>, HandlerError> {
        Ok(Some(self.0.clone()))
    }
}

struct FnPreflight<F>(F);

#[async_trait]
impl<F> PreflightHandler for FnPreflight<F>
where
    F: Fn(&Theme) -> Option<String> + Send + Sync,
{
    async fn css(&self, ctx: &PreflightContext<'_>) -> std::result::Result<Option<String>, HandlerError> {
        Ok((self.0)(ctx.theme))
    }
}

/// A global CSS snippet with its own layer.
#[derive(Clone)]
pub struct Preflight {
    pub layer: Option<String>,
    handler: Arc<dyn PreflightHandler>,
}

impl Preflight {
    /// A fixed snippet.
    pub fn new(css: impl Into<String>) -> Self {
        Self::with_handler(StaticPreflight(css.into()))
    }

    /// A snippet computed from the merged theme.
    pub fn from_theme<F>(f: F) -> Self
    where
        F: Fn(&Theme) -> Option<String> + Send + Sync + 'static,
    {
        Self::with_handler(FnPreflight(f))
    }

    pub fn with_handler(handler: impl PreflightHandler + 'static) -> Self {
        Self {
            layer: None,
            handler: Arc::new(handler),
        }
    }

    pub fn layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub(crate) fn handler(&self) -> &Arc<dyn PreflightHandler> {
        &self.handler
    }
}

impl fmt::Debug for Preflight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preflight")
            .field("layer", &self.layer)
            .finish_non_exhaustive()
    }
}

/// A utility as seen by postprocessors, before serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct UtilObject {
    pub token: String,
    pub selector: String,
    pub entries: CssEntries,
    /// Parent at-rules, outermost first.
    pub parents: Vec<String>,
    pub layer: String,
    pub sort: i32,
    pub no_merge: bool,
}

/// Rewrites utilities after rule matching. Emptying `entries` drops the
/// utility.
#[async_trait]
pub trait Postprocessor: Send + Sync {
    async fn process(&self, util: &mut UtilObject) -> std::result::Result<(), HandlerError>;
}

struct FnPostprocessor<F>(F);

#[async_trait]
impl<F> Postprocessor for FnPostprocessor<F>
where
    F: Fn(&mut UtilObject) + Send + Sync,
{
    async fn process(&self, util: &mut UtilObject) -> std::result::Result<(), HandlerError> {
        (self.0)(util);
        Ok(())
    }
}

/// A preset that is either available or still loading.
pub enum PresetSource {
    Ready(Box<Preset>),
    Pending {
        /// Name used in error messages if loading fails.
        name: String,
        future: BoxFuture<'static, std::result::Result<Preset, HandlerError>>,
    },
}

impl fmt::Debug for PresetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetSource::Ready(preset) => f.debug_tuple("Ready").field(&preset.name).finish(),
            PresetSource::Pending { name, .. } => f.debug_tuple("Pending").field(name).finish(),
        }
    }
}

/// A named bundle of configuration.
#[derive(Default)]
pub struct Preset {
    pub name: String,
    pub rules: Vec<Rule>,
    pub variants: Vec<Variant>,
    pub shortcuts: Vec<Shortcut>,
    pub theme: Option<Value>,
    pub preflights: Vec<Preflight>,
    pub layers: BTreeMap<String, i32>,
    pub blocklist: Vec<BlockRule>,
    pub safelist: Vec<String>,
    pub preprocess: Vec<PreprocessFn>,
    pub postprocess: Vec<Arc<dyn Postprocessor>>,
    pub extend_theme: Vec<ExtendThemeFn>,
    pub extractors: Vec<Arc<dyn Extractor>>,
    pub presets: Vec<PresetSource>,
}

impl fmt::Debug for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preset")
            .field("name", &self.name)
            .field("rules", &self.rules.len())
            .field("variants", &self.variants.len())
            .field("shortcuts", &self.shortcuts.len())
            .field("presets", &self.presets)
            .finish_non_exhaustive()
    }
}

/// Builder methods shared by [`Preset`] and [`UserConfig`].
macro_rules! content_builders {
    () => {
        pub fn rule(mut self, rule: Rule) -> Self {
            self.content().rules.push(rule);
            self
        }

        pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
            self.content().rules.extend(rules);
            self
        }

        pub fn variant(mut self, variant: Variant) -> Self {
            self.content().variants.push(variant);
            self
        }

        pub fn variants(mut self, variants: impl IntoIterator<Item = Variant>) -> Self {
            self.content().variants.extend(variants);
            self
        }

        pub fn shortcut(mut self, shortcut: Shortcut) -> Self {
            self.content().shortcuts.push(shortcut);
            self
        }

        pub fn shortcuts(mut self, shortcuts: impl IntoIterator<Item = Shortcut>) -> Self {
            self.content().shortcuts.extend(shortcuts);
            self
        }

        /// Sets the theme contribution. Repeated calls deep-merge.
        pub fn theme(mut self, theme: Value) -> Self {
            let slot = &mut self.content().theme;
            match slot.take() {
                Some(mut existing) => {
                    crate::theme::deep_merge(&mut existing, &theme, ThemeMerge::Concat);
                    *slot = Some(existing);
                }
                None => *slot = Some(theme),
            }
            self
        }

        pub fn preflight(mut self, preflight: Preflight) -> Self {
            self.content().preflights.push(preflight);
            self
        }

        /// Sets the priority of a layer. Lower priorities are emitted first.
        pub fn layer(mut self, name: impl Into<String>, priority: i32) -> Self {
            self.content().layers.insert(name.into(), priority);
            self
        }

        pub fn block(mut self, rule: BlockRule) -> Self {
            self.content().blocklist.push(rule);
            self
        }

        pub fn safelist<I, S>(mut self, tokens: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.content().safelist.extend(tokens.into_iter().map(Into::into));
            self
        }

        pub fn preprocess<F>(mut self, f: F) -> Self
        where
            F: Fn(&str) -> Option<String> + Send + Sync + 'static,
        {
            self.content().preprocess.push(Arc::new(f));
            self
        }

        /// Adds a synchronous postprocessor.
        pub fn postprocess<F>(mut self, f: F) -> Self
        where
            F: Fn(&mut UtilObject) + Send + Sync + 'static,
        {
            self.content().postprocess.push(Arc::new(FnPostprocessor(f)));
            self
        }

        pub fn postprocessor(mut self, processor: impl Postprocessor + 'static) -> Self {
            self.content().postprocess.push(Arc::new(processor));
            self
        }

        pub fn extend_theme<F>(mut self, f: F) -> Self
        where
            F: Fn(&mut Theme) + Send + Sync + 'static,
        {
            self.content().extend_theme.push(Arc::new(f));
            self
        }

        pub fn extractor(mut self, extractor: impl Extractor + 'static) -> Self {
            self.content().extractors.push(Arc::new(extractor));
            self
        }

        /// Nests a preset.
        pub fn preset(mut self, preset: Preset) -> Self {
            self.content().presets.push(PresetSource::Ready(Box::new(preset)));
            self
        }

        /// Nests a preset that is still loading.
        pub fn preset_async<F>(mut self, name: impl Into<String>, future: F) -> Self
        where
            F: Future<Output = std::result::Result<Preset, HandlerError>> + Send + 'static,
        {
            self.content().presets.push(PresetSource::Pending {
                name: name.into(),
                future: future.boxed(),
            });
            self
        }
    };
}

impl Preset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn content(&mut self) -> &mut Preset {
        self
    }

    content_builders!();
}

/// The host-supplied configuration.
pub struct UserConfig {
    root: Preset,
    pub theme_merge: ThemeMerge,
    /// Characters allowed between a variant name and the rest of the token.
    pub separators: Vec<String>,
    pub prefix: Option<String>,
    /// Layer for utilities produced through shortcuts.
    pub shortcuts_layer: String,
    pub merge_selectors: bool,
    pub warn_unmatched: bool,
    /// Wrap layers in `@layer name{…}` instead of comment markers.
    pub output_native_layers: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            root: Preset::new(USER_CONFIG_NAME),
            theme_merge: ThemeMerge::Concat,
            separators: vec![":".to_string(), "-".to_string()],
            prefix: None,
            shortcuts_layer: "shortcuts".to_string(),
            merge_selectors: true,
            warn_unmatched: false,
            output_native_layers: false,
        }
    }
}

impl fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserConfig")
            .field("root", &self.root)
            .field("theme_merge", &self.theme_merge)
            .field("separators", &self.separators)
            .field("prefix", &self.prefix)
            .field("shortcuts_layer", &self.shortcuts_layer)
            .field("merge_selectors", &self.merge_selectors)
            .field("warn_unmatched", &self.warn_unmatched)
            .field("output_native_layers", &self.output_native_layers)
            .finish()
    }
}

impl UserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    fn content(&mut self) -> &mut Preset {
        &mut self.root
    }

    content_builders!();

    pub fn theme_merge(mut self, mode: ThemeMerge) -> Self {
        self.theme_merge = mode;
        self
    }

    pub fn separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn shortcuts_layer(mut self, layer: impl Into<String>) -> Self {
        self.shortcuts_layer = layer.into();
        self
    }

    pub fn merge_selectors(mut self, enabled: bool) -> Self {
        self.merge_selectors = enabled;
        self
    }

    pub fn warn_unmatched(mut self, enabled: bool) -> Self {
        self.warn_unmatched = enabled;
        self
    }

    pub fn output_native_layers(mut self, enabled: bool) -> Self {
        self.output_native_layers = enabled;
        self
    }
}

/// The flattened, compiled configuration of a generator.
pub struct ResolvedConfig {
    pub theme: Theme,
    pub(crate) rules: Vec<CompiledRule>,
    pub variants: Vec<Variant>,
    pub(crate) shortcuts: Vec<CompiledShortcut>,
    pub preflights: Vec<Preflight>,
    pub layers: BTreeMap<String, i32>,
    pub(crate) blocklist: Vec<CompiledBlock>,
    pub safelist: BTreeSet<String>,
    pub preprocess: Vec<PreprocessFn>,
    pub postprocess: Vec<Arc<dyn Postprocessor>>,
    pub extractors: Vec<Arc<dyn Extractor>>,
    pub separators: Vec<String>,
    pub prefix: Option<String>,
    pub shortcuts_layer: String,
    pub merge_selectors: bool,
    pub warn_unmatched: bool,
    pub output_native_layers: bool,
    /// Preset names in merge order, the user config last.
    pub presets: Vec<String>,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("presets", &self.presets)
            .field("rules", &self.rules.len())
            .field("variants", &self.variants.len())
            .field("shortcuts", &self.shortcuts.len())
            .field("layers", &self.layers)
            .field("safelist", &self.safelist)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl ResolvedConfig {
    /// Priority of a layer. Unconfigured layers sit at 0, except preflights
    /// which go last.
    pub fn layer_priority(&self, layer: &str) -> i32 {
        match self.layers.get(layer) {
            Some(priority) => *priority,
            None if layer == PREFLIGHTS_LAYER => i32::MAX,
            None => 0,
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn shortcut_count(&self) -> usize {
        self.shortcuts.len()
    }
}

fn flatten<'a>(
    source: PresetSource,
    chain: Vec<String>,
    seen: &'a mut HashSet<String>,
    out: &'a mut Vec<Preset>,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let mut preset = match source {
            PresetSource::Ready(preset) => *preset,
            PresetSource::Pending { name, future } => {
                log::debug!("awaiting preset `{}`", name);
                future.await.map_err(|err| AtomError::PresetLoad {
                    name,
                    message: err.message,
                })?
            }
        };

        if chain.contains(&preset.name) {
            let mut cycle = chain.clone();
            cycle.push(preset.name.clone());
            return Err(AtomError::PresetCycle(cycle.join(" -> ")));
        }
        if chain.len() >= MAX_PRESET_DEPTH {
            return Err(AtomError::PresetTooDeep(MAX_PRESET_DEPTH));
        }
        if !seen.insert(preset.name.clone()) {
            log::debug!("preset `{}` already included, skipping", preset.name);
            return Ok(());
        }

        let mut chain = chain;
        chain.push(preset.name.clone());
        for child in std::mem::take(&mut preset.presets) {
            flatten(child, chain.clone(), &mut *seen, &mut *out).await?;
        }
        out.push(preset);
        Ok(())
    }
    .boxed()
}

fn check_layer(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AtomError::EmptyLayerName);
    }
    Ok(())
}

/// Flattens and compiles a user configuration.
pub async fn resolve_config(config: UserConfig) -> Result<ResolvedConfig> {
    let UserConfig {
        root,
        theme_merge,
        separators,
        prefix,
        shortcuts_layer,
        merge_selectors,
        warn_unmatched,
        output_native_layers,
    } = config;

    let mut seen = HashSet::new();
    let mut presets = Vec::new();
    flatten(
        PresetSource::Ready(Box::new(root)),
        Vec::new(),
        &mut seen,
        &mut presets,
    )
    .await?;

    check_layer(&shortcuts_layer)?;

    let mut theme = Theme::new();
    let mut rules = Vec::new();
    let mut variants = Vec::new();
    let mut shortcuts = Vec::new();
    let mut preflights = Vec::new();
    let mut layers = BTreeMap::from([
        (shortcuts_layer.clone(), -10),
        (DEFAULT_LAYER.to_string(), 0),
    ]);
    let mut blocklist = Vec::new();
    let mut safelist = BTreeSet::new();
    let mut preprocess = Vec::new();
    let mut postprocess = Vec::new();
    let mut extend_theme = Vec::new();
    let mut extractors = Vec::new();
    let mut names = Vec::new();

    for preset in presets {
        let Preset {
            name,
            rules: preset_rules,
            variants: preset_variants,
            shortcuts: preset_shortcuts,
            theme: preset_theme,
            preflights: preset_preflights,
            layers: preset_layers,
            blocklist: preset_blocklist,
            safelist: preset_safelist,
            preprocess: preset_preprocess,
            postprocess: preset_postprocess,
            extend_theme: preset_extend,
            extractors: preset_extractors,
            presets: _,
        } = preset;

        if let Some(value) = preset_theme {
            check_shape(&value)?;
            theme.merge(&value, theme_merge);
        }

        for mut rule in preset_rules {
            if let Some(layer) = &rule.meta.layer {
                check_layer(layer)?;
            }
            rule.meta.preset.get_or_insert_with(|| name.clone());
            rules.push(CompiledRule {
                index: rules.len(),
                matcher: rule.matcher.compile()?,
                rule,
            });
        }

        variants.extend(preset_variants);

        for mut shortcut in preset_shortcuts {
            if let Some(layer) = &shortcut.meta.layer {
                check_layer(layer)?;
            }
            shortcut.meta.preset.get_or_insert_with(|| name.clone());
            shortcuts.push(CompiledShortcut::compile(shortcut)?);
        }

        for preflight in &preset_preflights {
            if let Some(layer) = &preflight.layer {
                check_layer(layer)?;
            }
        }
        preflights.extend(preset_preflights);

        for (layer, priority) in preset_layers {
            check_layer(&layer)?;
            layers.insert(layer, priority);
        }

        for block in preset_blocklist {
            blocklist.push(CompiledBlock {
                matcher: block.matcher.compile()?,
                rule: block,
            });
        }

        safelist.extend(preset_safelist);
        preprocess.extend(preset_preprocess);
        postprocess.extend(preset_postprocess);
        extend_theme.extend(preset_extend);
        extractors.extend(preset_extractors);
        names.push(name);
    }

    for hook in &extend_theme {
        hook(&mut theme);
    }
    check_shape(theme.as_value())?;

    variants.sort_by_key(|variant| variant.order);

    if extractors.is_empty() {
        extractors.push(Arc::new(SplitExtractor) as Arc<dyn Extractor>);
    }

    log::debug!(
        "resolved config: presets={:?} rules={} variants={} shortcuts={}",
        names,
        rules.len(),
        variants.len(),
        shortcuts.len()
    );

    Ok(ResolvedConfig {
        theme,
        rules,
        variants,
        shortcuts,
        preflights,
        layers,
        blocklist,
        safelist,
        preprocess,
        postprocess,
        extractors,
        separators,
        prefix,
        shortcuts_layer,
        merge_selectors,
        warn_unmatched,
        output_native_layers,
        presets: names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use atomcss_syntax::entries::entries;
    use serde_json::json;

    fn flex() -> Rule {
        Rule::literal("flex", entries(&[("display", "flex")]))
    }

    #[tokio::test]
    async fn presets_flatten_children_first() {
        let inner = Preset::new("inner").rule(flex());
        let outer = Preset::new("outer").preset(inner).rule(flex());
        let resolved = resolve_config(UserConfig::new().preset(outer)).await.unwrap();

        assert_eq!(resolved.presets, vec!["inner", "outer", "config"]);
        assert_eq!(resolved.rules[0].rule.meta.preset.as_deref(), Some("inner"));
        assert_eq!(resolved.rules[1].rule.meta.preset.as_deref(), Some("outer"));
        assert_eq!(resolved.rules[1].index, 1);
    }

    #[tokio::test]
    async fn async_presets_are_awaited() {
        let config = UserConfig::new().preset_async("remote", async {
            Ok(Preset::new("remote").rule(flex()))
        });
        let resolved = resolve_config(config).await.unwrap();
        assert_eq!(resolved.rule_count(), 1);
    }

    #[tokio::test]
    async fn failing_async_preset_is_a_config_error() {
        let config = UserConfig::new()
            .preset_async("remote", async { Err(HandlerError::new("offline")) });
        let err = resolve_config(config).await.unwrap_err();
        assert!(matches!(err, AtomError::PresetLoad { name, .. } if name == "remote"));
    }

    #[tokio::test]
    async fn preset_reappearing_on_its_own_chain_is_a_cycle() {
        let config = UserConfig::new().preset(Preset::new("a").preset_async("b", async {
            Ok(Preset::new("b").preset(Preset::new("a")))
        }));
        let err = resolve_config(config).await.unwrap_err();
        match err {
            AtomError::PresetCycle(chain) => assert_eq!(chain, "config -> a -> b -> a"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn deep_preset_chains_are_rejected() {
        let mut preset = Preset::new("p0");
        for depth in 1..=MAX_PRESET_DEPTH {
            preset = Preset::new(format!("p{depth}")).preset(preset);
        }
        let err = resolve_config(UserConfig::new().preset(preset)).await.unwrap_err();
        assert!(matches!(err, AtomError::PresetTooDeep(MAX_PRESET_DEPTH)));
    }

    #[tokio::test]
    async fn duplicate_presets_are_included_once() {
        let config = UserConfig::new()
            .preset(Preset::new("shared").rule(flex()))
            .preset(Preset::new("shared").rule(flex()));
        let resolved = resolve_config(config).await.unwrap();
        assert_eq!(resolved.rule_count(), 1);
    }

    #[tokio::test]
    async fn themes_merge_in_order_and_user_last() {
        let config = UserConfig::new()
            .preset(Preset::new("base").theme(json!({ "colors": { "red": "#f00", "list": [1] } })))
            .theme(json!({ "colors": { "red": "#e00", "list": [2] } }))
            .extend_theme(|theme| theme.set("colors.blue", json!("#00f")));
        let resolved = resolve_config(config).await.unwrap();
        assert_eq!(resolved.theme.get_str("colors.red"), Some("#e00"));
        assert_eq!(resolved.theme.get("colors.list"), Some(&json!([1, 2])));
        assert_eq!(resolved.theme.get_str("colors.blue"), Some("#00f"));
    }

    #[tokio::test]
    async fn replace_mode_replaces_arrays() {
        let config = UserConfig::new()
            .theme_merge(ThemeMerge::Replace)
            .preset(Preset::new("base").theme(json!({ "list": [1] })))
            .theme(json!({ "list": [2] }));
        let resolved = resolve_config(config).await.unwrap();
        assert_eq!(resolved.theme.get("list"), Some(&json!([2])));
    }

    #[tokio::test]
    async fn non_object_theme_is_rejected() {
        let config = UserConfig::new().preset(Preset {
            theme: Some(json!([1, 2])),
            ..Preset::new("bad")
        });
        assert!(matches!(
            resolve_config(config).await,
            Err(AtomError::InvalidTheme(_))
        ));
    }

    #[tokio::test]
    async fn empty_layer_names_are_rejected() {
        let config = UserConfig::new().layer(" ", 3);
        assert!(matches!(
            resolve_config(config).await,
            Err(AtomError::EmptyLayerName)
        ));
        let config = UserConfig::new().rule(flex().layer(""));
        assert!(matches!(
            resolve_config(config).await,
            Err(AtomError::EmptyLayerName)
        ));
    }

    #[tokio::test]
    async fn invalid_patterns_fail_at_resolution() {
        let config = UserConfig::new().rule(Rule::dynamic("(", |_, _| Vec::new()));
        assert!(matches!(
            resolve_config(config).await,
            Err(AtomError::InvalidPattern { .. })
        ));
    }

    #[tokio::test]
    async fn variants_are_stable_sorted_by_order() {
        use crate::variant::pseudo;
        let config = UserConfig::new()
            .variant(pseudo("a", ":a").order(5))
            .variant(pseudo("b", ":b"))
            .variant(pseudo("c", ":c").order(5))
            .variant(pseudo("d", ":d").order(-1));
        let resolved = resolve_config(config).await.unwrap();
        let names: Vec<_> = resolved.variants.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["d", "b", "a", "c"]);
    }

    #[tokio::test]
    async fn layer_priorities() {
        let config = UserConfig::new().layer("utilities", 20).layer("default", 10);
        let resolved = resolve_config(config).await.unwrap();
        assert_eq!(resolved.layer_priority("shortcuts"), -10);
        assert_eq!(resolved.layer_priority("default"), 10);
        assert_eq!(resolved.layer_priority("utilities"), 20);
        assert_eq!(resolved.layer_priority("unknown"), 0);
        assert_eq!(resolved.layer_priority(PREFLIGHTS_LAYER), i32::MAX);
    }
}
