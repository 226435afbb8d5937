//! The generator: entry point of the engine.
//!
//! ```no_run
//! use atomcss::{GenerateInput, GenerateOptions, UserConfig, create_generator, presets};
//!
//! # async fn demo() -> atomcss::Result<()> {
//! let generator = create_generator(UserConfig::new().preset(presets::mini())).await?;
//! let result = generator
//!     .generate(GenerateInput::tokens(["p-2", "hover:text-red-500"]), &GenerateOptions::default())
//!     .await?;
//! println!("{}", result.css);
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::join_all;

use crate::assembler::{AssembleOptions, LayerBlock, PreflightBlock, assemble};
use crate::cache::TokenCache;
use crate::config::{PREFLIGHTS_LAYER, PreflightContext, ResolvedConfig, UserConfig, resolve_config};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::extractor::apply_extractors;
use crate::resolver::{Resolver, TokenInfo, TokenOutcome, VariantMatch};
use crate::theme::Theme;

/// What to generate CSS for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateInput {
    Tokens(BTreeSet<String>),
    /// Source text, run through the configured extractors.
    Source { code: String, id: Option<String> },
}

impl GenerateInput {
    pub fn tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GenerateInput::Tokens(tokens.into_iter().map(Into::into).collect())
    }

    pub fn source(code: impl Into<String>, id: Option<&str>) -> Self {
        GenerateInput::Source {
            code: code.into(),
            id: id.map(str::to_string),
        }
    }
}

impl From<BTreeSet<String>> for GenerateInput {
    fn from(tokens: BTreeSet<String>) -> Self {
        GenerateInput::Tokens(tokens)
    }
}

/// Per-call generation switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    pub preflights: bool,
    pub safelist: bool,
    pub minify: bool,
    pub scope: Option<String>,
    /// Collect [`TokenInfo`] for every matched token.
    pub extended_info: bool,
    /// Only emit these layers, when set.
    pub include_layers: Option<BTreeSet<String>>,
    pub exclude_layers: BTreeSet<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            preflights: true,
            safelist: true,
            minify: false,
            scope: None,
            extended_info: false,
            include_layers: None,
            exclude_layers: BTreeSet::new(),
        }
    }
}

impl GenerateOptions {
    fn wants_layer(&self, layer: &str) -> bool {
        !self.exclude_layers.contains(layer)
            && self
                .include_layers
                .as_ref()
                .is_none_or(|include| include.contains(layer))
    }
}

/// The output of one [`Generator::generate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateResult {
    pub css: String,
    /// Emitted layer names, in output order.
    pub layers: Vec<String>,
    pub matched: BTreeSet<String>,
    pub unmatched: BTreeSet<String>,
    /// Blocked tokens and the reason for each.
    pub blocked: BTreeMap<String, String>,
    /// Present when [`GenerateOptions::extended_info`] was set.
    pub info: Option<BTreeMap<String, TokenInfo>>,
    layer_blocks: Vec<LayerBlock>,
    minify: bool,
}

impl GenerateResult {
    /// The CSS of a single layer.
    pub fn layer_css(&self, name: &str) -> Option<&str> {
        self.layer_blocks
            .iter()
            .find(|block| block.name == name)
            .map(|block| block.css.as_str())
    }

    /// The CSS of the selected layers, in output order. `include = None`
    /// selects every layer.
    pub fn layers_css(&self, include: Option<&[&str]>, exclude: &[&str]) -> String {
        let sep = if self.minify { "" } else { "\n" };
        self.layer_blocks
            .iter()
            .filter(|block| include.is_none_or(|names| names.contains(&block.name.as_str())))
            .filter(|block| !exclude.contains(&block.name.as_str()))
            .map(|block| block.css.as_str())
            .collect::<Vec<_>>()
            .join(sep)
    }
}

struct GeneratorInner {
    resolver: Resolver,
    cache: TokenCache,
}

/// A configured engine instance.
///
/// Cloning is cheap and clones share the cache.
#[derive(Clone)]
pub struct Generator {
    inner: Arc<GeneratorInner>,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("config", self.config())
            .field("cached", &self.inner.cache.len())
            .finish()
    }
}

/// Builds a generator, flattening presets and compiling every matcher.
///
/// All configuration errors surface here.
pub async fn create_generator(config: UserConfig) -> Result<Generator> {
    let resolved = resolve_config(config).await?;
    let diagnostics = Diagnostics::new(resolved.warn_unmatched);
    Ok(Generator {
        inner: Arc::new(GeneratorInner {
            resolver: Resolver::new(Arc::new(resolved), Arc::new(diagnostics)),
            cache: TokenCache::default(),
        }),
    })
}

impl Generator {
    pub fn config(&self) -> &ResolvedConfig {
        self.inner.resolver.config()
    }

    pub fn theme(&self) -> &Theme {
        &self.config().theme
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.inner.resolver.diagnostics()
    }

    /// Resolves one token through the cache.
    pub async fn resolve(&self, token: &str) -> Arc<TokenOutcome> {
        self.inner
            .cache
            .get_or_resolve(token, &self.inner.resolver)
            .await
    }

    /// Resolves one token, bypassing the cache.
    pub async fn parse_token(&self, token: &str) -> TokenOutcome {
        self.inner.resolver.resolve(token).await
    }

    pub async fn match_variants(&self, token: &str) -> VariantMatch {
        self.inner.resolver.match_variants(token).await
    }

    /// One level of shortcut expansion, with the invocation's variants
    /// distributed over the members (`hover:btn` → `hover:px-4 hover:py-1`).
    pub async fn expand_shortcut(&self, token: &str) -> Option<Vec<String>> {
        self.inner.resolver.expand_textual(token).await
    }

    /// Extracts candidate tokens from source text.
    pub async fn extract(&self, code: &str, id: Option<&str>) -> Result<BTreeSet<String>> {
        apply_extractors(&self.config().extractors, code, id).await
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// Tokens with a cached outcome, sorted.
    pub fn cached_tokens(&self) -> Vec<String> {
        self.inner.cache.tokens()
    }

    /// The cached outcome of a token, if its resolution has finished.
    pub fn cached(&self, token: &str) -> Option<Arc<TokenOutcome>> {
        self.inner.cache.peek(token)
    }

    async fn preflights(&self) -> Vec<PreflightBlock> {
        let ctx = PreflightContext {
            theme: self.theme(),
        };
        let mut blocks = Vec::new();
        for preflight in &self.config().preflights {
            match preflight.handler().css(&ctx).await {
                Ok(Some(css)) => blocks.push(PreflightBlock {
                    layer: preflight
                        .layer
                        .clone()
                        .unwrap_or_else(|| PREFLIGHTS_LAYER.to_string()),
                    css,
                }),
                Ok(None) => {}
                Err(err) => {
                    self.diagnostics().report(
                        DiagnosticKind::HandlerFailed,
                        format!("preflight failed: {}", err),
                    );
                }
            }
        }
        blocks
    }

    /// Generates CSS for the given input.
    ///
    /// Only extractor failures are errors; per-token problems are reported
    /// in the result.
    pub async fn generate(
        &self,
        input: GenerateInput,
        options: &GenerateOptions,
    ) -> Result<GenerateResult> {
        let mut tokens = match input {
            GenerateInput::Tokens(tokens) => tokens,
            GenerateInput::Source { code, id } => self.extract(&code, id.as_deref()).await?,
        };
        if options.safelist {
            tokens.extend(self.config().safelist.iter().cloned());
        }

        let outcomes = join_all(tokens.iter().map(|token| async move {
            (token, self.resolve(token).await)
        }))
        .await;

        let mut utils = Vec::new();
        let mut matched = BTreeSet::new();
        let mut unmatched = BTreeSet::new();
        let mut blocked = BTreeMap::new();
        let mut info = BTreeMap::new();
        for (token, outcome) in outcomes {
            match &*outcome {
                TokenOutcome::Matched {
                    utils: token_utils,
                    info: token_info,
                } => {
                    utils.extend(
                        token_utils
                            .iter()
                            .filter(|u| options.wants_layer(&u.layer))
                            .cloned(),
                    );
                    matched.insert(token.clone());
                    if options.extended_info {
                        info.insert(token.clone(), token_info.clone());
                    }
                }
                TokenOutcome::Unmatched => {
                    unmatched.insert(token.clone());
                }
                TokenOutcome::Blocked(reason) => {
                    blocked.insert(token.clone(), reason.clone());
                }
                TokenOutcome::Excluded => {}
            }
        }

        let preflights = if options.preflights {
            self.preflights()
                .await
                .into_iter()
                .filter(|p| options.wants_layer(&p.layer))
                .collect()
        } else {
            Vec::new()
        };

        let config = self.config();
        let assembled = assemble(
            &utils,
            &preflights,
            |layer| config.layer_priority(layer),
            &AssembleOptions {
                minify: options.minify,
                scope: options.scope.as_deref(),
                merge_selectors: config.merge_selectors,
                native_layers: config.output_native_layers,
            },
        );
        log::debug!(
            "generated {} bytes for {} tokens ({} unmatched)",
            assembled.css.len(),
            matched.len(),
            unmatched.len()
        );

        Ok(GenerateResult {
            css: assembled.css,
            layers: assembled.layers.iter().map(|l| l.name.clone()).collect(),
            matched,
            unmatched,
            blocked,
            info: options.extended_info.then_some(info),
            layer_blocks: assembled.layers,
            minify: options.minify,
        })
    }
}
