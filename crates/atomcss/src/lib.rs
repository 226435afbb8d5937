//! # atomcss
//!
//! An on-demand atomic CSS engine. Given utility tokens such as `p-2` or
//! `md:hover:bg-red-500/50`, it produces exactly the CSS those tokens need,
//! computed per token from a table of rules rather than from a fixed
//! stylesheet.
//!
//! ## Pipeline
//!
//! ```text
//! tokens ─▶ resolver (variants, shortcuts, rules) ─▶ cache ─▶ assembler ─▶ CSS
//! ```
//!
//! - [`theme`]: nested configuration values consulted by rules
//! - [`rule`]: matchers producing declaration batches
//! - [`variant`]: modifiers peeled off tokens (`hover:`, `md:`, `!`)
//! - [`shortcut`]: aliases expanding into other tokens
//! - [`resolver`]: per-token resolution, memoized per generator
//! - [`assembler`]: grouping, sorting and layering of the output
//! - [`generator`]: [`create_generator`] and [`Generator::generate`]
//!
//! ## Quick Start
//!
//! ```rust
//! use atomcss::{GenerateInput, GenerateOptions, UserConfig, create_generator};
//! use atomcss::rule::{CssBatch, Rule};
//!
//! # tokio_test_block(async {
//! let config = UserConfig::new().rule(Rule::dynamic(r"^m-(\d+)$", |m, _| {
//!     let value = format!("{}px", m.get(1).unwrap_or("0"));
//!     vec![CssBatch::from_pairs(&[("margin", value.as_str())])]
//! }));
//! let generator = create_generator(config).await.unwrap();
//! let result = generator
//!     .generate(GenerateInput::tokens(["m-4", "m-2"]), &GenerateOptions::default())
//!     .await
//!     .unwrap();
//! assert_eq!(result.css, "/* layer: default */\n.m-2{margin:2px;}\n.m-4{margin:4px;}");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     futures::executor::block_on(f)
//! # }
//! ```
//!
//! ## Errors
//!
//! Configuration problems are reported once by [`create_generator`].
//! Per-token problems (unmatched tokens, failing handlers, shortcut cycles)
//! never fail a generation; they are logged once each through
//! [`Diagnostics`] and reflected in [`GenerateResult`].

pub mod assembler;
pub(crate) mod cache;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extractor;
pub mod generator;
mod log_init;
pub mod presets;
pub mod resolver;
pub mod rule;
pub mod shortcut;
pub mod theme;
pub mod variant;

pub use config::{BlockRule, Preflight, Preset, ResolvedConfig, UserConfig, UtilObject};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{AtomError, HandlerError, Result};
pub use extractor::{Extractor, ExtractorContext, SplitExtractor};
pub use generator::{GenerateInput, GenerateOptions, GenerateResult, Generator, create_generator};
pub use log_init::{LOG_LEVEL_ENV, init_logger};
pub use resolver::{ResolvedUtil, TokenInfo, TokenOutcome, VARIANT_RANK_STEP};
pub use rule::{CssBatch, Rule, RuleFlags};
pub use shortcut::Shortcut;
pub use theme::{Theme, ThemeMerge};
pub use variant::{Variant, VariantHandler};

pub use atomcss_syntax::expand_variant_group;

// Re-export the log crate so users can use atomcss::log::info!, etc.
pub use log;
