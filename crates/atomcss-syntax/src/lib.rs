//! # atomcss-syntax
//!
//! Text-level building blocks for the atomcss engine. Nothing in this crate
//! knows about rules, variants or themes; it only deals with the shapes of
//! strings that flow through the engine:
//!
//! - **Escaping**: turn raw tokens into class selectors ([`escape`])
//! - **Entries**: serialize flat `property: value` lists ([`entries`])
//! - **Values**: coerce token values into CSS values ([`values`], [`units`])
//! - **Variant groups**: expand `hover:(a b)` shorthand ([`variant_group`])
//! - **Splitting**: cut source text into candidate tokens ([`split`])
//!
//! ## Quick Start
//!
//! ```rust
//! use atomcss_syntax::escape::to_class_selector;
//! use atomcss_syntax::values::ValueKinds;
//! use atomcss_syntax::variant_group::expand_variant_group;
//!
//! let tokens = expand_variant_group("md:(p-4 m-[3px])");
//! assert_eq!(tokens, vec!["md:p-4", "md:m-[3px]"]);
//!
//! assert_eq!(to_class_selector(&tokens[0]), ".md\\:p-4");
//! assert_eq!(ValueKinds::SPACING.resolve("4").as_deref(), Some("1rem"));
//! ```

pub mod entries;
pub mod error;
pub mod escape;
pub mod split;
pub mod units;
pub mod values;
pub mod variant_group;

pub use entries::{CssEntries, CssEntry, entries_to_css};
pub use error::SyntaxError;
pub use escape::{escape_selector, to_class_selector};
pub use values::{ValueHandler, ValueKinds};
pub use variant_group::expand_variant_group;
