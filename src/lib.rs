//! Umbrella crate for the atomcss engine.
//!
//! Re-exports the engine ([`atomcss`]) and its token grammar
//! ([`atomcss_syntax`]) so applications depend on a single crate.

pub use atomcss::*;
pub use atomcss_syntax as syntax;
