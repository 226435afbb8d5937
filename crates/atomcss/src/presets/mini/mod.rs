//! A compact utility preset.
//!
//! Covers spacing, sizing, display, colors with opacity, arbitrary
//! properties and the usual variants (pseudo-classes, breakpoints, dark
//! mode, container queries, `!` and `-` markers).
//!
//! ```no_run
//! use atomcss::{UserConfig, create_generator, presets};
//!
//! # async fn demo() -> atomcss::Result<()> {
//! let generator = create_generator(UserConfig::new().preset(presets::mini())).await?;
//! # Ok(())
//! # }
//! ```

mod colors;
mod preflight;
mod rules;
mod theme;
mod variants;

pub use theme::THEME;

use crate::config::Preset;

/// Name the preset registers under.
pub const NAME: &str = "mini";

/// Builds the preset.
pub fn mini() -> Preset {
    Preset::new(NAME)
        .theme(THEME.clone())
        .rules(rules::rules())
        .variants(variants::variants())
        .preflight(preflight::reset())
}
