//! Presets shipped with the engine.
//!
//! Only a small demonstration preset lives here. It is plain configuration
//! data built from the public rule, variant and preflight types, the same
//! way a host-side preset would be written.

pub mod mini;

pub use mini::mini;
