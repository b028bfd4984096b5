//! # retouch-studio
//!
//! AI-assisted photo retouching built around four cores:
//!
//! - a linear, fully reversible version history over immutable snapshots
//! - a dual-mask engine (edit + preserve) that scopes generative edits
//! - coordinate mapping between pointer, display, and native pixel spaces
//! - pixel-exact crop rasterization across display scales and DPRs
//!
//! External generation and segmentation services do the actual pixel
//! synthesis; this crate owns everything that must stay correct around
//! them. The GUI lives in [`app`]; the headless CLI in [`cli`]; the
//! `retouch-proxy` binary provides the network boundary.

#![allow(clippy::too_many_arguments)]

pub mod app;
pub mod cli;
pub mod components;
pub mod io;
pub mod logger;
pub mod ops;
pub mod view;

// Re-export commonly used items
pub use components::history::{EpochGate, ImageVersion, VersionHistory, VersionKind};
pub use components::masks::{CompositeMode, MaskEngine, MaskLayer, MaskRole};
pub use ops::intake::OutputSize;
