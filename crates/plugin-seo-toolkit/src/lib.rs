//! # plugin-seo-toolkit
//!
//! SEO toolkit for the CmsDash admin dashboard. Adds a settings panel, a
//! menu entry and an editor sidebar preview, and scores every newly created
//! content item.

pub mod analyzer;
pub mod plugin;

pub use analyzer::{SeoAnalyzer, SeoReport};
pub use plugin::SeoToolkitPlugin;

/// Plugin identifier.
pub const PLUGIN_ID: &str = "seo-toolkit";
