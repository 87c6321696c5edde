//! # plugin-shop
//!
//! E-commerce for the CmsDash admin dashboard: a `product` content type,
//! product and order pages, and shop settings. Requires the SEO toolkit.

pub mod catalog;
pub mod plugin;

pub use catalog::ProductIndex;
pub use plugin::ShopPlugin;

/// Plugin identifier.
pub const PLUGIN_ID: &str = "shop";

/// Content type id of products.
pub const PRODUCT_TYPE: &str = "product";
