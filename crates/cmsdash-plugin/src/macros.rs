//! Convenience macros for plugin development.

/// Builds a [`PluginMetadata`](cmsdash_core::types::PluginMetadata).
///
/// # Example
/// ```rust,ignore
/// let metadata = plugin_metadata!(
///     id: "shop",
///     name: "Shop",
///     version: "1.0.0",
///     description: "E-commerce for the CMS",
///     author: "CmsDash Team",
///     dependencies: ["seo-toolkit"]
/// );
/// ```
#[macro_export]
macro_rules! plugin_metadata {
    (
        id: $id:expr,
        name: $name:expr,
        version: $version:expr
        $(, description: $desc:expr)?
        $(, author: $author:expr)?
        $(, icon: $icon:expr)?
        $(, dependencies: [$($dep:expr),* $(,)?])?
        $(,)?
    ) => {{
        #[allow(unused_mut)]
        let mut metadata = $crate::prelude::PluginMetadata::new($id, $name, $version);
        $( metadata = metadata.with_description($desc); )?
        $( metadata = metadata.with_author($author); )?
        $( metadata = metadata.with_icon($icon); )?
        $( $( metadata = metadata.with_dependency($dep); )* )?
        metadata
    }};
}
