//! Collaborator traits defined in `cmsdash-core` and implemented by other crates.

pub mod store;

pub use store::PluginStore;
