//! Persistence store implementations.

pub mod memory;

pub use memory::MemoryPluginStore;
