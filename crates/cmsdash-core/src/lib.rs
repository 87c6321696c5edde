//! # cmsdash-core
//!
//! Core crate for the CMS admin dashboard plugin runtime. Contains the
//! plugin data model, configuration schemas, the closed set of typed
//! events, the persistence collaborator trait, and the unified error system.
//!
//! This crate has **no** internal dependencies on other CmsDash crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use events::{CmsEvent, EventKind};
pub use result::AppResult;
