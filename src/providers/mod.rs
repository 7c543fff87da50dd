//! Search provider module
//!
//! Defines the provider capability traits and a registry mapping
//! `(ProviderId, Mode)` to the adapter that serves it.

mod loader;
mod registry;
mod traits;

// Provider implementations
pub mod bing;
pub mod duckduckgo;
pub mod google;

pub use loader::ProviderLoader;
pub use registry::ProviderRegistry;
pub use traits::*;
