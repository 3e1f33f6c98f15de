//! Persisted stores for the reconciliation pipeline.
//!
//! Each store is one flat JSON document, loaded whole and rewritten whole on
//! save. An absent file is the empty default, never an error; a malformed
//! file propagates with context. Paths are passed at construction so callers
//! (and tests) decide where documents live.

pub mod discovery;
pub mod exclusions;
pub mod registry;
pub mod verdict_cache;

pub use discovery::DiscoverySnapshot;
pub use exclusions::ExclusionStore;
pub use registry::RegistryStore;
pub use verdict_cache::VerdictCache;
