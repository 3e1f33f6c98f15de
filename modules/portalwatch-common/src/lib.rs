pub mod config;
pub mod error;
pub mod normalize;
pub mod types;

pub use config::Config;
pub use error::PortalWatchError;
pub use normalize::*;
pub use types::*;
