pub mod config;
pub mod error;
pub mod types;

pub use config::BedsideConfig;
pub use error::{BedsideError, Result};
pub use types::*;
