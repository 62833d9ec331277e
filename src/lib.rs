pub mod config;
pub mod error;
pub mod math;
pub mod model;
pub mod operations;
pub mod store;

pub use config::KernelConfig;
pub use error::{KernelError, Result};
