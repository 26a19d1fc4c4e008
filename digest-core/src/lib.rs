pub mod config;
pub mod error;
pub mod error_utils;
pub mod ports;
pub mod text;
pub mod types;

pub use config::*;
pub use error::*;
pub use error_utils::*;
pub use ports::*;
pub use text::*;
pub use types::*;
