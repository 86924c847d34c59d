pub mod logger;
pub mod error;
