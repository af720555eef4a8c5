pub mod config;
pub mod error;
pub mod peer;
pub mod relay;
