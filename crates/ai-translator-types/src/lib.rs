// ai-translator-types: Layer 1 — shared types, collaborator traits, and errors
#![allow(clippy::result_large_err)]

pub mod config;
pub mod display;
pub mod error;
pub mod field_path;
pub mod preferences;
pub mod request;
pub mod service;
pub mod transport;

pub use config::*;
pub use display::*;
pub use error::*;
pub use field_path::*;
pub use preferences::*;
pub use request::*;
pub use service::*;
pub use transport::*;
