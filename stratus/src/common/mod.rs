//! Common types, constants, and utilities shared across the engine.

mod config;
mod constants;
mod lock;
mod util;

pub use config::StratusConfig;
pub use constants::*;
pub use lock::{LockHandle, LockRegistry};
pub use util::{canonical_iso_datetime, parse_iso_datetime, sanitize_container_name};
