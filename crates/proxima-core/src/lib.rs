//! Proxima Core — shared errors and naming utilities.
//!
//! This crate provides the foundational types used across all Proxima crates.
//! It has no internal Proxima dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`naming`]: Field-name to column-identifier transformation

#![doc = include_str!("../README.md")]

pub mod error;
pub mod naming;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use naming::column_name;
