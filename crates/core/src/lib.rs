//! Core domain types for the definition store.
//!
//! This crate defines the data model shared across the other crates:
//! - Component coordinates and their canonical keys
//! - Definitions (described, licensed, scores, files)
//! - Store and backend configuration

pub mod config;
pub mod coordinates;
pub mod definition;
pub mod error;

pub use coordinates::{Coordinates, NAMESPACE_SENTINEL, PartialCoordinates};
pub use definition::{Definition, Described, FileEntry, Licensed, Score, Scores};
pub use error::{Error, Result};
