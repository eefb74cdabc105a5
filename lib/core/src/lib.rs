//! Core domain types and utilities for the palisade platform.
//!
//! This crate provides the strongly-typed identifiers and the error handling
//! foundation shared by the rest of the workspace.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{TeamId, UserId};
