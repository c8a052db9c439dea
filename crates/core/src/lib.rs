//! Core error types for the shmkv workspace.
//!
//! This crate holds the single error taxonomy shared by every shmkv
//! crate so that failure modes look the same to callers no matter which
//! layer produced them.

pub mod errors;

pub use self::errors::{Error, Result};
