//! Guarded table operations.

mod get;
mod misc;
mod put;
mod remove;
