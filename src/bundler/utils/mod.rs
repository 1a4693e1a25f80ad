//! Shared helpers for bundling and file placement.

pub mod fs;
