//! CLI subcommand implementations.

pub mod extract;
pub mod render;
pub mod summary;
