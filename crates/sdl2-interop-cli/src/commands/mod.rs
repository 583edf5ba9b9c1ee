//! Subcommand implementations

pub mod clipboard;
pub mod info;
pub mod load;
pub mod subsystems;
