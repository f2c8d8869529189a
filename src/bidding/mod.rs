pub mod commands;
pub mod error;
