mod client;
mod commands;
mod config;
mod models;

pub use client::*;
pub use commands::*;
pub use self::config::*;
pub use models::*;
