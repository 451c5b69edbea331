pub mod cloud;
pub mod common;
pub mod config;
pub mod signing;

pub use self::config::*;
