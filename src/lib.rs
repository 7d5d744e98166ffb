pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod followers;
pub mod usage;
pub mod utils;
