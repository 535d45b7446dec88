pub mod cli_app;
pub mod collector;
pub mod config;
pub mod counter;
pub mod error;
pub mod github;
pub mod logging;
pub mod models;
pub mod signals;
pub mod source;
pub mod stats;
