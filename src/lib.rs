pub mod adapter;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod progress;
pub mod services;
pub mod util;
