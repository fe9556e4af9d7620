pub mod config;
pub mod logging;
pub mod menu;
pub mod platform;
pub mod snapshot;
