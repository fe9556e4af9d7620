pub mod actions;
pub mod builder;
pub mod commands;
pub mod common;
pub mod confirm;
pub mod host;
pub mod model;
pub mod node;
pub mod platform;
pub mod startup;
