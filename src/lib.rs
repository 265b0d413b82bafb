pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod menu;
pub mod permission;
pub mod services;
pub mod session;
