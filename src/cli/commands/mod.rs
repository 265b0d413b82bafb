pub mod access;
pub mod auth;
pub mod config;
pub mod menu;
