pub mod auth;
pub mod broker;
pub mod cli;
pub mod config;
pub mod logging;
pub mod ops;
pub mod session;
pub mod types;
