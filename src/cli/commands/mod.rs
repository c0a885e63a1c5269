//! Command implementations
//!
//! Each command wires the live client and file store together, runs its
//! operation, and prints the outcome record as JSON.

pub mod accounts;
pub mod auth;
pub mod logout;
pub mod portfolio;
pub mod status;
