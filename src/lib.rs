//! Hideout: tabbed browsing over a fetch-and-rewrite proxy.
//!
//! This library crate exposes all modules for use by the host binary and the
//! integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
