// Hideout shared type definitions
// Each submodule defines types used across the session core.

pub mod config;
pub mod errors;
pub mod history;
pub mod navigation;
pub mod page;
pub mod session;
pub mod settings;
pub mod tab;
