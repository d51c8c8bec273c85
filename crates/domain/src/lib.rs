//! Shared types for SessionBridge: the error taxonomy, the configuration
//! schema, and structured trace events.

pub mod config;
pub mod error;
pub mod trace;
