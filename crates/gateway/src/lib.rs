//! HTTP gateway hosting the service adapters that share one session store.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod state;
