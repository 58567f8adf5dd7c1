//! Port traits implemented by adapters.

pub mod config_port;
pub mod trade_store;
