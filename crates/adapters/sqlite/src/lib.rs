//! kulu-adapter-sqlite - SQLite 持久存储层
//!
//! 持久层：异步、事务性，最不容易被系统清理

mod connection;
mod durable_tier;

pub use connection::*;
pub use durable_tier::*;
